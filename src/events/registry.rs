use std::sync::OnceLock;

use super::{LedgerEvent, Listener};

static REGISTRY: OnceLock<EventRegistry> = OnceLock::new();

/// Ordered set of listeners, installed once per process.
#[derive(Default)]
pub struct EventRegistry {
    listeners: Vec<Box<dyn Listener>>,
}

impl EventRegistry {
    /// Listeners are called in registration order.
    pub fn listen(&mut self, listener: impl Listener) -> &mut Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    async fn dispatch(&self, event: &LedgerEvent) {
        for listener in &self.listeners {
            listener.handle(event).await;
        }
    }
}

/// Installs the process-wide listeners. Only the first call takes effect;
/// later calls are logged and ignored.
///
/// ```rust,ignore
/// use chorepool::register_event_listeners;
/// use chorepool::events::listeners::LoggingListener;
///
/// register_event_listeners(|registry| {
///     registry.listen(LoggingListener::new());
/// });
/// ```
pub fn register_event_listeners<F>(f: F)
where
    F: FnOnce(&mut EventRegistry),
{
    let mut registry = EventRegistry::default();
    f(&mut registry);
    let count = registry.len();
    if REGISTRY.set(registry).is_err() {
        log::warn!(
            target: "chorepool",
            "msg=\"register_event_listeners called more than once, ignoring\""
        );
    } else {
        log::debug!(target: "chorepool", "msg=\"event listeners registered\", count={count}");
    }
}

/// Dispatches to the registered listeners. No-op before registration.
pub async fn dispatch(event: LedgerEvent) {
    if let Some(registry) = REGISTRY.get() {
        registry.dispatch(&event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::{Arc, Mutex};

    struct Recorder {
        tag: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Listener for Recorder {
        async fn handle(&self, event: &LedgerEvent) {
            self.seen
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.tag, event.name()));
        }
    }

    #[tokio::test]
    async fn test_listeners_called_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = EventRegistry::default();
        registry
            .listen(Recorder {
                tag: "first",
                seen: seen.clone(),
            })
            .listen(Recorder {
                tag: "second",
                seen: seen.clone(),
            });
        assert_eq!(registry.len(), 2);

        let event = LedgerEvent::LoggedOut {
            username: "alice".to_owned(),
            at: Utc::now(),
        };
        registry.dispatch(&event).await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["first:session.logout", "second:session.logout"]
        );
    }

    #[tokio::test]
    async fn test_empty_registry_is_noop() {
        let registry = EventRegistry::default();
        assert!(registry.is_empty());
        registry
            .dispatch(&LedgerEvent::LoggedOut {
                username: "alice".to_owned(),
                at: Utc::now(),
            })
            .await;
    }
}
