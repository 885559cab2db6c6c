//! In-memory session storage.
//!
//! Sessions live only as long as the process. One instance is created at
//! startup and shared by every request through `Arc`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Duration;

use crate::clock::{Clock, SystemClock};
use crate::crypto::generate_session_token;
use crate::ChoreError;

use super::store::SessionStore;
use super::Session;

/// Token → session map behind a `RwLock`.
///
/// Lookups take the read lock. Only an expired hit upgrades to the write lock,
/// and the entry is re-checked there because another task may have revoked or
/// replaced it in between.
#[derive(Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn poisoned() -> ChoreError {
        ChoreError::Internal("session store lock poisoned".to_owned())
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(Duration::days(7))
    }
}

impl std::fmt::Debug for InMemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySessionStore")
            .field("sessions", &self.len())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, username: &str) -> Result<String, ChoreError> {
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| ChoreError::Internal("session expiry out of range".to_owned()))?;
        let token = generate_session_token()?;
        let session = Session {
            token: token.clone(),
            username: username.to_owned(),
            expires_at,
        };

        self.sessions
            .write()
            .map_err(|_| Self::poisoned())?
            .insert(token.clone(), session);

        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<Option<String>, ChoreError> {
        let now = self.clock.now();

        {
            let sessions = self.sessions.read().map_err(|_| Self::poisoned())?;
            match sessions.get(token) {
                None => return Ok(None),
                Some(session) if !session.is_expired_at(now) => {
                    return Ok(Some(session.username.clone()));
                }
                Some(_) => {}
            }
        }

        let mut sessions = self.sessions.write().map_err(|_| Self::poisoned())?;
        match sessions.get(token) {
            Some(session) if session.is_expired_at(now) => {
                sessions.remove(token);
                log::debug!(target: "chorepool::session", "msg=\"expired session removed on lookup\"");
                Ok(None)
            }
            Some(session) => Ok(Some(session.username.clone())),
            None => Ok(None),
        }
    }

    async fn revoke(&self, token: &str) -> Result<(), ChoreError> {
        self.sessions
            .write()
            .map_err(|_| Self::poisoned())?
            .remove(token);

        Ok(())
    }

    async fn sweep_expired(&self) -> Result<u64, ChoreError> {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().map_err(|_| Self::poisoned())?;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        let removed = before.saturating_sub(sessions.len());
        drop(sessions);

        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }

    fn len(&self) -> usize {
        self.sessions.read().map(|guard| guard.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::Utc;

    fn store_with_clock(ttl: Duration) -> (InMemorySessionStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = InMemorySessionStore::with_clock(ttl, clock.clone());
        (store, clock)
    }

    #[tokio::test]
    async fn test_create_and_resolve() {
        let store = InMemorySessionStore::default();

        let token = store.create("alice").await.unwrap();
        assert_eq!(token.len(), 64);

        let user = store.resolve(&token).await.unwrap();
        assert_eq!(user.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_create_with_unbounded_ttl_fails() {
        let store = InMemorySessionStore::new(Duration::MAX);

        assert!(matches!(
            store.create("alice").await,
            Err(ChoreError::Internal(_))
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_unknown_is_none() {
        let store = InMemorySessionStore::default();
        assert_eq!(store.resolve("nonexistent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_session_removed_on_lookup() {
        let (store, clock) = store_with_clock(Duration::hours(1));
        let token = store.create("alice").await.unwrap();

        clock.advance(Duration::minutes(59));
        assert_eq!(store.resolve(&token).await.unwrap().as_deref(), Some("alice"));

        clock.advance(Duration::minutes(1));
        assert_eq!(store.resolve(&token).await.unwrap(), None);
        assert!(store.is_empty());

        // still absent on a second lookup
        assert_eq!(store.resolve(&token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let store = InMemorySessionStore::default();
        let token = store.create("alice").await.unwrap();

        store.revoke(&token).await.unwrap();
        store.revoke(&token).await.unwrap();
        store.revoke("never-issued").await.unwrap();

        assert_eq!(store.resolve(&token).await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_sweep_expired() {
        let (store, clock) = store_with_clock(Duration::minutes(10));
        store.create("old").await.unwrap();
        store.create("older").await.unwrap();

        clock.advance(Duration::minutes(5));
        let fresh = store.create("fresh").await.unwrap();

        clock.advance(Duration::minutes(5));
        assert_eq!(store.sweep_expired().await.unwrap(), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.resolve(&fresh).await.unwrap().as_deref(),
            Some("fresh")
        );
    }

    #[tokio::test]
    async fn test_tokens_are_distinct_per_login() {
        let store = InMemorySessionStore::default();
        let a = store.create("alice").await.unwrap();
        let b = store.create("alice").await.unwrap();

        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_create_and_resolve() {
        let store = InMemorySessionStore::default();
        let mut handles = Vec::new();

        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let name = format!("user{i}");
                let token = store.create(&name).await.unwrap();
                let resolved = store.resolve(&token).await.unwrap();
                assert_eq!(resolved.as_deref(), Some(name.as_str()));
                token
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.len(), 32);
    }
}
