use async_trait::async_trait;

use crate::events::{LedgerEvent, Listener};

/// Writes every event through the `log` crate in logfmt style.
pub struct LoggingListener {
    level: log::Level,
}

impl LoggingListener {
    /// INFO level.
    pub fn new() -> Self {
        Self {
            level: log::Level::Info,
        }
    }

    pub fn with_level(level: log::Level) -> Self {
        Self { level }
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders the event's fields as `key=value` pairs.
pub(crate) fn fields(event: &LedgerEvent) -> String {
    match event {
        LedgerEvent::UserRegistered {
            user_id, username, ..
        } => format!("user_id={user_id}, username=\"{username}\""),
        LedgerEvent::LoginSucceeded { username, .. } | LedgerEvent::LoggedOut { username, .. } => {
            format!("username=\"{username}\"")
        }
        LedgerEvent::LoginFailed {
            username, reason, ..
        } => format!("username=\"{username}\", reason=\"{reason}\""),
        LedgerEvent::GroupCreated {
            group_id,
            creator_user_id,
            pool,
            ..
        } => format!("group_id={group_id}, creator_user_id={creator_user_id}, pool={pool}"),
        LedgerEvent::GroupJoined {
            group_id, user_id, ..
        }
        | LedgerEvent::GroupLeft {
            group_id, user_id, ..
        } => format!("group_id={group_id}, user_id={user_id}"),
        LedgerEvent::PointsGranted {
            group_id,
            amount,
            pool,
            ..
        } => format!("group_id={group_id}, amount={amount}, pool={pool}"),
        LedgerEvent::TaskCreated {
            task_id,
            group_id,
            points_value,
            ..
        } => format!("task_id={task_id}, group_id={group_id}, points_value={points_value}"),
        LedgerEvent::TaskUpdated {
            task_id,
            group_id,
            points_delta,
            pool,
            ..
        } => format!("task_id={task_id}, group_id={group_id}, points_delta={points_delta}, pool={pool}"),
        LedgerEvent::TaskStepChanged {
            task_id,
            group_id,
            step,
            ..
        } => format!("task_id={task_id}, group_id={group_id}, step={step}"),
        LedgerEvent::TaskCompleted {
            task_id,
            group_id,
            points_value,
            score,
            ..
        }
        | LedgerEvent::TaskReopened {
            task_id,
            group_id,
            points_value,
            score,
            ..
        } => format!("task_id={task_id}, group_id={group_id}, points_value={points_value}, score={score}"),
        LedgerEvent::TaskDeleted {
            task_id,
            group_id,
            returned_points,
            pool,
            ..
        } => format!(
            "task_id={task_id}, group_id={group_id}, returned_points={returned_points}, pool={pool}"
        ),
        LedgerEvent::ExpiredStateSwept {
            sessions, buckets, ..
        } => format!("sessions={sessions}, buckets={buckets}"),
    }
}

#[async_trait]
impl Listener for LoggingListener {
    async fn handle(&self, event: &LedgerEvent) {
        log::log!(
            target: "chorepool::events",
            self.level,
            "event={}, {}",
            event.name(),
            fields(event)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_logging_listener_levels() {
        assert_eq!(LoggingListener::new().level, log::Level::Info);
        assert_eq!(LoggingListener::default().level, log::Level::Info);
        assert_eq!(
            LoggingListener::with_level(log::Level::Debug).level,
            log::Level::Debug
        );
    }

    #[test]
    fn test_fields_logfmt() {
        let event = LedgerEvent::TaskDeleted {
            task_id: 3,
            group_id: 1,
            returned_points: 10,
            pool: 40,
            at: Utc::now(),
        };
        assert_eq!(
            fields(&event),
            "task_id=3, group_id=1, returned_points=10, pool=40"
        );

        let event = LedgerEvent::LoginFailed {
            username: "bob".to_owned(),
            reason: "unknown user".to_owned(),
            at: Utc::now(),
        };
        assert_eq!(fields(&event), "username=\"bob\", reason=\"unknown user\"");
    }

    #[tokio::test]
    async fn test_logging_listener_handle() {
        let listener = LoggingListener::new();
        let event = LedgerEvent::TaskCreated {
            task_id: 1,
            group_id: 1,
            points_value: 5,
            at: Utc::now(),
        };

        // should not panic
        listener.handle(&event).await;
    }
}
