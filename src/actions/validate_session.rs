use crate::session::SessionStore;
use crate::ChoreError;

/// Resolves a session token to its username.
pub struct ValidateSessionAction<S: SessionStore> {
    sessions: S,
}

impl<S: SessionStore> ValidateSessionAction<S> {
    pub fn new(sessions: S) -> Self {
        ValidateSessionAction { sessions }
    }

    /// # Errors
    ///
    /// `SessionInvalid` if the token is unknown or expired.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "validate_session", skip_all, err)
    )]
    pub async fn execute(&self, token: &str) -> Result<String, ChoreError> {
        match self.sessions.resolve(token).await? {
            Some(username) => Ok(username),
            None => {
                log::debug!(target: "chorepool", "msg=\"session rejected\"");
                Err(ChoreError::SessionInvalid)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;
    use crate::clock::ManualClock;
    use crate::session::InMemorySessionStore;

    #[tokio::test]
    async fn test_validate_live_session() {
        let sessions = InMemorySessionStore::default();
        let token = sessions.create("alice").await.unwrap();

        let action = ValidateSessionAction::new(sessions);
        assert_eq!(action.execute(&token).await.unwrap(), "alice");
    }

    #[tokio::test]
    async fn test_validate_expired_session() {
        let clock = Arc::new(ManualClock::default());
        let sessions = InMemorySessionStore::with_clock(Duration::hours(1), clock.clone());
        let token = sessions.create("alice").await.unwrap();

        clock.advance(Duration::hours(1));

        let action = ValidateSessionAction::new(sessions.clone());
        assert_eq!(
            action.execute(&token).await.unwrap_err(),
            ChoreError::SessionInvalid
        );
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn test_validate_unknown_token() {
        let action = ValidateSessionAction::new(InMemorySessionStore::default());
        assert_eq!(
            action.execute("deadbeef").await.unwrap_err(),
            ChoreError::SessionInvalid
        );
    }
}
