use chrono::Utc;

use crate::events::{dispatch, LedgerEvent};
use crate::session::SessionStore;
use crate::ChoreError;

pub struct LogoutAction<S: SessionStore> {
    sessions: S,
}

impl<S: SessionStore> LogoutAction<S> {
    pub fn new(sessions: S) -> Self {
        LogoutAction { sessions }
    }

    /// Revokes `token`. Logging out twice is not an error.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "logout", skip_all, err)
    )]
    pub async fn execute(&self, token: &str) -> Result<(), ChoreError> {
        // resolve first so the event can name the user
        let username = self.sessions.resolve(token).await?;
        self.sessions.revoke(token).await?;

        if let Some(username) = username {
            dispatch(LedgerEvent::LoggedOut {
                username,
                at: Utc::now(),
            })
            .await;
        }

        log::info!(target: "chorepool", "msg=\"logout success\"");

        Ok(())
    }
}
