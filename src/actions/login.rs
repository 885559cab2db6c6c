use chrono::Utc;

use crate::crypto::{Argon2Hasher, PasswordHasher};
use crate::events::{dispatch, LedgerEvent};
use crate::session::SessionStore;
use crate::{ChoreError, SecretString, User, UserRepository};

pub struct LoginAction<U, S, H = Argon2Hasher> {
    user_repository: U,
    sessions: S,
    hasher: H,
}

impl<U: UserRepository, S: SessionStore> LoginAction<U, S> {
    pub fn new(user_repository: U, sessions: S) -> Self {
        Self::with_hasher(user_repository, sessions, Argon2Hasher::default())
    }
}

impl<U, S, H> LoginAction<U, S, H>
where
    U: UserRepository,
    S: SessionStore,
    H: PasswordHasher,
{
    pub fn with_hasher(user_repository: U, sessions: S, hasher: H) -> Self {
        LoginAction {
            user_repository,
            sessions,
            hasher,
        }
    }

    /// Verifies the credentials and opens a session.
    ///
    /// Unknown users and wrong passwords both yield `InvalidCredentials`, and
    /// both cost one password verification.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "login", skip_all, err)
    )]
    pub async fn execute(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<(User, SecretString), ChoreError> {
        let username = username.trim();
        if username.is_empty() || password.expose_secret().is_empty() {
            return Err(ChoreError::Validation(
                "Username and password are required".to_owned(),
            ));
        }

        let Some(user) = self.user_repository.find_by_username(username).await? else {
            self.hasher.verify_decoy(password.expose_secret())?;
            self.reject(username, "unknown user").await;
            return Err(ChoreError::InvalidCredentials);
        };

        if !self
            .hasher
            .verify(password.expose_secret(), &user.password_hash)?
        {
            self.reject(username, "invalid password").await;
            return Err(ChoreError::InvalidCredentials);
        }

        let token = self.sessions.create(&user.username).await?;

        dispatch(LedgerEvent::LoginSucceeded {
            username: user.username.clone(),
            at: Utc::now(),
        })
        .await;

        log::info!(
            target: "chorepool",
            "msg=\"login success\", user_id={}",
            user.id
        );

        Ok((user, SecretString::new(token)))
    }

    async fn reject(&self, username: &str, reason: &str) {
        log::warn!(
            target: "chorepool",
            "msg=\"login failed\", username=\"{username}\", reason=\"{reason}\""
        );

        dispatch(LedgerEvent::LoginFailed {
            username: username.to_owned(),
            reason: reason.to_owned(),
            at: Utc::now(),
        })
        .await;
    }
}
