use chrono::Utc;

use crate::crypto::{Argon2Hasher, PasswordHasher};
use crate::events::{dispatch, LedgerEvent};
use crate::validators::{validate_password, validate_username};
use crate::{ChoreError, SecretString, User, UserRepository};

pub struct RegisterAction<U, H = Argon2Hasher> {
    repository: U,
    hasher: H,
}

impl<U: UserRepository> RegisterAction<U> {
    pub fn new(repository: U) -> Self {
        Self::with_hasher(repository, Argon2Hasher::default())
    }
}

impl<U: UserRepository, H: PasswordHasher> RegisterAction<U, H> {
    pub fn with_hasher(repository: U, hasher: H) -> Self {
        RegisterAction { repository, hasher }
    }

    /// Creates an account. The username is stored trimmed.
    ///
    /// # Errors
    ///
    /// - `Validation` for a blank or over-long username, or a password that is
    ///   blank or outside 8..=128 characters
    /// - `UsernameTaken` if the username exists
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "register", skip_all, err)
    )]
    pub async fn execute(&self, username: &str, password: &SecretString) -> Result<User, ChoreError> {
        let username = username.trim();
        validate_username(username)?;
        validate_password(password)?;

        if self.repository.find_by_username(username).await?.is_some() {
            return Err(ChoreError::UsernameTaken);
        }

        let password_hash = self.hasher.hash(password.expose_secret())?;
        let user = self.repository.create_user(username, &password_hash).await?;

        dispatch(LedgerEvent::UserRegistered {
            user_id: user.id,
            username: user.username.clone(),
            at: Utc::now(),
        })
        .await;

        log::info!(
            target: "chorepool",
            "msg=\"user registered\", user_id={}",
            user.id
        );

        Ok(user)
    }
}
