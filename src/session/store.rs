use crate::ChoreError;
use async_trait::async_trait;

/// Storage for live sessions.
///
/// Implementations must be safe under concurrent use: every method may be
/// called from many request tasks at once.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Issues a new token for `username`, valid for the store's lifetime.
    ///
    /// # Errors
    ///
    /// Returns `ChoreError::Internal` if no token could be generated.
    async fn create(&self, username: &str) -> Result<String, ChoreError>;

    /// Returns the username for a live token.
    ///
    /// An unknown or expired token is `Ok(None)`, not an error. An expired
    /// entry is removed as a side effect.
    async fn resolve(&self, token: &str) -> Result<Option<String>, ChoreError>;

    /// Removes a token. Revoking an unknown token is a no-op.
    async fn revoke(&self, token: &str) -> Result<(), ChoreError>;

    /// Removes all expired sessions and returns how many were dropped.
    async fn sweep_expired(&self) -> Result<u64, ChoreError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for std::sync::Arc<T> {
    async fn create(&self, username: &str) -> Result<String, ChoreError> {
        (**self).create(username).await
    }

    async fn resolve(&self, token: &str) -> Result<Option<String>, ChoreError> {
        (**self).resolve(token).await
    }

    async fn revoke(&self, token: &str) -> Result<(), ChoreError> {
        (**self).revoke(token).await
    }

    async fn sweep_expired(&self) -> Result<u64, ChoreError> {
        (**self).sweep_expired().await
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}
