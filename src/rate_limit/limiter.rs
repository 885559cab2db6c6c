use std::sync::Arc;

use super::limit::Limit;
use super::store::{InMemoryStore, RateLimitStore};
use crate::clock::{Clock, SystemClock};
use crate::ChoreError;

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Admitted. `remaining` whole tokens are left in the bucket.
    Allowed { remaining: u32 },
    /// Refused. A token will be available in `retry_after` seconds.
    Limited { retry_after: i64 },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    pub fn is_limited(&self) -> bool {
        matches!(self, Self::Limited { .. })
    }

    pub fn retry_after(&self) -> Option<i64> {
        match self {
            Self::Limited { retry_after } => Some(*retry_after),
            Self::Allowed { .. } => None,
        }
    }
}

/// Token bucket admission control for client identities.
///
/// # Example
///
/// ```rust
/// use chorepool::rate_limit::{Limit, RateGovernor};
///
/// # tokio_test_block_on(async {
/// let governor = RateGovernor::in_memory(Limit::per_minute(2));
/// assert!(governor.allow("203.0.113.9").await.unwrap().is_allowed());
/// assert!(governor.allow("203.0.113.9").await.unwrap().is_allowed());
/// assert!(governor.allow("203.0.113.9").await.unwrap().is_limited());
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone)]
pub struct RateGovernor {
    store: Arc<dyn RateLimitStore>,
    limit: Limit,
    clock: Arc<dyn Clock>,
}

impl RateGovernor {
    #[must_use]
    pub fn new(store: Arc<dyn RateLimitStore>, limit: Limit) -> Self {
        Self::with_clock(store, limit, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(store: Arc<dyn RateLimitStore>, limit: Limit, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            limit,
            clock,
        }
    }

    /// Governor over a fresh [`InMemoryStore`] with the default bucket bound.
    #[must_use]
    pub fn in_memory(limit: Limit) -> Self {
        Self::new(Arc::new(InMemoryStore::new()), limit)
    }

    pub fn limit(&self) -> &Limit {
        &self.limit
    }

    pub fn tracked_clients(&self) -> usize {
        self.store.len()
    }

    /// Spends one token for `identity` if one is available.
    pub async fn allow(&self, identity: &str) -> Result<RateLimitResult, ChoreError> {
        let result = self
            .store
            .take(identity, &self.limit, self.clock.now())
            .await?;

        if let RateLimitResult::Limited { retry_after } = result {
            log::warn!(
                target: "chorepool::rate_limit",
                "msg=\"request rate limited\", client=\"{identity}\", retry_after={retry_after}"
            );
        }

        Ok(result)
    }

    /// Drops buckets that have fully refilled.
    pub async fn sweep_idle(&self) -> Result<u64, ChoreError> {
        self.store.sweep_idle(&self.limit, self.clock.now()).await
    }
}

impl std::fmt::Debug for RateGovernor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateGovernor")
            .field("limit", &self.limit)
            .field("tracked_clients", &self.store.len())
            .finish_non_exhaustive()
    }
}
