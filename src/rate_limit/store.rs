use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::limit::Limit;
use super::limiter::RateLimitResult;
use crate::ChoreError;

/// Bucket state. `credit` is counted in units of `1 / window_ms` tokens, so a
/// refill of `elapsed_ms * requests` units is exact.
#[derive(Debug, Clone, Copy)]
struct Bucket {
    credit: u64,
    last_refill: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

impl Bucket {
    fn full(limit: &Limit, now: DateTime<Utc>) -> Self {
        Self {
            credit: capacity(limit),
            last_refill: now,
            last_seen: now,
        }
    }

    fn refill(&mut self, limit: &Limit, now: DateTime<Utc>) {
        let elapsed_ms = u64::try_from((now - self.last_refill).num_milliseconds()).unwrap_or(0);
        if elapsed_ms == 0 {
            return;
        }
        let added = elapsed_ms.saturating_mul(u64::from(limit.requests));
        self.credit = self.credit.saturating_add(added).min(capacity(limit));
        self.last_refill = now;
    }

    fn is_full(&self, limit: &Limit) -> bool {
        self.credit >= capacity(limit)
    }
}

fn capacity(limit: &Limit) -> u64 {
    u64::from(limit.burst).saturating_mul(limit.window_ms())
}

/// Storage for token buckets keyed by client identity.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Refills the bucket for `key` and takes one token if available, as one
    /// atomic step. Unseen keys start with a full bucket.
    async fn take(
        &self,
        key: &str,
        limit: &Limit,
        now: DateTime<Utc>,
    ) -> Result<RateLimitResult, ChoreError>;

    /// Drops buckets that have refilled to capacity. Such a bucket behaves
    /// exactly like a fresh one, so removing it changes no decision.
    async fn sweep_idle(&self, limit: &Limit, now: DateTime<Utc>) -> Result<u64, ChoreError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Buckets in a `Mutex<HashMap>`, bounded by `max_buckets`.
///
/// When a new identity arrives at a full map, idle buckets are swept first;
/// if none are idle, the bucket used longest ago is evicted.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    buckets: Arc<Mutex<HashMap<String, Bucket>>>,
    max_buckets: usize,
}

impl InMemoryStore {
    pub const DEFAULT_MAX_BUCKETS: usize = 100_000;

    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_MAX_BUCKETS)
    }

    #[must_use]
    pub fn with_capacity(max_buckets: usize) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            max_buckets: max_buckets.max(1),
        }
    }

    fn poisoned() -> ChoreError {
        ChoreError::Internal("rate limit store lock poisoned".to_owned())
    }

    fn sweep_locked(
        buckets: &mut HashMap<String, Bucket>,
        limit: &Limit,
        now: DateTime<Utc>,
    ) -> usize {
        let before = buckets.len();
        buckets.retain(|_, bucket| {
            bucket.refill(limit, now);
            !bucket.is_full(limit)
        });
        before.saturating_sub(buckets.len())
    }

    fn make_room(
        buckets: &mut HashMap<String, Bucket>,
        max: usize,
        limit: &Limit,
        now: DateTime<Utc>,
    ) {
        if buckets.len() < max {
            return;
        }
        let swept = Self::sweep_locked(buckets, limit, now);
        if swept > 0 {
            log::debug!(target: "chorepool::rate_limit", "msg=\"swept idle buckets at capacity\", count={swept}");
            return;
        }
        let oldest = buckets
            .iter()
            .min_by_key(|(_, bucket)| bucket.last_seen)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            buckets.remove(&key);
            log::warn!(target: "chorepool::rate_limit", "msg=\"bucket table full, evicted oldest\", key=\"{key}\"");
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
#[allow(clippy::significant_drop_tightening)]
impl RateLimitStore for InMemoryStore {
    async fn take(
        &self,
        key: &str,
        limit: &Limit,
        now: DateTime<Utc>,
    ) -> Result<RateLimitResult, ChoreError> {
        let mut buckets = self.buckets.lock().map_err(|_| Self::poisoned())?;

        if !buckets.contains_key(key) {
            Self::make_room(&mut buckets, self.max_buckets, limit, now);
        }
        let bucket = buckets
            .entry(key.to_owned())
            .or_insert_with(|| Bucket::full(limit, now));
        bucket.refill(limit, now);
        bucket.last_seen = now;

        let unit = limit.window_ms();
        if bucket.credit >= unit {
            bucket.credit -= unit;
            let remaining = u32::try_from(bucket.credit / unit).unwrap_or(u32::MAX);
            Ok(RateLimitResult::Allowed { remaining })
        } else {
            let missing = unit - bucket.credit;
            let wait_ms = missing.div_ceil(u64::from(limit.requests));
            let retry_after = i64::try_from(wait_ms.div_ceil(1000)).unwrap_or(i64::MAX).max(1);
            Ok(RateLimitResult::Limited { retry_after })
        }
    }

    async fn sweep_idle(&self, limit: &Limit, now: DateTime<Utc>) -> Result<u64, ChoreError> {
        let mut buckets = self.buckets.lock().map_err(|_| Self::poisoned())?;
        let removed = Self::sweep_locked(&mut buckets, limit, now);
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }

    fn len(&self) -> usize {
        self.buckets.lock().map(|guard| guard.len()).unwrap_or(0)
    }
}
