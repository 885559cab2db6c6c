//! Configuration for sessions, rate limiting and background sweeping.
//!
//! Defaults match the reference deployment: 7 day sessions, 60 requests per
//! 30 minutes with a burst of 60, and a sweep every 10 minutes. Every value can
//! be overridden from the environment with [`ChorepoolConfig::from_env`].
//!
//! # Example
//!
//! ```rust
//! use chorepool::config::{ChorepoolConfig, RateLimitConfig};
//! use chrono::Duration;
//!
//! let config = ChorepoolConfig {
//!     rate_limit: RateLimitConfig {
//!         requests: 120,
//!         window: Duration::minutes(30),
//!         burst: 120,
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//! assert_eq!(config.rate_limit.limit().burst(), 120);
//! ```

use chrono::Duration;

use crate::rate_limit::Limit;
use crate::session::{SessionConfig, MAX_SESSION_LIFETIME};

/// Top-level configuration.
#[derive(Debug, Clone, Default)]
pub struct ChorepoolConfig {
    pub session: SessionConfig,
    pub rate_limit: RateLimitConfig,
    pub sweep: SweepConfig,

    /// Origin allowed to make credentialed cross-origin requests.
    pub allowed_origin: Option<String>,
}

impl ChorepoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lenient limits and non-secure cookies for local development.
    pub fn development() -> Self {
        Self {
            session: SessionConfig {
                cookie_secure: false,
                ..Default::default()
            },
            rate_limit: RateLimitConfig {
                requests: 600,
                window: Duration::minutes(1),
                burst: 600,
                ..Default::default()
            },
            sweep: SweepConfig {
                interval: Duration::minutes(1),
            },
            allowed_origin: Some("http://localhost:5173".to_owned()),
        }
    }

    /// Builds a configuration from `CHOREPOOL_*` environment variables,
    /// falling back to the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ttl) = parse_seconds(&lookup, "CHOREPOOL_SESSION_TTL_SECS") {
            if ttl <= MAX_SESSION_LIFETIME {
                config.session.session_lifetime = ttl;
            } else {
                log::warn!(
                    target: "chorepool",
                    "msg=\"ignoring session ttl above limit\", ttl_secs={}, max_secs={}",
                    ttl.num_seconds(),
                    MAX_SESSION_LIFETIME.num_seconds()
                );
            }
        }
        if let Some(secure) = lookup("CHOREPOOL_COOKIE_SECURE") {
            config.session.cookie_secure = matches!(secure.trim(), "1" | "true" | "yes");
        }
        if let Some(requests) = parse_positive(&lookup, "CHOREPOOL_RATE_LIMIT_REQUESTS") {
            config.rate_limit.requests = u32::try_from(requests).unwrap_or(u32::MAX);
            config.rate_limit.burst = config.rate_limit.requests;
        }
        if let Some(window) = parse_seconds(&lookup, "CHOREPOOL_RATE_LIMIT_WINDOW_SECS") {
            config.rate_limit.window = window;
        }
        if let Some(burst) = parse_positive(&lookup, "CHOREPOOL_RATE_LIMIT_BURST") {
            config.rate_limit.burst = u32::try_from(burst).unwrap_or(u32::MAX);
        }
        if let Some(max) = parse_positive(&lookup, "CHOREPOOL_MAX_BUCKETS") {
            config.rate_limit.max_buckets = usize::try_from(max).unwrap_or(usize::MAX);
        }
        if let Some(interval) = parse_seconds(&lookup, "CHOREPOOL_SWEEP_INTERVAL_SECS") {
            config.sweep.interval = interval;
        }
        if let Some(origin) = lookup("CHOREPOOL_ALLOWED_ORIGIN") {
            let origin = origin.trim();
            if !origin.is_empty() {
                config.allowed_origin = Some(origin.to_owned());
            }
        }

        config
    }
}

fn parse_positive<F>(lookup: &F, key: &str) -> Option<i64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => Some(value),
        _ => {
            log::warn!(
                target: "chorepool",
                "msg=\"ignoring invalid config value\", key=\"{key}\", value=\"{raw}\""
            );
            None
        }
    }
}

fn parse_seconds<F>(lookup: &F, key: &str) -> Option<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = parse_positive(lookup, key)?;
    let duration = Duration::try_seconds(secs);
    if duration.is_none() {
        log::warn!(
            target: "chorepool",
            "msg=\"ignoring out of range duration\", key=\"{key}\", secs={secs}"
        );
    }
    duration
}

/// Per-client request budget.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests refilled per `window`.
    ///
    /// Default: 60
    pub requests: u32,

    /// Default: 30 minutes
    pub window: Duration,

    /// Maximum tokens a bucket can hold.
    ///
    /// Default: 60
    pub burst: u32,

    /// Upper bound on tracked client identities.
    ///
    /// Default: 100 000
    pub max_buckets: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests: 60,
            window: Duration::minutes(30),
            burst: 60,
            max_buckets: 100_000,
        }
    }
}

impl RateLimitConfig {
    pub fn limit(&self) -> Limit {
        Limit::new(self.requests, self.window).with_burst(self.burst)
    }
}

/// Background cleanup of expired sessions and idle rate buckets.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Default: 10 minutes
    pub interval: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::minutes(10),
        }
    }
}

impl SweepConfig {
    pub fn interval_std(&self) -> std::time::Duration {
        self.interval
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(600))
    }
}
