//! Per-client admission control.
//!
//! Every client identity owns a token bucket that holds at most `burst` tokens
//! and refills continuously at `requests / window`. A request takes one token
//! or is refused immediately.

mod client_ip;
mod limit;
mod limiter;
mod store;

pub use client_ip::{extract_client_ip, UNKNOWN_CLIENT};
pub use limit::Limit;
pub use limiter::{RateGovernor, RateLimitResult};
pub use store::{InMemoryStore, RateLimitStore};
