//! Session authority: opaque token issuance, lookup, expiry and sweeping.
//!
//! A session maps a random token to a username until `expires_at`. Expired
//! entries are removed lazily when observed by [`SessionStore::resolve`] and
//! in bulk by [`SessionStore::sweep_expired`].

mod config;
mod cookie;
mod memory_store;
mod store;

use chrono::{DateTime, Utc};
pub use config::{SameSite, SessionConfig, MAX_SESSION_LIFETIME};
pub use cookie::{build_session_cookie, clear_session_cookie, token_from_cookie_header};
pub use memory_store::InMemorySessionStore;
pub use store::SessionStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// A session is dead from `expires_at` onwards, inclusive.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
