//! User storage.
//!
//! | Trait | Description |
//! |-------|-------------|
//! | [`UserRepository`] | Account creation, lookup and group membership |
//!
//! Enable the `mocks` feature for [`MockUserRepository`], an in-memory
//! implementation useful for testing. Group and task storage lives in
//! [`ledger`](crate::ledger).

mod user;

#[cfg(any(test, feature = "mocks"))]
mod user_mock;

pub use user::User;
pub use user::UserRepository;

#[cfg(any(test, feature = "mocks"))]
pub use user_mock::MockUserRepository;
