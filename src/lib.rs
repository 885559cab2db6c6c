//! Core of a shared household task tracker.
//!
//! Users authenticate, belong to a group, and complete tasks worth points drawn
//! from the group's shared point pool. Completing a task moves its points from
//! the pool into the group's score.
//!
//! The crate is organised around three concurrency-sensitive parts:
//!
//! - [`session`]: the in-process session authority (issue, resolve, revoke, sweep).
//! - [`rate_limit`]: the per-client token bucket governor.
//! - [`ledger`]: the transactional points ledger that settles every task
//!   transition against the group's pool under a per-group lock.
//!
//! [`actions`] compose these into use cases, and `api::axum` exposes them over
//! HTTP when the `axum_api` feature is enabled.

use std::fmt;

pub mod actions;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod events;
pub mod ledger;
pub mod rate_limit;
pub mod repository;
pub mod session;
pub mod validators;

#[cfg(feature = "axum_api")]
pub mod api;

#[cfg(feature = "sqlx_postgres")]
pub mod postgres;

#[cfg(feature = "sqlx_sqlite")]
pub mod sqlite;

pub use clock::{Clock, SystemClock};
pub use config::ChorepoolConfig;
pub use crypto::SecretString;
pub use events::register_event_listeners;
pub use ledger::{
    CompletionChange, Deletion, EditOutcome, Group, GroupRepository, InMemoryLedger,
    LedgerRepository, Member, NewTask, PoolBalance, StepAction, StepChange, Task, TaskEdit,
    TaskSnapshot,
};
pub use repository::{User, UserRepository};

#[cfg(any(test, feature = "mocks"))]
pub use clock::ManualClock;
#[cfg(any(test, feature = "mocks"))]
pub use repository::MockUserRepository;

/// Broad classification of a [`ChoreError`].
///
/// Transport layers map kinds to status codes; callers that only need to know
/// "whose fault was it" can match on the kind instead of every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    Authentication,
    Authorization,
    NotFound,
    RateExceeded,
    Internal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChoreError {
    /// Malformed input (empty name, negative points, bad step action...).
    Validation(String),
    /// The task is already completed and cannot be completed again.
    AlreadyCompleted,
    /// The task is active and cannot be reopened.
    NotCompleted,
    /// The group's pool cannot cover the requested debit.
    InsufficientPoints { available: i64, required: i64 },
    UsernameTaken,
    CodeTaken,
    /// Joining a group while already belonging to one.
    AlreadyInGroup,
    InvalidCredentials,
    /// The session resolved to a username that no longer exists.
    UserNotFound,
    /// Missing, unknown or expired session token.
    SessionInvalid,
    Forbidden(String),
    /// The authenticated user does not belong to any group.
    NoGroup,
    TaskNotFound,
    GroupNotFound,
    RateLimited { retry_after: i64 },
    PasswordHashError,
    DatabaseError(String),
    Internal(String),
}

impl ChoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::AlreadyCompleted | Self::NotCompleted => {
                ErrorKind::Validation
            }
            Self::InsufficientPoints { .. }
            | Self::UsernameTaken
            | Self::CodeTaken
            | Self::AlreadyInGroup => ErrorKind::Conflict,
            Self::InvalidCredentials | Self::UserNotFound | Self::SessionInvalid => {
                ErrorKind::Authentication
            }
            Self::Forbidden(_) | Self::NoGroup => ErrorKind::Authorization,
            Self::TaskNotFound | Self::GroupNotFound => ErrorKind::NotFound,
            Self::RateLimited { .. } => ErrorKind::RateExceeded,
            Self::PasswordHashError | Self::DatabaseError(_) | Self::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Stable machine-readable code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::AlreadyCompleted => "ALREADY_COMPLETED",
            Self::NotCompleted => "NOT_COMPLETED",
            Self::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            Self::UsernameTaken => "USERNAME_TAKEN",
            Self::CodeTaken => "CODE_TAKEN",
            Self::AlreadyInGroup => "ALREADY_IN_GROUP",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::SessionInvalid | Self::TaskNotFound | Self::GroupNotFound => "NOT_FOUND",
            Self::Forbidden(_) | Self::NoGroup => "FORBIDDEN",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::PasswordHashError => "PASSWORD_HASH_ERROR",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl std::error::Error for ChoreError {}

impl fmt::Display for ChoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChoreError::Validation(msg) => write!(f, "{msg}"),
            ChoreError::AlreadyCompleted => write!(f, "Task is already completed"),
            ChoreError::NotCompleted => write!(f, "Task is not completed"),
            ChoreError::InsufficientPoints {
                available,
                required,
            } => write!(
                f,
                "Not enough points in pool (have {available}, need {required})"
            ),
            ChoreError::UsernameTaken => write!(f, "Username already exists"),
            ChoreError::CodeTaken => write!(f, "Group code already in use"),
            ChoreError::AlreadyInGroup => write!(f, "You are already in a group"),
            ChoreError::InvalidCredentials => write!(f, "Invalid username or password"),
            ChoreError::UserNotFound => write!(f, "User not found"),
            // same text as an unknown route
            ChoreError::SessionInvalid => write!(f, "not found"),
            ChoreError::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            ChoreError::NoGroup => write!(f, "No group associated with user"),
            ChoreError::TaskNotFound => write!(f, "Task not found"),
            ChoreError::GroupNotFound => write!(f, "Group not found"),
            ChoreError::RateLimited { .. } => write!(f, "Too many requests"),
            ChoreError::PasswordHashError => write!(f, "Failed to hash password"),
            ChoreError::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            ChoreError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(ChoreError::AlreadyCompleted.kind(), ErrorKind::Validation);
        assert_eq!(
            ChoreError::InsufficientPoints {
                available: 1,
                required: 2
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(ChoreError::SessionInvalid.kind(), ErrorKind::Authentication);
        assert_eq!(ChoreError::NoGroup.kind(), ErrorKind::Authorization);
        assert_eq!(ChoreError::TaskNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(
            ChoreError::RateLimited { retry_after: 3 }.kind(),
            ErrorKind::RateExceeded
        );
        assert_eq!(
            ChoreError::DatabaseError("boom".to_owned()).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_session_invalid_looks_like_missing_route() {
        assert_eq!(ChoreError::SessionInvalid.to_string(), "not found");
        assert_eq!(ChoreError::SessionInvalid.code(), "NOT_FOUND");
    }

    #[test]
    fn test_insufficient_points_message() {
        let err = ChoreError::InsufficientPoints {
            available: 3,
            required: 10,
        };
        assert_eq!(
            err.to_string(),
            "Not enough points in pool (have 3, need 10)"
        );
    }
}
