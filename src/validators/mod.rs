pub mod name;
pub mod password;

pub use name::{validate_group_code, validate_username, MAX_USERNAME_LENGTH};
pub use password::{validate_password, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};

use serde::{Deserialize, Serialize};

use crate::ChoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidationError {
    UsernameEmpty,
    UsernameTooLong,
    PasswordEmpty,
    PasswordTooShort,
    PasswordTooLong,
    GroupCodeInvalid,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UsernameEmpty => write!(f, "Username cannot be empty"),
            Self::UsernameTooLong => write!(
                f,
                "Username is too long (max {MAX_USERNAME_LENGTH} characters)"
            ),
            Self::PasswordEmpty => write!(f, "Password cannot be empty"),
            Self::PasswordTooShort => write!(
                f,
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            ),
            Self::PasswordTooLong => write!(
                f,
                "Password is too long (max {MAX_PASSWORD_LENGTH} characters)"
            ),
            Self::GroupCodeInvalid => write!(f, "Group code must be 8 base32 characters"),
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for ChoreError {
    fn from(err: ValidationError) -> Self {
        ChoreError::Validation(err.to_string())
    }
}
