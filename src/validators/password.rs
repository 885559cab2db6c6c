use crate::crypto::SecretString;

use super::ValidationError;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Checks a password before it is hashed. Length is counted in characters and
/// whitespace counts, but a password of only whitespace is empty.
///
/// ```
/// use chorepool::crypto::SecretString;
/// use chorepool::validators::validate_password;
///
/// assert!(validate_password(&SecretString::new("dishes-and-bins")).is_ok());
/// assert!(validate_password(&SecretString::new("mop")).is_err());
/// ```
pub fn validate_password(password: &SecretString) -> Result<(), ValidationError> {
    if password.expose_secret().trim().is_empty() {
        return Err(ValidationError::PasswordEmpty);
    }

    match password.char_len() {
        len if len < MIN_PASSWORD_LENGTH => Err(ValidationError::PasswordTooShort),
        len if len > MAX_PASSWORD_LENGTH => Err(ValidationError::PasswordTooLong),
        _ => Ok(()),
    }
}
