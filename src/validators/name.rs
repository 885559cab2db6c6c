use super::ValidationError;

pub const MAX_USERNAME_LENGTH: usize = 255;

/// Usernames are compared exactly, so surrounding whitespace is rejected
/// rather than trimmed.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(ValidationError::UsernameEmpty);
    }

    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooLong);
    }

    Ok(())
}

/// Join codes are 8 characters of the RFC 4648 base32 alphabet.
pub fn validate_group_code(code: &str) -> Result<(), ValidationError> {
    let valid = code.len() == 8
        && code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(&b));
    if valid {
        Ok(())
    } else {
        Err(ValidationError::GroupCodeInvalid)
    }
}
