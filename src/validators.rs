/// Input validators for login forms
/// Features:
/// 1. DoS Protection: Input length limits
/// 2. Charset restriction on usernames before they reach the identity store

use regex::Regex;
use lazy_static::lazy_static;

use crate::error::ValidationError;

const MAX_USERNAME_LENGTH: usize = 64;
const MAX_PASSWORD_INPUT_LENGTH: usize = 1024;

lazy_static! {
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9._@+-]+$")
        .expect("username pattern is a valid regex");
}

/// Validates a username
/// - Trims surrounding whitespace
/// - Enforces length limits
/// - Restricts the character set
pub fn is_valid_username(username: &str) -> Result<String, ValidationError> {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("username".to_string()));
    }

    if trimmed.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong(
            "username".to_string(),
            MAX_USERNAME_LENGTH,
        ));
    }

    if !USERNAME_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("username".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Rejects empty or oversized password input before hashing work is done
pub fn is_acceptable_password_input(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()));
    }

    if password.len() > MAX_PASSWORD_INPUT_LENGTH {
        return Err(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_INPUT_LENGTH,
        ));
    }

    Ok(())
}
