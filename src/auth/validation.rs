//! Input validation for account data.

use thiserror::Error;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 32;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Email is empty.
    #[error("email is required")]
    EmailEmpty,

    /// Email is too long.
    #[error("email must be at most {MAX_EMAIL_LENGTH} characters")]
    EmailTooLong,

    /// Email format is invalid.
    #[error("invalid email format")]
    EmailInvalidFormat,

    /// Username is empty.
    #[error("username is required")]
    UsernameEmpty,

    /// Username is too long.
    #[error("username must be at most {MAX_USERNAME_LENGTH} characters")]
    UsernameTooLong,

    /// Username contains invalid characters.
    #[error("username can only contain letters, digits, '_', '-' and '.'")]
    UsernameInvalidChars,
}

/// Normalize an email for storage: trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate an email address.
///
/// Accepts `local@domain.tld` with no whitespace, a single `@`, and a dot
/// inside the domain that is neither its first nor last character.
///
/// # Examples
///
/// ```
/// use sharebox::auth::validation::validate_email;
///
/// assert!(validate_email("user@example.com").is_ok());
/// assert!(validate_email("user@localhost").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::EmailEmpty);
    }
    if email.chars().count() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong);
    }
    if email.chars().any(char::is_whitespace) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or(ValidationError::EmailInvalidFormat)?;

    if local.is_empty() || domain.contains('@') {
        return Err(ValidationError::EmailInvalidFormat);
    }

    match domain.find('.') {
        Some(_) if !domain.starts_with('.') && !domain.ends_with('.') => Ok(()),
        _ => Err(ValidationError::EmailInvalidFormat),
    }
}

/// Validate a display username (1-32 characters of `[A-Za-z0-9_.-]`).
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::UsernameEmpty);
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooLong);
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(ValidationError::UsernameInvalidChars);
    }
    Ok(())
}
