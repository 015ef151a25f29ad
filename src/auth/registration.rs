//! Account registration.

use thiserror::Error;
use tracing::info;

use crate::auth::password::{hash_password, validate_password, PasswordError};
use crate::auth::validation::{normalize_email, validate_email, ValidationError};
use crate::db::{NewUser, User, UserRepository};
use crate::ShareboxError;

/// Registration-specific errors.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// Validation failed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Email already registered.
    #[error("email already registered")]
    EmailExists,

    /// Password rejected or hashing failed.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Login email.
    pub email: String,
    /// Password (8-128 characters).
    pub password: String,
}

impl RegistrationRequest {
    /// Create a new registration request.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Hash a password off the async runtime.
pub(crate) async fn hash_password_blocking(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordError::HashError(e.to_string()))?
}

/// Register a new account.
///
/// The email is validated and stored lowercased. `is_admin` is decided by
/// the caller, normally from the configured admin email list.
pub async fn register(
    repo: &UserRepository<'_>,
    request: RegistrationRequest,
    is_admin: bool,
) -> Result<User, RegistrationError> {
    validate_email(&request.email)?;
    validate_password(&request.password)?;

    let email = normalize_email(&request.email);
    if repo
        .email_exists(&email)
        .await
        .map_err(|e| RegistrationError::Database(e.to_string()))?
    {
        return Err(RegistrationError::EmailExists);
    }

    let password_hash = hash_password_blocking(request.password).await?;

    // A concurrent registration can still win the race between the check
    // and the insert; the unique index reports it as a conflict.
    let user = repo
        .create(&NewUser::new(&email, password_hash).with_admin(is_admin))
        .await
        .map_err(|e| match e {
            ShareboxError::Conflict(_) => RegistrationError::EmailExists,
            other => RegistrationError::Database(other.to_string()),
        })?;

    info!(user_id = user.id, is_admin = user.is_admin, "New user registered");
    Ok(user)
}
