//! Credential checks for login.

use thiserror::Error;
use tracing::{debug, info};

use crate::auth::password::verify_password;
use crate::auth::validation::normalize_email;
use crate::db::{User, UserRepository};

/// Authentication errors.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Unknown email or wrong password. The two cases are not distinguished.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

/// Check an email/password pair and return the matching user.
pub async fn authenticate(
    repo: &UserRepository<'_>,
    email: &str,
    password: &str,
) -> Result<User, AuthError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(AuthError::InvalidCredentials);
    }

    let user = repo
        .get_by_email(&normalize_email(email))
        .await
        .map_err(|e| AuthError::Database(e.to_string()))?
        .ok_or(AuthError::InvalidCredentials)?;

    let password = password.to_string();
    let hash = user.password.clone();
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AuthError::Database(e.to_string()))?;

    if verified.is_err() {
        debug!(user_id = user.id, "Password mismatch");
        return Err(AuthError::InvalidCredentials);
    }

    info!(user_id = user.id, "User logged in");
    Ok(user)
}
