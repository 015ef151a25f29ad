//! Profile updates.

use thiserror::Error;
use tracing::info;

use crate::auth::validation::{validate_username, ValidationError};
use crate::db::{User, UserRepository};
use crate::ShareboxError;

/// Profile-related errors.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// Validation failed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Username belongs to another account.
    #[error("username already taken")]
    UsernameTaken,

    /// User not found.
    #[error("user not found")]
    NotFound,

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

/// Set the display username for `user_id`.
///
/// Setting the name a user already has succeeds and leaves it unchanged.
pub async fn update_username(
    repo: &UserRepository<'_>,
    user_id: i64,
    username: &str,
) -> Result<User, ProfileError> {
    let username = username.trim();
    validate_username(username)?;

    if repo
        .username_taken(username, user_id)
        .await
        .map_err(|e| ProfileError::Database(e.to_string()))?
    {
        return Err(ProfileError::UsernameTaken);
    }

    let user = repo
        .update_username(user_id, username)
        .await
        .map_err(|e| match e {
            ShareboxError::Conflict(_) => ProfileError::UsernameTaken,
            other => ProfileError::Database(other.to_string()),
        })?
        .ok_or(ProfileError::NotFound)?;

    info!(user_id, username, "Username updated");
    Ok(user)
}
