//! Request DTOs for the HTTP API.

use serde::Deserialize;
use validator::Validate;

use super::validation::not_empty_trimmed;

/// Registration and login share the same body.
#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    /// Login email.
    #[validate(custom(function = "not_empty_trimmed"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Must not be empty"))]
    pub password: String,
}

/// Username update request.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUsernameRequest {
    #[validate(custom(function = "not_empty_trimmed"))]
    pub username: String,
}

/// Query string for file content downloads.
#[derive(Debug, Default, Deserialize)]
pub struct ContentQuery {
    /// Serve as an attachment instead of inline.
    #[serde(default)]
    pub download: bool,
}
