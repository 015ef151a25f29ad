//! Validation utilities for request DTOs.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::web::error::ApiError;

/// A JSON extractor that validates the request body.
///
/// Deserializes the body and runs the `validator` rules on it. Failures
/// become a 422 response with per-field messages.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e)))?;

        value.validate().map_err(ApiError::from_validation_errors)?;

        Ok(ValidatedJson(value))
    }
}

/// Validate that a string is not empty after trimming whitespace.
pub fn not_empty_trimmed(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("not_empty_trimmed")
            .with_message("Must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::dto::{CredentialsRequest, UpdateUsernameRequest};

    #[test]
    fn test_not_empty_trimmed() {
        assert!(not_empty_trimmed("Hello").is_ok());
        assert!(not_empty_trimmed("  Hello  ").is_ok());
        assert!(not_empty_trimmed("").is_err());
        assert!(not_empty_trimmed(" \t\n").is_err());
    }

    #[test]
    fn test_credentials_validation() {
        let ok = CredentialsRequest {
            email: "alice@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(ok.validate().is_ok());

        let blank = CredentialsRequest {
            email: "  ".to_string(),
            password: String::new(),
        };
        let errors = blank.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_username_validation() {
        let blank = UpdateUsernameRequest {
            username: " ".to_string(),
        };
        assert!(blank.validate().is_err());
    }
}
