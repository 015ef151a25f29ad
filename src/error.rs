//! Error types for Sharebox.

use thiserror::Error;

/// Common error type for Sharebox.
#[derive(Error, Debug)]
pub enum ShareboxError {
    /// Database error.
    ///
    /// Errors from sqlx are converted automatically; unique-constraint
    /// violations become [`ShareboxError::Conflict`] instead.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Resource either does not exist or belongs to someone else.
    ///
    /// Both cases are reported the same way to the caller.
    #[error("{0} not found")]
    NotFoundOrForbidden(String),

    /// Unique constraint violation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Upload would push the owner past their storage quota.
    #[error("storage quota exceeded: {used} + {requested} bytes exceeds limit of {limit} bytes")]
    QuotaExceeded {
        /// Bytes currently stored by the owner.
        used: u64,
        /// Size of the rejected upload.
        requested: u64,
        /// Configured per-account quota.
        limit: u64,
    },

    /// Single file exceeds the per-file size cap.
    #[error("file too large: {size} bytes exceeds maximum of {max} bytes")]
    FileTooLarge {
        /// Size of the rejected upload.
        size: u64,
        /// Configured per-file maximum.
        max: u64,
    },

    /// Blob storage failure other than a plain I/O error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for ShareboxError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                ShareboxError::Conflict(db_err.message().to_string())
            }
            _ => ShareboxError::Database(e.to_string()),
        }
    }
}

impl ShareboxError {
    /// Whether this error is a unique-constraint conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ShareboxError::Conflict(_))
    }
}

/// Result type alias for Sharebox operations.
pub type Result<T> = std::result::Result<T, ShareboxError>;
