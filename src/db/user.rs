//! User model for Sharebox.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A registered account.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Login email (unique, case-insensitive).
    pub email: String,
    /// Password hash (Argon2).
    pub password: String,
    /// Optional display name (unique if set).
    pub username: Option<String>,
    /// Admin accounts are exempt from the storage quota.
    pub is_admin: bool,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last profile update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Name to show in the UI: the username if set, otherwise the email.
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.email)
    }
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login email.
    pub email: String,
    /// Password hash (should be pre-hashed with Argon2).
    pub password: String,
    /// Admin flag.
    pub is_admin: bool,
}

impl NewUser {
    /// Create a new regular user.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            is_admin: false,
        }
    }

    /// Set the admin flag.
    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }
}
