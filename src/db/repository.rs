//! User repository for Sharebox.

use sqlx::SqlitePool;

use super::user::{NewUser, User};
use crate::{Result, ShareboxError};

const USER_COLUMNS: &str = "id, email, password, username, is_admin, created_at, updated_at";

/// Repository for user CRUD operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user in the database.
    ///
    /// A duplicate email fails with [`ShareboxError::Conflict`].
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let result = sqlx::query("INSERT INTO users (email, password, is_admin) VALUES (?, ?, ?)")
            .bind(&new_user.email)
            .bind(&new_user.password)
            .bind(new_user.is_admin)
            .execute(self.pool)
            .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| ShareboxError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Get a user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Set a user's display username.
    ///
    /// Returns the updated user, or None if the user does not exist. A name
    /// already taken by someone else fails with [`ShareboxError::Conflict`].
    pub async fn update_username(&self, id: i64, username: &str) -> Result<Option<User>> {
        let result = sqlx::query(
            "UPDATE users
             SET username = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ?",
        )
        .bind(username)
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Check if an email is already registered (case-insensitive).
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = ? COLLATE NOCASE)")
                .bind(email)
                .fetch_one(self.pool)
                .await?;
        Ok(exists.0)
    }

    /// Check if a username is taken by a user other than `except_id`.
    pub async fn username_taken(&self, username: &str, except_id: i64) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? COLLATE NOCASE AND id != ?)",
        )
        .bind(username)
        .bind(except_id)
        .fetch_one(self.pool)
        .await?;
        Ok(exists.0)
    }
}
