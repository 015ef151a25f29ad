//! File metadata catalog.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::{Result, ShareboxError};

const FILE_COLUMNS: &str = "id, owner_id, public_id, original_filename, mime_type, size, \
                            storage_path, share_code, created_at";

/// Catalog row describing one stored file.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct FileRecord {
    /// Internal file ID.
    pub id: i64,
    /// Owning user.
    pub owner_id: i64,
    /// Externally visible identifier (UUID v4).
    pub public_id: String,
    /// Name the file was uploaded with.
    pub original_filename: String,
    /// MIME type served on download.
    pub mime_type: String,
    /// Size in bytes.
    pub size: i64,
    /// Blob location relative to the storage base.
    pub storage_path: String,
    /// Public share code, if one has been issued.
    pub share_code: Option<String>,
    /// Upload timestamp.
    pub created_at: DateTime<Utc>,
}

/// Data for inserting a catalog row.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub owner_id: i64,
    pub public_id: String,
    pub original_filename: String,
    pub mime_type: String,
    pub size: i64,
    pub storage_path: String,
}

impl NewFileRecord {
    /// Create a new record with a fresh public id.
    pub fn new(
        owner_id: i64,
        original_filename: impl Into<String>,
        mime_type: impl Into<String>,
        size: i64,
        storage_path: impl Into<String>,
    ) -> Self {
        Self {
            owner_id,
            public_id: uuid::Uuid::new_v4().to_string(),
            original_filename: original_filename.into(),
            mime_type: mime_type.into(),
            size,
            storage_path: storage_path.into(),
        }
    }

    /// Override the public id.
    pub fn with_public_id(mut self, public_id: impl Into<String>) -> Self {
        self.public_id = public_id.into();
        self
    }
}

/// Repository for file metadata operations.
pub struct FileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new row. A duplicate public id fails with
    /// [`ShareboxError::Conflict`].
    pub async fn insert(&self, file: &NewFileRecord) -> Result<FileRecord> {
        let record = sqlx::query_as::<_, FileRecord>(&format!(
            "INSERT INTO files (owner_id, public_id, original_filename, mime_type, size, storage_path)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING {FILE_COLUMNS}"
        ))
        .bind(file.owner_id)
        .bind(&file.public_id)
        .bind(&file.original_filename)
        .bind(&file.mime_type)
        .bind(file.size)
        .bind(&file.storage_path)
        .fetch_one(self.pool)
        .await?;
        Ok(record)
    }

    /// Get a file by internal ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<FileRecord>> {
        let record = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(record)
    }

    /// Get a file by public ID.
    pub async fn get_by_public_id(&self, public_id: &str) -> Result<Option<FileRecord>> {
        let record = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE public_id = ?"
        ))
        .bind(public_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(record)
    }

    /// Get a file by share code.
    pub async fn get_by_share_code(&self, code: &str) -> Result<Option<FileRecord>> {
        let record = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE share_code = ?"
        ))
        .bind(code)
        .fetch_optional(self.pool)
        .await?;
        Ok(record)
    }

    /// List an owner's files, newest first.
    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<FileRecord>> {
        let records = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE owner_id = ?
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(owner_id)
        .fetch_all(self.pool)
        .await?;
        Ok(records)
    }

    /// Total bytes recorded for an owner (0 when they have no files).
    pub async fn sum_size_by_owner(&self, owner_id: i64) -> Result<i64> {
        let total: (i64,) =
            sqlx::query_as("SELECT COALESCE(SUM(size), 0) FROM files WHERE owner_id = ?")
                .bind(owner_id)
                .fetch_one(self.pool)
                .await?;
        Ok(total.0)
    }

    /// Count an owner's files.
    pub async fn count_by_owner(&self, owner_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM files WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count.0)
    }

    /// Delete a row if it belongs to `owner_id`.
    ///
    /// Ownership check and delete are one statement. Returns the storage
    /// location of the deleted row, or None if nothing matched.
    pub async fn delete_if_owned(&self, public_id: &str, owner_id: i64) -> Result<Option<String>> {
        let location: Option<(String,)> = sqlx::query_as(
            "DELETE FROM files WHERE public_id = ? AND owner_id = ? RETURNING storage_path",
        )
        .bind(public_id)
        .bind(owner_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(location.map(|(path,)| path))
    }

    /// Attach a share code to a file that has none.
    ///
    /// A file that already has a code is returned unchanged. A code already
    /// used by another file fails with [`ShareboxError::Conflict`].
    pub async fn attach_share_code(&self, file_id: i64, code: &str) -> Result<FileRecord> {
        let updated = sqlx::query_as::<_, FileRecord>(&format!(
            "UPDATE files SET share_code = ? WHERE id = ? AND share_code IS NULL
             RETURNING {FILE_COLUMNS}"
        ))
        .bind(code)
        .bind(file_id)
        .fetch_optional(self.pool)
        .await?;

        match updated {
            Some(record) => Ok(record),
            None => self
                .get_by_id(file_id)
                .await?
                .ok_or_else(|| ShareboxError::NotFound(format!("file {file_id}"))),
        }
    }
}
