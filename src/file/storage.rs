//! Blob storage for Sharebox.
//!
//! Raw file bytes live in an owner-namespaced directory tree:
//! ```text
//! {base_path}/
//! ├── 1/
//! │   └── 3f2a9c1e-5d7b-4e0a-9a61-0c2f7e4b8d15
//! ├── 2/
//! │   └── 8b1d6e44-2c90-4f3b-b7aa-51e3d09c6f27
//! └── ...
//! ```
//! Locations handed out by [`FileStorage::put`] are relative
//! (`"{owner_id}/{uuid}"`) so the base directory can move without touching
//! the catalog.

use std::io;
use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::{Result, ShareboxError};

/// Suffix for in-flight writes. Never visible under a final location.
const TEMP_SUFFIX: &str = ".part";

/// Blob store rooted at a base directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new FileStorage, creating the base directory if needed.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Write `content` as a new blob owned by `owner_id`.
    ///
    /// The bytes go to a temporary file first and are renamed into place,
    /// so a failed write leaves no blob behind. Returns the relative
    /// location of the new blob.
    pub async fn put(&self, owner_id: i64, content: &[u8]) -> Result<String> {
        let owner_dir = self.base_path.join(owner_id.to_string());
        fs::create_dir_all(&owner_dir).await?;

        let name = Uuid::new_v4().to_string();
        let final_path = owner_dir.join(&name);
        let temp_path = owner_dir.join(format!("{name}{TEMP_SUFFIX}"));

        if let Err(e) = fs::write(&temp_path, content).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(ShareboxError::Storage(format!("failed to write blob: {e}")));
        }
        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(ShareboxError::Storage(format!("failed to commit blob: {e}")));
        }

        let location = format!("{owner_id}/{name}");
        debug!(location = %location, size = content.len(), "Blob written");
        Ok(location)
    }

    /// Read a blob. A missing blob is [`ShareboxError::NotFound`].
    pub async fn get(&self, location: &str) -> Result<Vec<u8>> {
        let path = self.resolve(location)?;

        match fs::read(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(ShareboxError::NotFound(format!("blob {location}")))
            }
            Err(e) => Err(ShareboxError::Storage(format!(
                "failed to read blob {location}: {e}"
            ))),
        }
    }

    /// Delete a blob.
    ///
    /// Returns `true` if the blob was removed and `false` if it was already
    /// gone.
    pub async fn delete(&self, location: &str) -> Result<bool> {
        let path = self.resolve(location)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ShareboxError::Storage(format!(
                "failed to delete blob {location}: {e}"
            ))),
        }
    }

    /// Check if a blob exists.
    pub async fn exists(&self, location: &str) -> bool {
        match self.resolve(location) {
            Ok(path) => fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Sum the sizes of every blob in an owner's namespace.
    ///
    /// Used to reconcile the catalog against the disk; the quota itself is
    /// computed from the catalog.
    pub async fn owner_usage_on_disk(&self, owner_id: i64) -> Result<u64> {
        let owner_dir = self.base_path.join(owner_id.to_string());
        let mut entries = match fs::read_dir(&owner_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut total = 0;
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            let is_temp = entry.file_name().to_string_lossy().ends_with(TEMP_SUFFIX);
            if metadata.is_file() && !is_temp {
                total += metadata.len();
            }
        }
        Ok(total)
    }

    /// Remove empty owner directories. Returns how many were removed.
    pub async fn cleanup_empty_dirs(&self) -> Result<usize> {
        let mut removed = 0;
        let mut entries = fs::read_dir(&self.base_path).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let mut children = fs::read_dir(&path).await?;
            if children.next_entry().await?.is_none() && fs::remove_dir(&path).await.is_ok() {
                removed += 1;
            }
        }

        Ok(removed)
    }

    /// Map a relative location to a path under the base directory.
    ///
    /// Only plain path segments are accepted.
    fn resolve(&self, location: &str) -> Result<PathBuf> {
        let relative = Path::new(location);
        let valid = !location.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));

        if !valid {
            return Err(ShareboxError::Storage(format!(
                "invalid blob location: {location}"
            )));
        }
        Ok(self.base_path.join(relative))
    }
}
