//! Per-file and per-account storage limits.

use tracing::debug;

use super::metadata::FileRepository;
use super::{DEFAULT_MAX_FILE_SIZE, DEFAULT_QUOTA};
use crate::config::FilesConfig;
use crate::{Result, ShareboxError};

/// Admission check run before any upload touches the disk.
///
/// Usage is always read from the catalog, so it reflects committed rows
/// only. Admin accounts are exempt from both limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaGuard {
    max_file_size: u64,
    quota: u64,
}

impl Default for QuotaGuard {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_SIZE, DEFAULT_QUOTA)
    }
}

impl QuotaGuard {
    /// Create a guard with explicit limits in bytes.
    pub fn new(max_file_size: u64, quota: u64) -> Self {
        Self {
            max_file_size,
            quota,
        }
    }

    /// Create a guard from the `[files]` config section.
    pub fn from_config(config: &FilesConfig) -> Self {
        Self::new(config.max_upload_size_bytes(), config.quota_bytes())
    }

    /// Largest single file accepted, in bytes.
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Per-account quota, in bytes.
    pub fn quota(&self) -> u64 {
        self.quota
    }

    /// The quota that applies to an account, or None when unlimited.
    pub fn limit_for(&self, is_admin: bool) -> Option<u64> {
        if is_admin {
            None
        } else {
            Some(self.quota)
        }
    }

    /// Bytes currently recorded for an owner.
    pub async fn used_bytes(&self, repo: &FileRepository<'_>, owner_id: i64) -> Result<u64> {
        let used = repo.sum_size_by_owner(owner_id).await?;
        Ok(u64::try_from(used).unwrap_or(0))
    }

    /// Check whether a file of `size` bytes may be stored.
    pub async fn check(
        &self,
        repo: &FileRepository<'_>,
        owner_id: i64,
        size: u64,
        is_admin: bool,
    ) -> Result<()> {
        if is_admin {
            return Ok(());
        }

        if size > self.max_file_size {
            return Err(ShareboxError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        let used = self.used_bytes(repo, owner_id).await?;
        if used.saturating_add(size) > self.quota {
            debug!(owner_id, used, size, quota = self.quota, "Quota exceeded");
            return Err(ShareboxError::QuotaExceeded {
                used,
                requested: size,
                limit: self.quota,
            });
        }

        Ok(())
    }

    /// Boolean form of [`QuotaGuard::check`].
    pub async fn can_admit(
        &self,
        repo: &FileRepository<'_>,
        owner_id: i64,
        size: u64,
        is_admin: bool,
    ) -> Result<bool> {
        match self.check(repo, owner_id, size, is_admin).await {
            Ok(()) => Ok(true),
            Err(ShareboxError::FileTooLarge { .. } | ShareboxError::QuotaExceeded { .. }) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}
