//! File lifecycle for Sharebox.
//!
//! This module ties the blob store and the catalog together:
//! - Upload with filename validation and quota admission
//! - Retrieval by public id or share code
//! - Owner-checked deletion and share-link issuance
//!
//! A catalog row exists exactly when its blob exists. Uploads write the
//! blob first and remove it again if the row cannot be inserted; deletes
//! remove the row first and treat the blob removal as best effort.

use tracing::{error, info, warn};

use crate::db::{Database, User};
use crate::{Result, ShareboxError};

use super::metadata::{FileRecord, FileRepository, NewFileRecord};
use super::quota::QuotaGuard;
use super::share::ShareLinkIssuer;
use super::storage::FileStorage;
use super::{DEFAULT_MIME_TYPE, MAX_FILENAME_LENGTH};

/// Request data for file upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Original filename.
    pub filename: String,
    /// Explicit MIME type; guessed from the filename when absent.
    pub mime_type: Option<String>,
    /// File content.
    pub content: Vec<u8>,
    /// Issue a share code right away.
    pub share: bool,
}

impl UploadRequest {
    /// Create a new upload request.
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: None,
            content,
            share: false,
        }
    }

    /// Set the MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Request a share code with the upload.
    pub fn with_share(mut self, share: bool) -> Self {
        self.share = share;
        self
    }
}

/// Outcome of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub record: FileRecord,
    pub share_code: Option<String>,
}

/// How to look a file up for retrieval.
#[derive(Debug, Clone, Copy)]
pub enum FileKey<'k> {
    PublicId(&'k str),
    ShareCode(&'k str),
}

/// Result of a file retrieval.
#[derive(Debug)]
pub struct Download {
    /// File metadata.
    pub record: FileRecord,
    /// File content.
    pub content: Vec<u8>,
}

/// Storage summary for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageUsage {
    /// Bytes in use.
    pub used: u64,
    /// Applicable quota, None when unlimited.
    pub limit: Option<u64>,
    /// Number of files owned.
    pub file_count: i64,
}

/// Validate an uploaded filename.
///
/// 1-255 characters, not blank, no path separators or control characters.
pub fn validate_filename(filename: &str) -> Result<()> {
    if filename.trim().is_empty() {
        return Err(ShareboxError::Validation("filename is required".to_string()));
    }
    if filename.chars().count() > MAX_FILENAME_LENGTH {
        return Err(ShareboxError::Validation(format!(
            "filename must be at most {MAX_FILENAME_LENGTH} characters"
        )));
    }
    if filename
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control())
    {
        return Err(ShareboxError::Validation(
            "filename contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// Pick the MIME type for an upload.
fn resolve_mime_type(filename: &str, explicit: Option<&str>) -> String {
    match explicit.map(str::trim) {
        Some(mime) if !mime.is_empty() && mime != DEFAULT_MIME_TYPE => mime.to_string(),
        _ => mime_guess::from_path(filename)
            .first_raw()
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string(),
    }
}

/// File service coordinating blob store, catalog and quota.
pub struct FileService<'a> {
    db: &'a Database,
    storage: &'a FileStorage,
    quota: QuotaGuard,
}

impl<'a> FileService<'a> {
    /// Create a new FileService with default limits.
    pub fn new(db: &'a Database, storage: &'a FileStorage) -> Self {
        Self {
            db,
            storage,
            quota: QuotaGuard::default(),
        }
    }

    /// Use a specific quota guard.
    pub fn with_quota(mut self, quota: QuotaGuard) -> Self {
        self.quota = quota;
        self
    }

    fn repo(&self) -> FileRepository<'a> {
        FileRepository::new(self.db.pool())
    }

    /// Upload a file for `owner`.
    ///
    /// Nothing is written when validation or the quota check fails. When the
    /// catalog insert fails the freshly written blob is deleted before the
    /// error is returned.
    pub async fn upload(&self, owner: &User, request: UploadRequest) -> Result<UploadResult> {
        validate_filename(&request.filename)?;

        let repo = self.repo();
        let size = request.content.len() as u64;
        self.quota
            .check(&repo, owner.id, size, owner.is_admin)
            .await?;

        let mime_type = resolve_mime_type(&request.filename, request.mime_type.as_deref());
        let location = self.storage.put(owner.id, &request.content).await?;

        let new_record = NewFileRecord::new(
            owner.id,
            &request.filename,
            mime_type,
            size as i64,
            &location,
        );
        let record = match repo.insert(&new_record).await {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    owner_id = owner.id,
                    location = %location,
                    error = %e,
                    "Catalog insert failed, removing orphan blob"
                );
                if let Err(cleanup) = self.storage.delete(&location).await {
                    error!(location = %location, error = %cleanup, "Failed to remove orphan blob");
                }
                return Err(e);
            }
        };

        info!(
            owner_id = owner.id,
            public_id = %record.public_id,
            size = record.size,
            "File uploaded"
        );

        let mut record = record;
        let share_code = if request.share {
            match ShareLinkIssuer::new(&repo).issue(record.id).await {
                Ok(code) => {
                    record.share_code = Some(code.clone());
                    Some(code)
                }
                Err(e) => {
                    // Upload stays committed without a share code.
                    warn!(public_id = %record.public_id, error = %e, "Share code not issued");
                    None
                }
            }
        } else {
            None
        };

        Ok(UploadResult { record, share_code })
    }

    /// Look up a file's metadata.
    pub async fn get(&self, key: FileKey<'_>) -> Result<FileRecord> {
        let repo = self.repo();
        let record = match key {
            FileKey::PublicId(public_id) => repo.get_by_public_id(public_id).await?,
            FileKey::ShareCode(code) => repo.get_by_share_code(code).await?,
        };
        record.ok_or_else(|| ShareboxError::NotFound("file".to_string()))
    }

    /// Retrieve a file's metadata and content. No ownership is required.
    pub async fn retrieve(&self, key: FileKey<'_>) -> Result<Download> {
        let record = self.get(key).await?;

        match self.storage.get(&record.storage_path).await {
            Ok(content) => Ok(Download { record, content }),
            Err(ShareboxError::NotFound(_)) => {
                error!(
                    public_id = %record.public_id,
                    location = %record.storage_path,
                    "Catalog row has no blob"
                );
                Err(ShareboxError::NotFound("file".to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Delete a file owned by `owner_id`.
    ///
    /// Returns the owner's usage in bytes after the delete. A file that does
    /// not exist and a file owned by someone else are reported the same way.
    pub async fn delete(&self, public_id: &str, owner_id: i64) -> Result<i64> {
        let repo = self.repo();
        let location = repo
            .delete_if_owned(public_id, owner_id)
            .await?
            .ok_or_else(|| ShareboxError::NotFoundOrForbidden("file".to_string()))?;

        match self.storage.delete(&location).await {
            Ok(true) => {}
            Ok(false) => warn!(location = %location, "Blob already missing on delete"),
            Err(e) => warn!(location = %location, error = %e, "Failed to delete blob"),
        }

        info!(owner_id, public_id, "File deleted");
        repo.sum_size_by_owner(owner_id).await
    }

    /// List an owner's files, newest first.
    pub async fn list(&self, owner_id: i64) -> Result<Vec<FileRecord>> {
        self.repo().list_by_owner(owner_id).await
    }

    /// Storage usage for an account.
    pub async fn usage(&self, owner: &User) -> Result<StorageUsage> {
        let repo = self.repo();
        Ok(StorageUsage {
            used: self.quota.used_bytes(&repo, owner.id).await?,
            limit: self.quota.limit_for(owner.is_admin),
            file_count: repo.count_by_owner(owner.id).await?,
        })
    }

    /// Return the share code of an owned file, issuing one if needed.
    pub async fn create_share_link(&self, public_id: &str, owner_id: i64) -> Result<String> {
        let repo = self.repo();
        let record = repo
            .get_by_public_id(public_id)
            .await?
            .filter(|r| r.owner_id == owner_id)
            .ok_or_else(|| ShareboxError::NotFoundOrForbidden("file".to_string()))?;

        ShareLinkIssuer::new(&repo).issue(record.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRepository};
    use tempfile::TempDir;

    const MIB: usize = 1024 * 1024;

    struct Fixture {
        _temp_dir: TempDir,
        db: Database,
        storage: FileStorage,
        alice: User,
        bob: User,
    }

    async fn setup() -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().join("files")).unwrap();
        let db = Database::open_in_memory().await.unwrap();

        let users = UserRepository::new(db.pool());
        let alice = users
            .create(&NewUser::new("alice@example.com", "hash"))
            .await
            .unwrap();
        let bob = users
            .create(&NewUser::new("bob@example.com", "hash"))
            .await
            .unwrap();

        Fixture {
            _temp_dir: temp_dir,
            db,
            storage,
            alice,
            bob,
        }
    }

    fn blob_count(storage: &FileStorage, owner_id: i64) -> usize {
        match std::fs::read_dir(storage.base_path().join(owner_id.to_string())) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    #[test]
    fn test_validate_filename() {
        assert!(validate_filename("report.pdf").is_ok());
        assert!(validate_filename("日本語.txt").is_ok());
        assert!(validate_filename(&"a".repeat(255)).is_ok());

        assert!(validate_filename("").is_err());
        assert!(validate_filename("   ").is_err());
        assert!(validate_filename(&"a".repeat(256)).is_err());
        assert!(validate_filename("../etc/passwd").is_err());
        assert!(validate_filename("dir\\file").is_err());
        assert!(validate_filename("bad\nname").is_err());
    }

    #[test]
    fn test_resolve_mime_type() {
        assert_eq!(resolve_mime_type("a.png", None), "image/png");
        assert_eq!(resolve_mime_type("a.txt", None), "text/plain");
        assert_eq!(resolve_mime_type("noext", None), DEFAULT_MIME_TYPE);
        assert_eq!(resolve_mime_type("a.bin", Some("text/csv")), "text/csv");
        assert_eq!(
            resolve_mime_type("a.png", Some("application/octet-stream")),
            "image/png"
        );
    }

    #[tokio::test]
    async fn test_upload_and_retrieve() {
        let f = setup().await;
        let service = FileService::new(&f.db, &f.storage);

        let result = service
            .upload(&f.alice, UploadRequest::new("hello.txt", b"Hello".to_vec()))
            .await
            .unwrap();
        let record = result.record;
        assert!(result.share_code.is_none());
        assert_eq!(record.original_filename, "hello.txt");
        assert_eq!(record.mime_type, "text/plain");
        assert_eq!(record.size, 5);
        assert_eq!(record.owner_id, f.alice.id);

        let download = service
            .retrieve(FileKey::PublicId(&record.public_id))
            .await
            .unwrap();
        assert_eq!(download.content, b"Hello");
        assert_eq!(download.record.id, record.id);
    }

    #[tokio::test]
    async fn test_upload_with_share() {
        let f = setup().await;
        let service = FileService::new(&f.db, &f.storage);

        let result = service
            .upload(
                &f.alice,
                UploadRequest::new("shared.txt", b"data".to_vec()).with_share(true),
            )
            .await
            .unwrap();
        let code = result.share_code.unwrap();
        assert_eq!(result.record.share_code.as_deref(), Some(code.as_str()));

        let download = service.retrieve(FileKey::ShareCode(&code)).await.unwrap();
        assert_eq!(download.content, b"data");
    }

    #[tokio::test]
    async fn test_upload_invalid_filename_writes_nothing() {
        let f = setup().await;
        let service = FileService::new(&f.db, &f.storage);

        let result = service
            .upload(&f.alice, UploadRequest::new("a/b.txt", b"x".to_vec()))
            .await;
        assert!(matches!(result, Err(ShareboxError::Validation(_))));
        assert_eq!(blob_count(&f.storage, f.alice.id), 0);
    }

    #[tokio::test]
    async fn test_quota_scenario() {
        let f = setup().await;
        let service = FileService::new(&f.db, &f.storage).with_quota(QuotaGuard::new(
            100 * MIB as u64,
            100 * MIB as u64,
        ));

        service
            .upload(&f.alice, UploadRequest::new("big.bin", vec![0u8; 96 * MIB]))
            .await
            .unwrap();

        let result = service
            .upload(&f.alice, UploadRequest::new("more.bin", vec![0u8; 5 * MIB]))
            .await;
        assert!(matches!(result, Err(ShareboxError::QuotaExceeded { .. })));
        assert_eq!(blob_count(&f.storage, f.alice.id), 1);
        assert_eq!(service.list(f.alice.id).await.unwrap().len(), 1);

        service
            .upload(&f.alice, UploadRequest::new("fits.bin", vec![0u8; 4 * MIB]))
            .await
            .unwrap();
        let usage = service.usage(&f.alice).await.unwrap();
        assert_eq!(usage.used, 100 * MIB as u64);
        assert_eq!(usage.file_count, 2);
    }

    #[tokio::test]
    async fn test_concurrent_uploads_near_quota() {
        let f = setup().await;
        let service = FileService::new(&f.db, &f.storage).with_quota(QuotaGuard::new(100, 100));

        service
            .upload(&f.alice, UploadRequest::new("base.bin", vec![0u8; 60]))
            .await
            .unwrap();

        // Each fits alone, both together do not. The check and the insert
        // are not serialized, so either outcome is accepted.
        let (a, b) = tokio::join!(
            service.upload(&f.alice, UploadRequest::new("a.bin", vec![1u8; 30])),
            service.upload(&f.alice, UploadRequest::new("b.bin", vec![2u8; 30])),
        );

        let results = [a, b];
        for result in &results {
            assert!(matches!(
                result,
                Ok(_) | Err(ShareboxError::QuotaExceeded { .. })
            ));
        }
        let admitted = results.iter().filter(|r| r.is_ok()).count();
        assert!(admitted >= 1);

        // Overshoot is bounded by the in-flight uploads, and blobs match rows.
        let usage = service.usage(&f.alice).await.unwrap();
        assert_eq!(usage.used, 60 + 30 * admitted as u64);
        assert!(usage.used <= 100 + 30);
        assert_eq!(usage.file_count, 1 + admitted as i64);
        assert_eq!(blob_count(&f.storage, f.alice.id), 1 + admitted);
    }

    #[tokio::test]
    async fn test_file_too_large() {
        let f = setup().await;
        let service = FileService::new(&f.db, &f.storage).with_quota(QuotaGuard::new(10, 1_000));

        let result = service
            .upload(&f.alice, UploadRequest::new("a.bin", vec![0u8; 11]))
            .await;
        assert!(matches!(
            result,
            Err(ShareboxError::FileTooLarge { size: 11, max: 10 })
        ));
        assert_eq!(blob_count(&f.storage, f.alice.id), 0);
    }

    #[tokio::test]
    async fn test_admin_upload_is_unlimited() {
        let f = setup().await;
        let service = FileService::new(&f.db, &f.storage).with_quota(QuotaGuard::new(10, 10));

        let mut admin = f.alice.clone();
        admin.is_admin = true;

        service
            .upload(&admin, UploadRequest::new("a.bin", vec![0u8; 100]))
            .await
            .unwrap();
        let usage = service.usage(&admin).await.unwrap();
        assert_eq!(usage.used, 100);
        assert_eq!(usage.limit, None);
    }

    #[tokio::test]
    async fn test_failed_insert_removes_blob() {
        let f = setup().await;
        let service = FileService::new(&f.db, &f.storage);

        sqlx::raw_sql(
            "CREATE TRIGGER reject_files BEFORE INSERT ON files
             BEGIN SELECT RAISE(ABORT, 'boom'); END;",
        )
        .execute(f.db.pool())
        .await
        .unwrap();

        let result = service
            .upload(&f.alice, UploadRequest::new("a.txt", b"x".to_vec()))
            .await;
        assert!(matches!(result, Err(ShareboxError::Database(_))));
        assert_eq!(blob_count(&f.storage, f.alice.id), 0);
    }

    #[tokio::test]
    async fn test_delete() {
        let f = setup().await;
        let service = FileService::new(&f.db, &f.storage);

        let keep = service
            .upload(&f.alice, UploadRequest::new("keep.txt", b"12345".to_vec()))
            .await
            .unwrap()
            .record;
        let gone = service
            .upload(&f.alice, UploadRequest::new("gone.txt", b"123".to_vec()))
            .await
            .unwrap()
            .record;

        let used = service.delete(&gone.public_id, f.alice.id).await.unwrap();
        assert_eq!(used, keep.size);
        assert!(!f.storage.exists(&gone.storage_path).await);
        assert!(matches!(
            service.retrieve(FileKey::PublicId(&gone.public_id)).await,
            Err(ShareboxError::NotFound(_))
        ));

        assert!(matches!(
            service.delete(&gone.public_id, f.alice.id).await,
            Err(ShareboxError::NotFoundOrForbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_by_non_owner() {
        let f = setup().await;
        let service = FileService::new(&f.db, &f.storage);

        let record = service
            .upload(&f.alice, UploadRequest::new("a.txt", b"x".to_vec()))
            .await
            .unwrap()
            .record;

        assert!(matches!(
            service.delete(&record.public_id, f.bob.id).await,
            Err(ShareboxError::NotFoundOrForbidden(_))
        ));
        assert!(f.storage.exists(&record.storage_path).await);
        assert!(service
            .retrieve(FileKey::PublicId(&record.public_id))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_delete_with_missing_blob_still_removes_row() {
        let f = setup().await;
        let service = FileService::new(&f.db, &f.storage);

        let record = service
            .upload(&f.alice, UploadRequest::new("a.txt", b"x".to_vec()))
            .await
            .unwrap()
            .record;
        f.storage.delete(&record.storage_path).await.unwrap();

        assert_eq!(service.delete(&record.public_id, f.alice.id).await.unwrap(), 0);
        assert!(service.list(f.alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_missing_blob_is_not_found() {
        let f = setup().await;
        let service = FileService::new(&f.db, &f.storage);

        let record = service
            .upload(&f.alice, UploadRequest::new("a.txt", b"x".to_vec()))
            .await
            .unwrap()
            .record;
        f.storage.delete(&record.storage_path).await.unwrap();

        assert!(matches!(
            service.retrieve(FileKey::PublicId(&record.public_id)).await,
            Err(ShareboxError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_share_round_trip() {
        let f = setup().await;
        let service = FileService::new(&f.db, &f.storage);

        let record = service
            .upload(&f.alice, UploadRequest::new("a.txt", b"shared".to_vec()))
            .await
            .unwrap()
            .record;

        assert!(matches!(
            service.create_share_link(&record.public_id, f.bob.id).await,
            Err(ShareboxError::NotFoundOrForbidden(_))
        ));

        let code = service
            .create_share_link(&record.public_id, f.alice.id)
            .await
            .unwrap();
        assert_eq!(
            service
                .create_share_link(&record.public_id, f.alice.id)
                .await
                .unwrap(),
            code
        );

        let download = service.retrieve(FileKey::ShareCode(&code)).await.unwrap();
        assert_eq!(download.content, b"shared");

        service.delete(&record.public_id, f.alice.id).await.unwrap();
        assert!(matches!(
            service.retrieve(FileKey::ShareCode(&code)).await,
            Err(ShareboxError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_is_per_owner() {
        let f = setup().await;
        let service = FileService::new(&f.db, &f.storage);

        service
            .upload(&f.alice, UploadRequest::new("a.txt", b"a".to_vec()))
            .await
            .unwrap();
        service
            .upload(&f.bob, UploadRequest::new("b.txt", b"b".to_vec()))
            .await
            .unwrap();

        let files = service.list(f.alice.id).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].original_filename, "a.txt");

        let usage = service.usage(&f.bob).await.unwrap();
        assert_eq!(usage.used, 1);
        assert_eq!(usage.limit, Some(100 * MIB as u64));
        assert_eq!(usage.file_count, 1);
    }
}
