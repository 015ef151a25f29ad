//! File management module for Sharebox.
//!
//! This module provides the storage-accounting and file-lifecycle pieces:
//! - Owner-namespaced blob storage on disk
//! - The `files` metadata catalog
//! - Per-file and per-account quota admission
//! - Public share codes
//! - The [`FileService`] that keeps blobs and rows consistent

mod metadata;
mod quota;
mod service;
mod share;
mod storage;

pub use metadata::{FileRecord, FileRepository, NewFileRecord};
pub use quota::QuotaGuard;
pub use service::{
    validate_filename, Download, FileKey, FileService, StorageUsage, UploadRequest, UploadResult,
};
pub use share::{ShareLinkIssuer, MAX_SHARE_CODE_ATTEMPTS, SHARE_CODE_LENGTH};
pub use storage::FileStorage;

/// Maximum length for filename (in characters).
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Default maximum file size (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default per-account quota (100 MiB).
pub const DEFAULT_QUOTA: u64 = 100 * 1024 * 1024;

/// MIME type used when none can be determined.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";
