//! Response DTOs for the HTTP API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::User;
use crate::file::{FileRecord, StorageUsage};

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

// ============================================================================
// Account DTOs
// ============================================================================

/// User information in responses.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Username if set, otherwise the email.
    pub display_name: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            display_name: user.display_name().to_string(),
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

/// Register/login response.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Session token (JWT). Also set as a cookie.
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
    pub user: UserInfo,
}

// ============================================================================
// File DTOs
// ============================================================================

/// File metadata as exposed over the API. Storage locations stay internal.
#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub public_id: String,
    pub original_filename: String,
    pub mime_type: String,
    pub size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_url: Option<String>,
    /// Uploader's username, on public views only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&FileRecord> for FileResponse {
    fn from(record: &FileRecord) -> Self {
        Self {
            public_id: record.public_id.clone(),
            original_filename: record.original_filename.clone(),
            mime_type: record.mime_type.clone(),
            size: record.size,
            share_code: record.share_code.clone(),
            share_url: record.share_code.as_deref().map(share_url),
            uploaded_by: None,
            created_at: record.created_at,
        }
    }
}

impl FileResponse {
    /// View for unauthenticated callers. The share code is a capability of
    /// its own and is left out.
    pub fn public(record: &FileRecord, uploaded_by: Option<String>) -> Self {
        Self {
            share_code: None,
            share_url: None,
            uploaded_by,
            ..Self::from(record)
        }
    }
}

/// Storage usage summary.
#[derive(Debug, Serialize)]
pub struct UsageResponse {
    /// Bytes in use.
    pub used: u64,
    /// Quota in bytes; null when unlimited.
    pub limit: Option<u64>,
    pub file_count: i64,
    pub is_admin: bool,
}

impl UsageResponse {
    pub fn new(usage: StorageUsage, is_admin: bool) -> Self {
        Self {
            used: usage.used,
            limit: usage.limit,
            file_count: usage.file_count,
            is_admin,
        }
    }
}

/// File list with usage.
#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub files: Vec<FileResponse>,
    pub usage: UsageResponse,
}

/// Delete response.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Bytes in use after the delete.
    pub used: i64,
}

/// Share link response.
#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub share_code: String,
    pub share_url: String,
}

impl ShareResponse {
    pub fn new(code: String) -> Self {
        Self {
            share_url: share_url(&code),
            share_code: code,
        }
    }
}

/// Relative URL of a share link.
pub fn share_url(code: &str) -> String {
    format!("/api/share/{code}")
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
