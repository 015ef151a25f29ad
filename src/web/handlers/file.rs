//! File handlers.

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::db::UserRepository;
use crate::file::{Download, FileKey, FileRecord, UploadRequest};
use crate::web::dto::{
    ApiResponse, ContentQuery, DeleteResponse, FileListResponse, FileResponse, ShareResponse,
    UsageResponse,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;
use crate::ShareboxError;

/// Build a safe Content-Disposition header value.
///
/// Control characters are dropped and quotes/backslashes replaced in the
/// plain `filename` parameter; names that need it also get an RFC 5987
/// `filename*` parameter.
pub(crate) fn content_disposition_header(filename: &str, attachment: bool) -> String {
    let disposition = if attachment { "attachment" } else { "inline" };

    if filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\') {
        return format!("{disposition}; filename=\"{filename}\"");
    }

    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();
    let encoded = urlencoding::encode(filename);

    format!("{disposition}; filename=\"{sanitized}\"; filename*=UTF-8''{encoded}")
}

/// Non-image types that may render inline.
const INLINE_MIME_TYPES: &[&str] = &["application/pdf", "text/plain"];

/// Whether a stored MIME type is safe to render inline on the API origin.
///
/// Anything that can run script (HTML, SVG, XML, JavaScript) is served as
/// an attachment.
pub(crate) fn is_passive_mime(mime_type: &str) -> bool {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.strip_prefix("image/") {
        Some(subtype) => !subtype.is_empty() && !subtype.starts_with("svg"),
        None => INLINE_MIME_TYPES.contains(&essence.as_str()),
    }
}

/// Turn a retrieved file into a byte response.
///
/// Only passive types render inline; everything else is an attachment.
pub(crate) fn content_response(
    download: Download,
    download_requested: bool,
) -> Result<Response<Body>, ApiError> {
    let record = download.record;
    let attachment = download_requested || !is_passive_mime(&record.mime_type);
    let disposition = content_disposition_header(&record.original_filename, attachment);
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Response::builder()
        .header(header::CONTENT_TYPE, record.mime_type)
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CONTENT_LENGTH, download.content.len())
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
        .header(header::CONTENT_SECURITY_POLICY, "sandbox")
        .body(Body::from(download.content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// GET /api/files - List the caller's files with usage.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<FileListResponse>>, ApiError> {
    let user = state.current_user(&claims).await?;
    let files = state.files();

    let records = files.list(user.id).await?;
    let usage = files.usage(&user).await?;

    Ok(Json(ApiResponse::new(FileListResponse {
        files: records.iter().map(FileResponse::from).collect(),
        usage: UsageResponse::new(usage, user.is_admin),
    })))
}

/// POST /api/files - Upload a file (multipart `file`, optional `share`).
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<FileResponse>>), ApiError> {
    let user = state.current_user(&claims).await?;
    let max_size = state.quota.max_file_size();

    let mut filename: Option<String> = None;
    let mut mime_type: Option<String> = None;
    let mut content: Option<Vec<u8>> = None;
    let mut share = false;

    while let Some(mut field) = multipart.next_field().await.map_err(|e| {
        tracing::debug!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                filename = field.file_name().map(|s| s.to_string());
                mime_type = field.content_type().map(|s| s.to_string());

                let mut buf = Vec::new();
                while let Some(chunk) = field.chunk().await.map_err(|e| {
                    tracing::debug!("Failed to read file content: {}", e);
                    ApiError::bad_request("Failed to read file")
                })? {
                    buf.extend_from_slice(&chunk);
                    // Stop reading early instead of buffering an oversized body.
                    if !user.is_admin && buf.len() as u64 > max_size {
                        return Err(ShareboxError::FileTooLarge {
                            size: buf.len() as u64,
                            max: max_size,
                        }
                        .into());
                    }
                }
                content = Some(buf);
            }
            "share" => {
                let value = field.text().await.map_err(|e| {
                    tracing::debug!("Failed to read share flag: {}", e);
                    ApiError::bad_request("Invalid share flag")
                })?;
                share = matches!(value.trim(), "true" | "1" | "on");
            }
            _ => {}
        }
    }

    let content = content.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    let filename = filename.ok_or_else(|| ApiError::bad_request("No filename provided"))?;

    let mut request = UploadRequest::new(filename, content).with_share(share);
    if let Some(mime) = mime_type {
        request = request.with_mime_type(mime);
    }

    let result = state.files().upload(&user, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(FileResponse::from(&result.record))),
    ))
}

/// GET /api/files/:public_id - File metadata. Public.
/// Metadata for unauthenticated callers, with the uploader's username if set.
pub(crate) async fn public_file_response(
    state: &AppState,
    record: &FileRecord,
) -> Result<FileResponse, ApiError> {
    let uploaded_by = UserRepository::new(state.db.pool())
        .get_by_id(record.owner_id)
        .await?
        .and_then(|owner| owner.username);
    Ok(FileResponse::public(record, uploaded_by))
}

pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(public_id): Path<String>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let record = state.files().get(FileKey::PublicId(&public_id)).await?;
    let response = public_file_response(&state, &record).await?;
    Ok(Json(ApiResponse::new(response)))
}

/// GET /api/files/:public_id/content - File bytes. Public.
pub async fn get_file_content(
    State(state): State<Arc<AppState>>,
    Path(public_id): Path<String>,
    Query(query): Query<ContentQuery>,
) -> Result<Response<Body>, ApiError> {
    let download = state.files().retrieve(FileKey::PublicId(&public_id)).await?;
    content_response(download, query.download)
}

/// DELETE /api/files/:public_id - Delete an owned file.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(public_id): Path<String>,
) -> Result<Json<ApiResponse<DeleteResponse>>, ApiError> {
    let used = state.files().delete(&public_id, claims.sub).await?;
    Ok(Json(ApiResponse::new(DeleteResponse { used })))
}

/// POST /api/files/:public_id/share - Get or create the share link.
pub async fn share_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(public_id): Path<String>,
) -> Result<Json<ApiResponse<ShareResponse>>, ApiError> {
    let code = state
        .files()
        .create_share_link(&public_id, claims.sub)
        .await?;
    Ok(Json(ApiResponse::new(ShareResponse::new(code))))
}
