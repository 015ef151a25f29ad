//! Public share-link handlers. No authentication.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::file::FileKey;
use crate::web::dto::{ApiResponse, ContentQuery, FileResponse};
use crate::web::error::ApiError;
use crate::web::handlers::file::{content_response, public_file_response};
use crate::web::handlers::AppState;

/// GET /api/share/:code - Shared file metadata.
pub async fn get_shared(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let record = state.files().get(FileKey::ShareCode(&code)).await?;
    let response = public_file_response(&state, &record).await?;
    Ok(Json(ApiResponse::new(response)))
}

/// GET /api/share/:code/content - Shared file bytes.
pub async fn get_shared_content(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Query(query): Query<ContentQuery>,
) -> Result<Response<Body>, ApiError> {
    let download = state.files().retrieve(FileKey::ShareCode(&code)).await?;
    content_response(download, query.download)
}
