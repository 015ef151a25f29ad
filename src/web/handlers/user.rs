//! User profile handlers.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::auth::update_username;
use crate::db::UserRepository;
use crate::web::dto::{ApiResponse, UpdateUsernameRequest, UserInfo, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// PUT /api/users/me - Set the caller's display username.
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<UpdateUsernameRequest>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let repo = UserRepository::new(state.db.pool());
    let user = update_username(&repo, claims.sub, &req.username).await?;
    Ok(Json(ApiResponse::new(UserInfo::from(&user))))
}
