//! Router configuration for the HTTP API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::dto::HealthResponse;
use super::handlers::{
    delete_file, get_file, get_file_content, get_shared, get_shared_content, list_files, login,
    logout, me, register, share_file, update_me, upload_file, AppState,
};
use super::middleware::{create_cors_layer, jwt_auth, login_rate_limit, JwtState, RateLimitState};

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    rate_limit: Arc<RateLimitState>,
    cors_origins: &[String],
) -> Router {
    let login_route = Router::new()
        .route("/login", post(login))
        .layer(middleware::from_fn(move |req, next| {
            let state = rate_limit.clone();
            login_rate_limit(state, req, next)
        }));

    let auth_routes = Router::new()
        .route("/register", post(register))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .merge(login_route);

    // Upload size is enforced while reading the multipart body.
    let file_routes = Router::new()
        .route(
            "/",
            get(list_files)
                .post(upload_file)
                .layer(DefaultBodyLimit::disable()),
        )
        .route("/:public_id", get(get_file).delete(delete_file))
        .route("/:public_id/content", get(get_file_content))
        .route("/:public_id/share", post(share_file));

    let share_routes = Router::new()
        .route("/:code", get(get_shared))
        .route("/:code/content", get(get_shared_content));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .route("/users/me", put(update_me))
        .nest("/files", file_routes)
        .nest("/share", share_routes);

    Router::new()
        .nest("/api", api_routes)
        .merge(create_health_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state.clone();
                    jwt_auth(state, req, next)
                })),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router<S: Clone + Send + Sync + 'static>() -> Router<S> {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
