//! Shared helpers for the HTTP API tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use serde_json::{json, Value};
use tempfile::TempDir;

use sharebox::config::Config;
use sharebox::file::{FileStorage, QuotaGuard};
use sharebox::web::handlers::AppState;
use sharebox::web::middleware::{JwtState, RateLimitState};
use sharebox::web::router::create_router;
use sharebox::Database;

pub const TEST_PASSWORD: &str = "password123";

/// A running test app. The temp dir holds blob storage and must outlive the server.
pub struct TestApp {
    pub server: TestServer,
    pub db: Arc<Database>,
    pub storage: FileStorage,
    _dir: TempDir,
}

fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.auth.jwt_secret = "test-secret-key-for-testing-only".to_string();
    config.auth.admin_emails = vec!["admin@example.com".to_string()];
    config.server.login_rate_limit = 1000;
    config.files.storage_path = dir.path().join("files").to_string_lossy().into_owned();
    config
}

/// Create a test app with the configured default limits.
pub async fn create_test_app() -> TestApp {
    create_test_app_with(|_| {}).await
}

/// Create a test app with explicit byte limits.
pub async fn create_test_app_with_limits(max_file_size: u64, quota: u64) -> TestApp {
    build(|_| {}, Some(QuotaGuard::new(max_file_size, quota))).await
}

/// Create a test app after adjusting the config.
pub async fn create_test_app_with(adjust: impl FnOnce(&mut Config)) -> TestApp {
    build(adjust, None).await
}

async fn build(adjust: impl FnOnce(&mut Config), quota: Option<QuotaGuard>) -> TestApp {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = test_config(&dir);
    adjust(&mut config);

    let db = Arc::new(
        Database::open_in_memory()
            .await
            .expect("Failed to create test database"),
    );
    let storage =
        FileStorage::new(&config.files.storage_path).expect("Failed to create file storage");
    let quota = quota.unwrap_or_else(|| QuotaGuard::from_config(&config.files));

    let app_state = Arc::new(AppState::new(
        db.clone(),
        storage.clone(),
        quota,
        config.auth.clone(),
    ));
    let jwt_state = Arc::new(JwtState::new(&config.auth.jwt_secret));
    let rate_limit = Arc::new(
        RateLimitState::new(config.server.login_rate_limit)
            .with_trust_proxy_headers(config.server.trust_proxy_headers),
    );

    let router = create_router(app_state, jwt_state, rate_limit, &config.server.cors_origins);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        db,
        storage,
        _dir: dir,
    }
}

/// Register an account and return the response body.
pub async fn register(server: &TestServer, email: &str) -> Value {
    server
        .post("/api/auth/register")
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .await
        .json::<Value>()
}

/// Register an account and return its session token.
pub async fn register_token(server: &TestServer, email: &str) -> String {
    token_of(&register(server, email).await)
}

/// Session token from an auth response body.
pub fn token_of(body: &Value) -> String {
    body["data"]["token"]
        .as_str()
        .expect("response carries a token")
        .to_string()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Upload `content` as `filename` with an optional share flag.
pub async fn upload(
    server: &TestServer,
    token: &str,
    filename: &str,
    content: Vec<u8>,
    share: bool,
) -> TestResponse {
    let part = Part::bytes(content)
        .file_name(filename)
        .mime_type("application/octet-stream");
    let mut form = MultipartForm::new().add_part("file", part);
    if share {
        form = form.add_text("share", "true");
    }

    server
        .post("/api/files")
        .add_header(AUTHORIZATION, bearer(token))
        .multipart(form)
        .await
}
