//! Web API Auth Tests
//!
//! Integration tests for registration, login, sessions and profile updates.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use common::{bearer, create_test_app, create_test_app_with, register, register_token, token_of};
use serde_json::{json, Value};

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_success() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({ "email": "Alice@Example.com", "password": "password123" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert!(body["data"]["token"].is_string());
    assert_eq!(body["data"]["user"]["email"], "alice@example.com");
    assert_eq!(body["data"]["user"]["display_name"], "alice@example.com");
    assert_eq!(body["data"]["user"]["is_admin"], false);
    assert!(body["data"]["user"].get("password").is_none());

    let cookie = response.cookie("auth-token");
    assert_eq!(cookie.value(), body["data"]["token"].as_str().unwrap());
    assert_eq!(cookie.http_only(), Some(true));
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = create_test_app().await;
    register(&app.server, "alice@example.com").await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({ "email": "ALICE@example.com ", "password": "password123" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_register_invalid_email() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({ "email": "not-an-email", "password": "password123" }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["details"]["email"].is_array());
}

#[tokio::test]
async fn test_register_short_password() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({ "email": "alice@example.com", "password": "short" }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert!(body["error"]["details"]["password"].is_array());
}

#[tokio::test]
async fn test_register_admin_email() {
    let app = create_test_app().await;

    let body = register(&app.server, "admin@example.com").await;
    assert_eq!(body["data"]["user"]["is_admin"], true);
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_success() {
    let app = create_test_app().await;
    register(&app.server, "alice@example.com").await;

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "email": " Alice@example.com", "password": "password123" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["user"]["email"], "alice@example.com");
    assert!(!token_of(&body).is_empty());
    assert!(!response.cookie("auth-token").value().is_empty());
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = create_test_app().await;
    register(&app.server, "alice@example.com").await;

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "email": "alice@example.com", "password": "wrongpassword" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_unknown_email() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "email": "nobody@example.com", "password": "password123" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_login_rate_limited() {
    let app = create_test_app_with(|config| config.server.login_rate_limit = 2).await;

    for _ in 0..2 {
        app.server
            .post("/api/auth/login")
            .json(&json!({ "email": "nobody@example.com", "password": "password123" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "email": "nobody@example.com", "password": "password123" }))
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "TOO_MANY_REQUESTS");
}

// ============================================================================
// Session
// ============================================================================

#[tokio::test]
async fn test_me_with_bearer_token() {
    let app = create_test_app().await;
    let token = register_token(&app.server, "alice@example.com").await;

    let response = app
        .server
        .get("/api/auth/me")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["email"], "alice@example.com");
}

#[tokio::test]
async fn test_me_with_cookie() {
    let app = create_test_app().await;
    let token = register_token(&app.server, "alice@example.com").await;

    let response = app
        .server
        .get("/api/auth/me")
        .add_header(
            axum::http::header::COOKIE,
            format!("auth-token={}", token),
        )
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_me_without_token() {
    let app = create_test_app().await;

    let response = app.server.get("/api/auth/me").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_me_with_invalid_token() {
    let app = create_test_app().await;

    app.server
        .get("/api/auth/me")
        .add_header(AUTHORIZATION, bearer("not-a-jwt"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_from_other_secret_rejected() {
    let app = create_test_app().await;
    let other = create_test_app_with(|config| {
        config.auth.jwt_secret = "a-completely-different-secret".to_string()
    })
    .await;
    let token = register_token(&other.server, "alice@example.com").await;

    app.server
        .get("/api/auth/me")
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = create_test_app().await;
    let token = register_token(&app.server, "alice@example.com").await;

    let response = app
        .server
        .post("/api/auth/logout")
        .add_header(
            axum::http::header::COOKIE,
            format!("auth-token={}", token),
        )
        .await;

    response.assert_status_ok();
    let cookie = response.cookie("auth-token");
    assert_eq!(cookie.value(), "");
}

// ============================================================================
// Profile
// ============================================================================

#[tokio::test]
async fn test_update_username() {
    let app = create_test_app().await;
    let token = register_token(&app.server, "alice@example.com").await;

    let response = app
        .server
        .put("/api/users/me")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "username": "  alice_1 " }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["username"], "alice_1");
    assert_eq!(body["data"]["display_name"], "alice_1");
}

#[tokio::test]
async fn test_update_username_taken() {
    let app = create_test_app().await;
    let alice = register_token(&app.server, "alice@example.com").await;
    let bob = register_token(&app.server, "bob@example.com").await;

    app.server
        .put("/api/users/me")
        .add_header(AUTHORIZATION, bearer(&alice))
        .json(&json!({ "username": "shared" }))
        .await
        .assert_status_ok();

    let response = app
        .server
        .put("/api/users/me")
        .add_header(AUTHORIZATION, bearer(&bob))
        .json(&json!({ "username": "shared" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_update_username_invalid() {
    let app = create_test_app().await;
    let token = register_token(&app.server, "alice@example.com").await;

    app.server
        .put("/api/users/me")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "username": "no spaces allowed" }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    app.server
        .put("/api/users/me")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "username": "   " }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_update_username_requires_auth() {
    let app = create_test_app().await;

    app.server
        .put("/api/users/me")
        .json(&json!({ "username": "alice" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health() {
    let app = create_test_app().await;

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}
