//! Per-client rate limiting for the login endpoint.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc, time::Duration};

use crate::web::error::ApiError;

/// How often idle limiter entries are dropped.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// State for rate limiting.
pub struct RateLimitState {
    login: DefaultKeyedRateLimiter<String>,
    login_rate_limit: u32,
    trust_proxy_headers: bool,
}

impl RateLimitState {
    /// Create a limiter allowing `login_rate_limit` attempts per minute per IP.
    pub fn new(login_rate_limit: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(login_rate_limit).unwrap_or(NonZeroU32::MIN));
        Self {
            login: RateLimiter::keyed(quota),
            login_rate_limit,
            trust_proxy_headers: false,
        }
    }

    /// Key clients by `X-Forwarded-For` / `X-Real-IP` instead of the peer
    /// address. Only safe behind a proxy that overwrites those headers.
    pub fn with_trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    /// Attempts allowed per minute.
    pub fn login_rate_limit(&self) -> u32 {
        self.login_rate_limit
    }

    /// Check if a login attempt is allowed for the given IP.
    pub fn check_login(&self, ip: &str) -> bool {
        self.login.check_key(&ip.to_string()).is_ok()
    }

    /// Drop limiter entries whose quota has fully replenished.
    pub fn cleanup(&self) {
        self.login.retain_recent();
        self.login.shrink_to_fit();
    }

    /// Start a background task to periodically clean up old entries.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(CLEANUP_INTERVAL).await;
                self.cleanup();
            }
        });
    }
}

/// Extract client IP from request.
///
/// Proxy headers are client-controlled unless a trusted proxy sets them,
/// so they are only read when `trust_proxy_headers` is on.
fn get_client_ip(req: &Request<Body>, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        if let Some(ip) = proxy_header_ip(req) {
            return ip;
        }
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

fn proxy_header_ip(req: &Request<Body>) -> Option<String> {
    if let Some(forwarded) = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(ip) = forwarded.split(',').next().map(str::trim) {
            if !ip.is_empty() {
                return Some(ip.to_string());
            }
        }
    }

    req.headers()
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Rate limiting middleware for login endpoint.
pub async fn login_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = get_client_ip(&req, state.trust_proxy_headers);

    if !state.check_login(&ip) {
        tracing::warn!(ip = %ip, "Login rate limit exceeded");
        return ApiError::too_many_requests("Too many login attempts. Please try again later.")
            .into_response();
    }

    next.run(req).await
}
