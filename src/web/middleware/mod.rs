//! Middleware for the HTTP API.

pub mod auth;
pub mod cors;
pub mod rate_limit;

pub use auth::{jwt_auth, AuthUser, JwtClaims, JwtState, AUTH_COOKIE};
pub use cors::create_cors_layer;
pub use rate_limit::{login_rate_limit, RateLimitState};
