//! Authentication handlers.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::EncodingKey;
use std::sync::Arc;

use crate::auth::{authenticate, register as register_user, RegistrationRequest};
use crate::config::AuthConfig;
use crate::db::{User, UserRepository};
use crate::file::{FileService, FileStorage, QuotaGuard};
use crate::web::dto::{ApiResponse, AuthResponse, CredentialsRequest, UserInfo, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::middleware::{AuthUser, JwtClaims, AUTH_COOKIE};
use crate::Database;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared database pool.
    pub db: Arc<Database>,
    /// Blob store.
    pub storage: FileStorage,
    /// Upload limits.
    pub quota: QuotaGuard,
    /// JWT encoding key.
    pub encoding_key: EncodingKey,
    /// Auth settings (token lifetime, cookie flags, admin emails).
    pub auth: AuthConfig,
}

impl AppState {
    /// Create a new application state.
    pub fn new(db: Arc<Database>, storage: FileStorage, quota: QuotaGuard, auth: AuthConfig) -> Self {
        Self {
            db,
            storage,
            quota,
            encoding_key: EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
            auth,
        }
    }

    /// File service bound to this state.
    pub fn files(&self) -> FileService<'_> {
        FileService::new(&self.db, &self.storage).with_quota(self.quota)
    }

    /// Generate a session token for a user.
    pub fn generate_token(&self, user: &User) -> Result<String, ApiError> {
        JwtClaims::new(user.id, &user.email, user.is_admin, self.auth.token_expiry_secs)
            .encode(&self.encoding_key)
    }

    /// Session cookie carrying `token`.
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((AUTH_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.auth.secure_cookie)
            .build()
    }

    /// Load the user behind a token. A deleted account is an auth failure.
    pub async fn current_user(&self, claims: &JwtClaims) -> Result<User, ApiError> {
        UserRepository::new(self.db.pool())
            .get_by_id(claims.sub)
            .await?
            .ok_or_else(|| ApiError::unauthorized("User no longer exists"))
    }

    fn auth_response(&self, jar: CookieJar, user: &User) -> Result<(CookieJar, AuthResponse), ApiError> {
        let token = self.generate_token(user)?;
        let jar = jar.add(self.session_cookie(token.clone()));
        Ok((
            jar,
            AuthResponse {
                token,
                expires_in: self.auth.token_expiry_secs,
                user: UserInfo::from(user),
            },
        ))
    }
}

/// POST /api/auth/register - Create an account and start a session.
pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<CredentialsRequest>,
) -> Result<(StatusCode, CookieJar, Json<ApiResponse<AuthResponse>>), ApiError> {
    let is_admin = state.auth.is_admin_email(&req.email);
    let repo = UserRepository::new(state.db.pool());
    let user = register_user(&repo, RegistrationRequest::new(req.email, req.password), is_admin).await?;

    let (jar, response) = state.auth_response(jar, &user)?;
    Ok((StatusCode::CREATED, jar, Json(ApiResponse::new(response))))
}

/// POST /api/auth/login - User login.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<CredentialsRequest>,
) -> Result<(CookieJar, Json<ApiResponse<AuthResponse>>), ApiError> {
    let repo = UserRepository::new(state.db.pool());
    let user = authenticate(&repo, &req.email, &req.password).await?;

    let (jar, response) = state.auth_response(jar, &user)?;
    Ok((jar, Json(ApiResponse::new(response))))
}

/// POST /api/auth/logout - Clear the session cookie.
///
/// Tokens are stateless, so a copied token stays valid until it expires.
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<ApiResponse<()>>) {
    let jar = jar.remove(Cookie::build(AUTH_COOKIE).path("/"));
    (jar, Json(ApiResponse::new(())))
}

/// GET /api/auth/me - Get current user info.
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let user = state.current_user(&claims).await?;
    Ok(Json(ApiResponse::new(UserInfo::from(&user))))
}

