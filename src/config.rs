//! Configuration module for Sharebox.

use serde::Deserialize;
use std::path::Path;

use crate::{Result, ShareboxError};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Login attempts allowed per minute per client IP.
    #[serde(default = "default_login_rate_limit")]
    pub login_rate_limit: u32,
    /// Key the login limiter on `X-Forwarded-For` / `X-Real-IP`.
    /// Enable only behind a reverse proxy that sets these headers.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_login_rate_limit() -> u32 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
            login_rate_limit: default_login_rate_limit(),
            trust_proxy_headers: false,
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/sharebox.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// File storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Path to the blob storage directory.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    /// Maximum size of a single upload in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
    /// Per-account storage quota in megabytes (admins are exempt).
    #[serde(default = "default_quota")]
    pub quota_mb: u64,
}

fn default_storage_path() -> String {
    "data/files".to_string()
}

fn default_max_upload_size() -> u64 {
    10
}

fn default_quota() -> u64 {
    100
}

impl FilesConfig {
    /// Per-file cap in bytes.
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }

    /// Per-account quota in bytes.
    pub fn quota_bytes(&self) -> u64 {
        self.quota_mb * 1024 * 1024
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            max_upload_size_mb: default_max_upload_size(),
            quota_mb: default_quota(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// JWT secret key (required).
    #[serde(default)]
    pub jwt_secret: String,
    /// Session token lifetime in seconds.
    #[serde(default = "default_token_expiry")]
    pub token_expiry_secs: u64,
    /// Mark the session cookie as `Secure`.
    #[serde(default)]
    pub secure_cookie: bool,
    /// Emails that are registered with the admin flag set.
    #[serde(default)]
    pub admin_emails: Vec<String>,
}

fn default_token_expiry() -> u64 {
    7 * 24 * 60 * 60 // 7 days
}

impl AuthConfig {
    /// Whether an email address is configured as an admin.
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails
            .iter()
            .any(|e| e.trim().eq_ignore_ascii_case(email.trim()))
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_expiry_secs: default_token_expiry(),
            secure_cookie: false,
            admin_emails: vec![],
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/sharebox.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// File storage configuration.
    #[serde(default)]
    pub files: FilesConfig,
    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ShareboxError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ShareboxError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `SHAREBOX_JWT_SECRET`: JWT secret key
    /// - `SHAREBOX_DATABASE_PATH`: SQLite database path
    /// - `SHAREBOX_STORAGE_PATH`: blob storage directory
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = non_empty_env("SHAREBOX_JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
        if let Some(v) = non_empty_env("SHAREBOX_DATABASE_PATH") {
            self.database.path = v;
        }
        if let Some(v) = non_empty_env("SHAREBOX_STORAGE_PATH") {
            self.files.storage_path = v;
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - JWT secret is not set
    /// - Upload size or quota is zero
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ShareboxError::Config(
                "jwt_secret is not set. \
                 Set it in config.toml or via SHAREBOX_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }
        if self.files.max_upload_size_mb == 0 {
            return Err(ShareboxError::Config(
                "files.max_upload_size_mb must be greater than 0".to_string(),
            ));
        }
        if self.files.quota_mb == 0 {
            return Err(ShareboxError::Config(
                "files.quota_mb must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
