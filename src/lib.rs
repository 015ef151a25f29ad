//! Sharebox - a small file-sharing web service.
//!
//! Users register, upload files into per-account storage with quotas, and
//! hand out short public share links.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use auth::{
    authenticate, hash_password, register, update_username, validate_password, verify_password,
    AuthError, PasswordError, ProfileError, RegistrationError, RegistrationRequest,
    ValidationError,
};
pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository};
pub use error::{Result, ShareboxError};
pub use file::{
    FileKey, FileRecord, FileRepository, FileService, FileStorage, QuotaGuard, ShareLinkIssuer,
    StorageUsage, UploadRequest, UploadResult,
};
pub use web::WebServer;
