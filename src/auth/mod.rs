//! Authentication module for Sharebox.
//!
//! Password hashing, account registration, credential checks and profile
//! updates. Token issuance lives in the web layer.

mod login;
mod password;
mod profile;
mod registration;
pub mod validation;

pub use login::{authenticate, AuthError};
pub use password::{hash_password, validate_password, verify_password, PasswordError};
pub use profile::{update_username, ProfileError};
pub use registration::{register, RegistrationError, RegistrationRequest};
pub use validation::ValidationError;
