//! API handlers.

pub mod auth;
pub mod file;
pub mod share;
pub mod user;

pub use auth::*;
pub use file::*;
pub use share::*;
pub use user::*;
