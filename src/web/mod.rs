//! HTTP API for Sharebox.
//!
//! A JSON REST interface over the file lifecycle: accounts and sessions,
//! uploads, listing, deletion and public share links.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
