//! Ghost Admin API integration
//!
//! Provides the credential manager that mints and caches short-lived
//! admin tokens, the typed client with one method per backend operation,
//! and the wire models shared between them.

mod auth;
mod client;
mod error;
mod models;

pub use auth::{AdminKey, Credential, CredentialManager};
pub use client::GhostClient;
pub use error::GhostError;
pub use models::*;

/// Admin API version this server speaks, used in URLs, token audience
/// claims and the `Accept-Version` header.
pub const API_VERSION: &str = "v4";
