//! Failure taxonomy for backend calls.
//!
//! Every failure a backend operation can produce is one of these kinds.
//! The kind plus a human-readable detail is what MCP clients see; distinct
//! causes are never conflated into a generic error.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum GhostError {
    /// The admin key or base URL cannot produce valid requests. Checked at
    /// startup, so a serving process should never surface this per request.
    #[error("configuration: {0}")]
    Configuration(String),

    /// The backend rejected the semantic content of the call. Carries the
    /// backend's own detail message.
    #[error("invalid_request: {0}")]
    InvalidRequest(String),

    /// The referenced resource does not exist.
    #[error("not_found: {0}")]
    NotFound(String),

    /// The credential was rejected even after one refresh-and-retry.
    #[error("auth: {0}")]
    Auth(String),

    /// Network failure, timeout, rate limiting, or a backend 5xx.
    #[error("transient: {0}")]
    Transient(String),

    /// The backend answered with a shape this client does not understand.
    /// Logged for investigation, never silently coerced.
    #[error("protocol_mismatch: {0}")]
    ProtocolMismatch(String),
}

impl GhostError {
    pub fn kind(&self) -> &'static str {
        match self {
            GhostError::Configuration(_) => "configuration",
            GhostError::InvalidRequest(_) => "invalid_request",
            GhostError::NotFound(_) => "not_found",
            GhostError::Auth(_) => "auth",
            GhostError::Transient(_) => "transient",
            GhostError::ProtocolMismatch(_) => "protocol_mismatch",
        }
    }

    /// Whether re-issuing the same call is sensible.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GhostError::Transient(_))
    }
}
