//! Ghost MCP Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod ghost;
pub mod mcp;
pub mod server;

// Re-export commonly used types for convenience
pub use config::{AppConfig, CliConfig, EnvConfig, FileConfig, Transport};
pub use ghost::{AdminKey, CredentialManager, GhostClient, GhostError};
pub use mcp::{create_mcp_state, McpState};
pub use server::{run_server, run_stdio, RequestsLoggingLevel, ServerConfig};

/// Version string reported in the MCP handshake and the home endpoint.
pub fn version() -> String {
    format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("GIT_HASH"))
}
