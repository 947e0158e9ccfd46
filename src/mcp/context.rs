//! MCP Tool Execution Context
//!
//! Provides access to server state for tool implementations.

use std::sync::Arc;

use crate::ghost::GhostClient;

/// Context provided to tool handlers during execution
#[derive(Clone)]
pub struct ToolContext {
    /// Access to the Ghost Admin API
    pub ghost: Arc<GhostClient>,
}
