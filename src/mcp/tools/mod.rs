//! MCP Tools
//!
//! Tool implementations for posts, pages, tags, and site information.

pub mod pages;
pub mod posts;
pub mod site;
pub mod tags;

use tracing::{error, warn};

use super::protocol::ToolsCallResult;
use super::registry::McpRegistry;
use crate::ghost::GhostError;

/// Register all tools with the registry
pub fn register_all_tools(registry: &mut McpRegistry) {
    posts::register_tools(registry);
    pages::register_tools(registry);
    tags::register_tools(registry);
    site::register_tools(registry);
}

/// Convert a backend failure into a tool result the client can read.
///
/// The invocation itself worked, so the failure travels inside the result
/// with `isError` set and a `kind: detail` message rather than as a
/// protocol error.
pub(crate) fn backend_failure(tool: &'static str, err: GhostError) -> ToolsCallResult {
    match &err {
        GhostError::ProtocolMismatch(detail) => {
            error!(tool, detail = %detail, "backend response did not match the expected shape");
        }
        _ => warn!(tool, error = %err, "backend call failed"),
    }
    ToolsCallResult::error(err.to_string())
}
