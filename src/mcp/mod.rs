//! MCP (Model Context Protocol) Server
//!
//! Bridges MCP clients to the Ghost Admin API. Exposes a closed set of
//! content management tools that LLM clients can list and invoke.
//!
//! ## Architecture
//!
//! - Transports: SSE (HTTP) or stdio, one session per client
//! - Sessions: connecting -> active -> closing -> closed
//! - Tools: static registry, arguments validated before dispatch

pub mod context;
pub mod handler;
pub mod protocol;
pub mod registry;
pub mod tools;

pub use handler::{create_mcp_state, dispatch_message, McpState};
pub use protocol::{McpError, McpRequest, McpResponse};
pub use registry::McpRegistry;
