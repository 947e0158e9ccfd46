//! Site Tools

use serde_json::Value;

use crate::mcp::context::ToolContext;
use crate::mcp::protocol::{McpError, ToolsCallResult};
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};

/// Register site tools with the registry
pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(site_info_tool());
}

// ============================================================================
// site.info
// ============================================================================

fn site_info_tool() -> RegisteredTool {
    ToolBuilder::new("site.info")
        .description("Get site title, description, URL, and backend version")
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        }))
        .build(site_info_handler)
}

async fn site_info_handler(ctx: ToolContext, _params: Value) -> ToolResult {
    match ctx.ghost.site_info().await {
        Ok(info) => ToolsCallResult::json(&serde_json::json!({ "site": info }))
            .map_err(|e| McpError::InternalError(e.to_string())),
        Err(err) => Ok(super::backend_failure("site.info", err)),
    }
}
