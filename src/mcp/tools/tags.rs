//! Tag Tools
//!
//! Tools for managing the tag taxonomy.

use serde::Deserialize;
use serde_json::Value;

use crate::ghost::{ListQuery, TagChanges, TagDraft};
use crate::mcp::context::ToolContext;
use crate::mcp::protocol::{McpError, ToolsCallResult};
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};

/// Register tag tools with the registry
pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(tags_list_tool());
    registry.register_tool(tags_get_tool());
    registry.register_tool(tags_create_tool());
    registry.register_tool(tags_update_tool());
    registry.register_tool(tags_delete_tool());
}

// ============================================================================
// tags.list
// ============================================================================

#[derive(Debug, Deserialize)]
struct TagsListParams {
    #[serde(default)]
    limit: Option<u32>,
}

fn tags_list_tool() -> RegisteredTool {
    ToolBuilder::new("tags.list")
        .description("List tags")
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of tags to return (default 10, capped at 200)",
                    "minimum": 1,
                    "maximum": 200
                }
            },
            "additionalProperties": false
        }))
        .build(tags_list_handler)
}

async fn tags_list_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: TagsListParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let query = ListQuery {
        limit: params.limit,
        status: None,
    };

    match ctx.ghost.list_tags(&query).await {
        Ok(listing) => {
            let result = serde_json::json!({
                "tags": listing.items,
                "total": listing.total,
                "more_available": listing.more_available,
            });
            ToolsCallResult::json(&result).map_err(|e| McpError::InternalError(e.to_string()))
        }
        Err(err) => Ok(super::backend_failure("tags.list", err)),
    }
}

// ============================================================================
// tags.get
// ============================================================================

#[derive(Debug, Deserialize)]
struct TagsGetParams {
    id: String,
}

fn tags_get_tool() -> RegisteredTool {
    ToolBuilder::new("tags.get")
        .description("Get a single tag by ID")
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "string",
                    "description": "Tag ID"
                }
            },
            "required": ["id"],
            "additionalProperties": false
        }))
        .build(tags_get_handler)
}

async fn tags_get_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: TagsGetParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    match ctx.ghost.get_tag(&params.id).await {
        Ok(tag) => ToolsCallResult::json(&serde_json::json!({ "tag": tag }))
            .map_err(|e| McpError::InternalError(e.to_string())),
        Err(err) => Ok(super::backend_failure("tags.get", err)),
    }
}

// ============================================================================
// tags.create
// ============================================================================

#[derive(Debug, Deserialize)]
struct TagsCreateParams {
    name: String,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

fn tags_create_tool() -> RegisteredTool {
    ToolBuilder::new("tags.create")
        .description("Create a new tag")
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Tag name"
                },
                "slug": {
                    "type": "string",
                    "description": "URL slug (derived from the name when omitted)"
                },
                "description": {
                    "type": "string",
                    "description": "Tag description"
                }
            },
            "required": ["name"],
            "additionalProperties": false
        }))
        .build(tags_create_handler)
}

async fn tags_create_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: TagsCreateParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let draft = TagDraft {
        name: params.name,
        slug: params.slug,
        description: params.description,
    };

    match ctx.ghost.create_tag(&draft).await {
        Ok(tag) => ToolsCallResult::json(&serde_json::json!({ "tag": tag }))
            .map_err(|e| McpError::InternalError(e.to_string())),
        Err(err) => Ok(super::backend_failure("tags.create", err)),
    }
}

// ============================================================================
// tags.update
// ============================================================================

#[derive(Debug, Deserialize)]
struct TagsUpdateParams {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

fn tags_update_tool() -> RegisteredTool {
    ToolBuilder::new("tags.update")
        .description("Update an existing tag. Only the supplied fields change.")
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "string",
                    "description": "Tag ID"
                },
                "name": {
                    "type": "string",
                    "description": "New name"
                },
                "slug": {
                    "type": "string",
                    "description": "New URL slug"
                },
                "description": {
                    "type": "string",
                    "description": "New description"
                }
            },
            "required": ["id"],
            "additionalProperties": false
        }))
        .build(tags_update_handler)
}

async fn tags_update_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: TagsUpdateParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let changes = TagChanges {
        name: params.name,
        slug: params.slug,
        description: params.description,
    };
    if changes.is_empty() {
        return Err(McpError::InvalidParams(
            "at least one field to change is required".to_string(),
        ));
    }

    match ctx.ghost.update_tag(&params.id, &changes).await {
        Ok(tag) => ToolsCallResult::json(&serde_json::json!({ "tag": tag }))
            .map_err(|e| McpError::InternalError(e.to_string())),
        Err(err) => Ok(super::backend_failure("tags.update", err)),
    }
}

// ============================================================================
// tags.delete
// ============================================================================

#[derive(Debug, Deserialize)]
struct TagsDeleteParams {
    id: String,
}

fn tags_delete_tool() -> RegisteredTool {
    ToolBuilder::new("tags.delete")
        .description("Delete a tag. Posts keep their other tags.")
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "string",
                    "description": "Tag ID"
                }
            },
            "required": ["id"],
            "additionalProperties": false
        }))
        .build(tags_delete_handler)
}

async fn tags_delete_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: TagsDeleteParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    match ctx.ghost.delete_tag(&params.id).await {
        Ok(()) => ToolsCallResult::json(&serde_json::json!({
            "deleted": true,
            "id": params.id,
        }))
        .map_err(|e| McpError::InternalError(e.to_string())),
        Err(err) => Ok(super::backend_failure("tags.delete", err)),
    }
}
