//! Page Tools
//!
//! Tools for static pages. Pages share the post shape but live outside
//! the feed, so they get their own tool family.

use serde::Deserialize;
use serde_json::Value;

use crate::ghost::{ListQuery, PostChanges, PostDraft, PostStatus, TagRef};
use crate::mcp::context::ToolContext;
use crate::mcp::protocol::{McpError, ToolsCallResult};
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};

/// Register page tools with the registry
pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(pages_list_tool());
    registry.register_tool(pages_get_tool());
    registry.register_tool(pages_create_tool());
    registry.register_tool(pages_update_tool());
    registry.register_tool(pages_delete_tool());
}

// ============================================================================
// pages.list
// ============================================================================

#[derive(Debug, Deserialize)]
struct PagesListParams {
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    status: Option<PostStatus>,
}

fn pages_list_tool() -> RegisteredTool {
    ToolBuilder::new("pages.list")
        .description("List static pages, optionally filtered by status")
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of pages to return (default 10, capped at 200)",
                    "minimum": 1,
                    "maximum": 200
                },
                "status": {
                    "type": "string",
                    "enum": ["draft", "published", "scheduled"],
                    "description": "Only return pages with this status"
                }
            },
            "additionalProperties": false
        }))
        .build(pages_list_handler)
}

async fn pages_list_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: PagesListParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let query = ListQuery {
        limit: params.limit,
        status: params.status,
    };

    match ctx.ghost.list_pages(&query).await {
        Ok(listing) => {
            let result = serde_json::json!({
                "pages": listing.items,
                "total": listing.total,
                "more_available": listing.more_available,
            });
            ToolsCallResult::json(&result).map_err(|e| McpError::InternalError(e.to_string()))
        }
        Err(err) => Ok(super::backend_failure("pages.list", err)),
    }
}

// ============================================================================
// pages.get
// ============================================================================

#[derive(Debug, Deserialize)]
struct PagesGetParams {
    id: String,
}

fn pages_get_tool() -> RegisteredTool {
    ToolBuilder::new("pages.get")
        .description("Get a single static page by ID, including its HTML body")
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "string",
                    "description": "Page ID"
                }
            },
            "required": ["id"],
            "additionalProperties": false
        }))
        .build(pages_get_handler)
}

async fn pages_get_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: PagesGetParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    match ctx.ghost.get_page(&params.id).await {
        Ok(page) => ToolsCallResult::json(&serde_json::json!({ "page": page }))
            .map_err(|e| McpError::InternalError(e.to_string())),
        Err(err) => Ok(super::backend_failure("pages.get", err)),
    }
}

// ============================================================================
// pages.create
// ============================================================================

#[derive(Debug, Deserialize)]
struct PagesCreateParams {
    title: String,
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    status: Option<PostStatus>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

fn pages_create_tool() -> RegisteredTool {
    ToolBuilder::new("pages.create")
        .description("Create a new static page")
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "description": "Page title"
                },
                "html": {
                    "type": "string",
                    "description": "Page body as HTML"
                },
                "status": {
                    "type": "string",
                    "enum": ["draft", "published", "scheduled"],
                    "description": "Publication status (default draft)"
                },
                "tags": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Tag names to attach; unknown names create new tags"
                }
            },
            "required": ["title"],
            "additionalProperties": false
        }))
        .build(pages_create_handler)
}

async fn pages_create_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: PagesCreateParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let draft = PostDraft {
        title: params.title,
        html: params.html.unwrap_or_default(),
        status: params.status.unwrap_or(PostStatus::Draft),
        tags: params
            .tags
            .map(|names| names.into_iter().map(|name| TagRef { name }).collect()),
    };

    match ctx.ghost.create_page(&draft).await {
        Ok(page) => ToolsCallResult::json(&serde_json::json!({ "page": page }))
            .map_err(|e| McpError::InternalError(e.to_string())),
        Err(err) => Ok(super::backend_failure("pages.create", err)),
    }
}

// ============================================================================
// pages.update
// ============================================================================

#[derive(Debug, Deserialize)]
struct PagesUpdateParams {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    status: Option<PostStatus>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

fn pages_update_tool() -> RegisteredTool {
    ToolBuilder::new("pages.update")
        .description("Update an existing static page. Only the supplied fields change.")
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "string",
                    "description": "Page ID"
                },
                "title": {
                    "type": "string",
                    "description": "New title"
                },
                "html": {
                    "type": "string",
                    "description": "New body as HTML"
                },
                "status": {
                    "type": "string",
                    "enum": ["draft", "published", "scheduled"],
                    "description": "New publication status"
                },
                "tags": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Replacement tag names; the full set is replaced"
                }
            },
            "required": ["id"],
            "additionalProperties": false
        }))
        .build(pages_update_handler)
}

async fn pages_update_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: PagesUpdateParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let changes = PostChanges {
        title: params.title,
        html: params.html,
        status: params.status,
        tags: params.tags,
    };
    if changes.is_empty() {
        return Err(McpError::InvalidParams(
            "at least one field to change is required".to_string(),
        ));
    }

    match ctx.ghost.update_page(&params.id, &changes).await {
        Ok(page) => ToolsCallResult::json(&serde_json::json!({ "page": page }))
            .map_err(|e| McpError::InternalError(e.to_string())),
        Err(err) => Ok(super::backend_failure("pages.update", err)),
    }
}

// ============================================================================
// pages.delete
// ============================================================================

#[derive(Debug, Deserialize)]
struct PagesDeleteParams {
    id: String,
}

fn pages_delete_tool() -> RegisteredTool {
    ToolBuilder::new("pages.delete")
        .description("Delete a static page permanently")
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "string",
                    "description": "Page ID"
                }
            },
            "required": ["id"],
            "additionalProperties": false
        }))
        .build(pages_delete_handler)
}

async fn pages_delete_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: PagesDeleteParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    match ctx.ghost.delete_page(&params.id).await {
        Ok(()) => ToolsCallResult::json(&serde_json::json!({
            "deleted": true,
            "id": params.id,
        }))
        .map_err(|e| McpError::InternalError(e.to_string())),
        Err(err) => Ok(super::backend_failure("pages.delete", err)),
    }
}
