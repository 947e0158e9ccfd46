//! Post Tools
//!
//! Tools for listing, reading, and writing blog posts.

use serde::Deserialize;
use serde_json::Value;

use crate::ghost::{ListQuery, PostChanges, PostDraft, PostStatus, TagRef};
use crate::mcp::context::ToolContext;
use crate::mcp::protocol::{McpError, ToolsCallResult};
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};

/// Register post tools with the registry
pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(posts_list_tool());
    registry.register_tool(posts_get_tool());
    registry.register_tool(posts_create_tool());
    registry.register_tool(posts_update_tool());
    registry.register_tool(posts_delete_tool());
}

// ============================================================================
// posts.list
// ============================================================================

#[derive(Debug, Deserialize)]
struct PostsListParams {
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    status: Option<PostStatus>,
}

fn posts_list_tool() -> RegisteredTool {
    ToolBuilder::new("posts.list")
        .description("List blog posts, newest first, optionally filtered by status")
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of posts to return (default 10, capped at 200)",
                    "minimum": 1,
                    "maximum": 200
                },
                "status": {
                    "type": "string",
                    "enum": ["draft", "published", "scheduled"],
                    "description": "Only return posts with this status"
                }
            },
            "additionalProperties": false
        }))
        .build(posts_list_handler)
}

async fn posts_list_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: PostsListParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let query = ListQuery {
        limit: params.limit,
        status: params.status,
    };

    match ctx.ghost.list_posts(&query).await {
        Ok(listing) => {
            let result = serde_json::json!({
                "posts": listing.items,
                "total": listing.total,
                "more_available": listing.more_available,
            });
            ToolsCallResult::json(&result).map_err(|e| McpError::InternalError(e.to_string()))
        }
        Err(err) => Ok(super::backend_failure("posts.list", err)),
    }
}

// ============================================================================
// posts.get
// ============================================================================

#[derive(Debug, Deserialize)]
struct PostsGetParams {
    id: String,
}

fn posts_get_tool() -> RegisteredTool {
    ToolBuilder::new("posts.get")
        .description("Get a single blog post by ID, including its HTML body and tags")
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "string",
                    "description": "Post ID"
                }
            },
            "required": ["id"],
            "additionalProperties": false
        }))
        .build(posts_get_handler)
}

async fn posts_get_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: PostsGetParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    match ctx.ghost.get_post(&params.id).await {
        Ok(post) => ToolsCallResult::json(&serde_json::json!({ "post": post }))
            .map_err(|e| McpError::InternalError(e.to_string())),
        Err(err) => Ok(super::backend_failure("posts.get", err)),
    }
}

// ============================================================================
// posts.create
// ============================================================================

#[derive(Debug, Deserialize)]
struct PostsCreateParams {
    title: String,
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    status: Option<PostStatus>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

fn posts_create_tool() -> RegisteredTool {
    ToolBuilder::new("posts.create")
        .description("Create a new blog post")
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "description": "Post title"
                },
                "html": {
                    "type": "string",
                    "description": "Post body as HTML"
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
        .build(posts_create_handler)
}

async fn posts_create_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: PostsCreateParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let draft = PostDraft {
        title: params.title,
        html: params.html.unwrap_or_default(),
        status: params.status.unwrap_or(PostStatus::Draft),
        tags: params
            .tags
            .map(|names| names.into_iter().map(|name| TagRef { name }).collect()),
    };

    match ctx.ghost.create_post(&draft).await {
        Ok(post) => ToolsCallResult::json(&serde_json::json!({ "post": post }))
            .map_err(|e| McpError::InternalError(e.to_string())),
        Err(err) => Ok(super::backend_failure("posts.create", err)),
    }
}

// ============================================================================
// posts.update
// ============================================================================

#[derive(Debug, Deserialize)]
struct PostsUpdateParams {
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

fn posts_update_tool() -> RegisteredTool {
    ToolBuilder::new("posts.update")
        .description("Update an existing blog post. Only the supplied fields change.")
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "string",
                    "description": "Post ID"
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
        .build(posts_update_handler)
}

async fn posts_update_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: PostsUpdateParams =
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

    match ctx.ghost.update_post(&params.id, &changes).await {
        Ok(post) => ToolsCallResult::json(&serde_json::json!({ "post": post }))
            .map_err(|e| McpError::InternalError(e.to_string())),
        Err(err) => Ok(super::backend_failure("posts.update", err)),
    }
}

// ============================================================================
// posts.delete
// ============================================================================

#[derive(Debug, Deserialize)]
struct PostsDeleteParams {
    id: String,
}

fn posts_delete_tool() -> RegisteredTool {
    ToolBuilder::new("posts.delete")
        .description("Delete a blog post permanently")
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "string",
                    "description": "Post ID"
                }
            },
            "required": ["id"],
            "additionalProperties": false
        }))
        .build(posts_delete_handler)
}

async fn posts_delete_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: PostsDeleteParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    match ctx.ghost.delete_post(&params.id).await {
        Ok(()) => ToolsCallResult::json(&serde_json::json!({
            "deleted": true,
            "id": params.id,
        }))
        .map_err(|e| McpError::InternalError(e.to_string())),
        Err(err) => Ok(super::backend_failure("posts.delete", err)),
    }
}
