//! MCP Tool Registry
//!
//! Holds the fixed table of callable tools and dispatches invocations.
//! Arguments are checked against the tool's declared input schema before a
//! handler runs, so malformed calls never reach the backend.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use super::context::ToolContext;
use super::protocol::{McpError, ToolDefinition, ToolsCallResult};

// ============================================================================
// Tool Types
// ============================================================================

/// Result type for tool execution
pub type ToolResult = Result<ToolsCallResult, McpError>;

/// Boxed future for async tool execution
pub type ToolFuture = Pin<Box<dyn Future<Output = ToolResult> + Send>>;

/// Tool handler function type
pub type ToolHandler = Arc<dyn Fn(ToolContext, Value) -> ToolFuture + Send + Sync>;

/// A registered tool with metadata and handler
pub struct RegisteredTool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub handler: ToolHandler,
}

// ============================================================================
// Registry
// ============================================================================

/// Registry for MCP tools. Built once at startup, immutable afterwards.
pub struct McpRegistry {
    tools: HashMap<String, RegisteredTool>,
}

impl McpRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool
    pub fn register_tool(&mut self, tool: RegisteredTool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get the advertised tool catalog, sorted by name so repeated listings
    /// are identical.
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        let mut tools: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|tool| ToolDefinition {
                name: tool.name.clone(),
                description: tool.description.clone(),
                input_schema: tool.input_schema.clone(),
            })
            .collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Get a tool by name
    pub fn get_tool(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    /// Look up a tool, validate the arguments against its input schema, and
    /// run its handler. Unknown names and schema violations are rejected
    /// here, before any backend call can be issued.
    pub async fn invoke(&self, ctx: ToolContext, name: &str, arguments: Value) -> ToolResult {
        let tool = self
            .get_tool(name)
            .ok_or_else(|| McpError::MethodNotFound(format!("unknown tool '{}'", name)))?;

        validate_arguments(&tool.input_schema, &arguments).map_err(McpError::InvalidParams)?;

        (tool.handler)(ctx, arguments).await
    }

    /// Get the number of registered tools
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }
}

impl Default for McpRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Schema validation
// ============================================================================

/// Structural check of `arguments` against a declared input schema.
///
/// Covers the subset of JSON Schema the tool table uses: top-level `object`
/// type, `required` membership, per-property `type`, `enum` membership, and
/// `items.type` for arrays. `additionalProperties: false` rejects unknown
/// keys. Anything the schema does not constrain passes through untouched.
fn validate_arguments(schema: &Value, arguments: &Value) -> Result<(), String> {
    let args = match arguments {
        Value::Object(map) => map,
        _ => return Err("arguments must be an object".to_string()),
    };

    let properties = schema.get("properties").and_then(|p| p.as_object());

    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for field in required.iter().filter_map(|f| f.as_str()) {
            if !args.contains_key(field) {
                return Err(format!("missing required field '{}'", field));
            }
        }
    }

    let reject_unknown = schema
        .get("additionalProperties")
        .and_then(|a| a.as_bool())
        .map(|allowed| !allowed)
        .unwrap_or(false);

    for (key, value) in args {
        let prop_schema = match properties.and_then(|p| p.get(key)) {
            Some(s) => s,
            None => {
                if reject_unknown {
                    return Err(format!("unexpected field '{}'", key));
                }
                continue;
            }
        };
        check_value(key, prop_schema, value)?;
    }

    Ok(())
}

fn check_value(field: &str, prop_schema: &Value, value: &Value) -> Result<(), String> {
    if let Some(expected) = prop_schema.get("type").and_then(|t| t.as_str()) {
        if !type_matches(expected, value) {
            return Err(format!(
                "field '{}' must be of type {}, got {}",
                field,
                expected,
                json_type_name(value)
            ));
        }
    }

    if let Some(allowed) = prop_schema.get("enum").and_then(|e| e.as_array()) {
        if !allowed.contains(value) {
            return Err(format!(
                "field '{}' must be one of {}",
                field,
                serde_json::to_string(allowed).unwrap_or_default()
            ));
        }
    }

    if let (Some(items), Some(elements)) = (prop_schema.get("items"), value.as_array()) {
        for element in elements {
            check_value(field, items, element)?;
        }
    }

    Ok(())
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        // JSON Schema treats integers as numbers
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Builder helpers
// ============================================================================

/// Builder for registering a tool
pub struct ToolBuilder {
    name: String,
    description: String,
    input_schema: Value,
}

impl ToolBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn input_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    pub fn build<F, Fut>(self, handler: F) -> RegisteredTool
    where
        F: Fn(ToolContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult> + Send + 'static,
    {
        RegisteredTool {
            name: self.name,
            description: self.description,
            input_schema: self.input_schema,
            handler: Arc::new(move |ctx, params| Box::pin(handler(ctx, params))),
        }
    }
}
