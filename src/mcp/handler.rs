//! MCP Message Handler
//!
//! Dispatches protocol messages against a session's state machine. The
//! transports spawn one dispatch task per incoming message, so tool
//! invocations run concurrently and responses leave in completion order,
//! matched to their requests by the echoed id.

use std::sync::Arc;

use tracing::{debug, info};

use super::context::ToolContext;
use super::protocol::{
    methods, InitializeParams, InitializeResult, McpError, McpRequest, McpResponse, PingResult,
    ServerCapabilities, ServerInfo, ToolsCapability, ToolsListResult, MCP_PROTOCOL_VERSION,
};
use super::registry::McpRegistry;
use crate::ghost::GhostClient;
use crate::server::session::{Session, SessionState};

/// Server name reported in the handshake.
const SERVER_NAME: &str = "ghost-mcp";

/// State shared across MCP sessions
pub struct McpState {
    pub registry: Arc<McpRegistry>,
    pub ghost: Arc<GhostClient>,
    pub server_version: String,
}

impl McpState {
    fn tool_context(&self) -> ToolContext {
        ToolContext {
            ghost: self.ghost.clone(),
        }
    }
}

/// Create the MCP state with registered tools
pub fn create_mcp_state(ghost: Arc<GhostClient>, server_version: String) -> McpState {
    let mut registry = McpRegistry::new();

    super::tools::register_all_tools(&mut registry);

    info!(
        "MCP registry initialized with {} tools",
        registry.tool_count()
    );

    McpState {
        registry: Arc::new(registry),
        ghost,
        server_version,
    }
}

/// Process one raw message from a session's transport and push whatever it
/// produces into the session channel.
pub async fn dispatch_message(state: Arc<McpState>, session: Arc<Session>, text: String) {
    let response = handle_message(&state, &session, &text).await;

    if let Some(response) = response {
        session.send(response).await;
    }

    // Shutdown and discarded handshakes end the stream after their
    // response has been queued
    if session.state().await == SessionState::Closing {
        session.finish_stream().await;
    }
}

/// Handle a single MCP message
pub async fn handle_message(
    state: &McpState,
    session: &Session,
    text: &str,
) -> Option<McpResponse> {
    // Parse the request
    let request: McpRequest = match serde_json::from_str(text) {
        Ok(req) => req,
        Err(e) => {
            // A parse failure before the handshake discards the session
            if session.state().await == SessionState::Connecting {
                session.begin_close().await;
            }
            return Some(McpResponse::error(
                None,
                McpError::ParseError(e.to_string()),
            ));
        }
    };

    let request_id = request.id.clone();

    // Dispatch based on method
    let result = match request.method.as_str() {
        methods::INITIALIZE => handle_initialize(state, session, &request).await,
        methods::INITIALIZED => {
            debug!(session_id = %session.id, "client confirmed initialization");
            return None;
        }
        methods::PING => {
            serde_json::to_value(PingResult {}).map_err(|e| McpError::InternalError(e.to_string()))
        }
        methods::TOOLS_LIST => {
            if session.is_active().await {
                handle_tools_list(state)
            } else {
                Err(McpError::InvalidRequest("session not initialized".to_string()))
            }
        }
        methods::TOOLS_CALL => {
            if session.is_active().await {
                handle_tools_call(state, &request).await
            } else {
                Err(McpError::InvalidRequest("session not initialized".to_string()))
            }
        }
        methods::SHUTDOWN => {
            info!(session_id = %session.id, "client requested shutdown");
            session.begin_close().await;
            Ok(serde_json::json!({}))
        }
        other => Err(McpError::MethodNotFound(other.to_string())),
    };

    match request_id {
        Some(id) => Some(match result {
            Ok(value) => McpResponse::success(id, value),
            Err(error) => McpResponse::error(Some(id), error),
        }),
        // Notifications get no reply; their failures surface with a null id
        None => match result {
            Ok(_) => None,
            Err(error) => Some(McpResponse::error(None, error)),
        },
    }
}

async fn handle_initialize(
    state: &McpState,
    session: &Session,
    request: &McpRequest,
) -> Result<serde_json::Value, McpError> {
    let params: InitializeParams = match parse_params(request) {
        Ok(params) => params,
        Err(e) => {
            // A handshake the server cannot read discards the session
            session.begin_close().await;
            return Err(e);
        }
    };

    if !session.activate().await {
        return Err(McpError::InvalidRequest(
            "session already initialized".to_string(),
        ));
    }

    session.set_client_info(params.client_info.clone()).await;

    if params.protocol_version != MCP_PROTOCOL_VERSION {
        debug!(
            client_protocol = %params.protocol_version,
            "client speaks a different protocol revision, answering with ours"
        );
    }

    info!(
        session_id = %session.id,
        client = %params.client_info.name,
        client_version = %params.client_info.version,
        "session initialized"
    );

    let result = InitializeResult {
        protocol_version: MCP_PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability { list_changed: None }),
        },
        server_info: ServerInfo {
            name: SERVER_NAME.to_string(),
            version: state.server_version.clone(),
        },
    };

    serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
}

fn handle_tools_list(state: &McpState) -> Result<serde_json::Value, McpError> {
    let result = ToolsListResult {
        tools: state.registry.list_tools(),
    };

    serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
}

async fn handle_tools_call(
    state: &McpState,
    request: &McpRequest,
) -> Result<serde_json::Value, McpError> {
    let params: super::protocol::ToolsCallParams = parse_params(request)?;

    // Absent arguments mean an empty object for no-argument tools
    let arguments = params
        .arguments
        .unwrap_or_else(|| serde_json::json!({}));

    let result = state
        .registry
        .invoke(state.tool_context(), &params.name, arguments)
        .await?;

    serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
}

fn parse_params<T: serde::de::DeserializeOwned>(request: &McpRequest) -> Result<T, McpError> {
    request
        .params
        .clone()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| McpError::InvalidParams(e.to_string()))?
        .ok_or_else(|| McpError::InvalidParams("missing params".to_string()))
}
