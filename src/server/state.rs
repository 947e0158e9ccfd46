use axum::extract::FromRef;

use crate::mcp::McpState;
use std::sync::Arc;
use std::time::Instant;

use super::session::SessionManager;
use super::ServerConfig;

pub type GuardedMcpState = Arc<McpState>;
pub type GuardedSessionManager = Arc<SessionManager>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub sessions: GuardedSessionManager,
    pub hash: String,
    pub mcp_state: GuardedMcpState,
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedSessionManager {
    fn from_ref(input: &ServerState) -> Self {
        input.sessions.clone()
    }
}

impl FromRef<ServerState> for GuardedMcpState {
    fn from_ref(input: &ServerState) -> Self {
        input.mcp_state.clone()
    }
}
