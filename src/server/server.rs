use anyhow::{Context, Result};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tracing::info;

use axum::{
    extract::State,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::sse::{messages_handler, sse_handler};
use super::{log_requests, session::SessionManager, state::ServerState, ServerConfig};
use crate::mcp::McpState;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub sessions: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        sessions: state.sessions.session_count().await,
    };
    Json(stats)
}

impl ServerState {
    fn new(config: ServerConfig, mcp_state: Arc<McpState>) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            sessions: Arc::new(SessionManager::new()),
            hash: env!("GIT_HASH").to_owned(),
            mcp_state,
        }
    }
}

pub fn make_app(config: ServerConfig, mcp_state: Arc<McpState>) -> Result<Router> {
    let state = ServerState::new(config, mcp_state);

    let mcp_routes: Router = Router::new()
        .route("/sse", get(sse_handler))
        .route("/messages", post(messages_handler))
        .with_state(state.clone());

    let home_router: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone());

    let app = home_router
        .merge(mcp_routes)
        .layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

pub async fn run_server(config: ServerConfig, mcp_state: Arc<McpState>) -> Result<()> {
    let bind_address = config.bind_address();
    let app = make_app(config, mcp_state)?;

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("Listening on {}", bind_address);

    Ok(axum::serve(listener, app).await?)
}
