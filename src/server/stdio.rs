//! Stdio transport: newline-delimited JSON-RPC on stdin/stdout.
//!
//! One session spans the whole process lifetime. Each stdin line is handled
//! concurrently, so a slow tool call does not hold up the next one; responses
//! are written to stdout in completion order, one JSON object per line.

use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use super::session::{SessionManager, SessionMessage, SessionState};
use crate::mcp::{dispatch_message, McpState};

pub async fn run_stdio(mcp_state: Arc<McpState>) -> Result<()> {
    let sessions = Arc::new(SessionManager::new());
    let (session, mut rx) = sessions.register().await;
    info!("stdio transport ready, session {}", session.id);

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(message) = rx.recv().await {
            match message {
                SessionMessage::Response(response) => match serde_json::to_string(&response) {
                    Ok(mut line) => {
                        line.push('\n');
                        if stdout.write_all(line.as_bytes()).await.is_err() {
                            break;
                        }
                        if stdout.flush().await.is_err() {
                            break;
                        }
                    }
                    Err(e) => error!("Failed to serialize response for stdout: {}", e),
                },
                SessionMessage::EndOfStream => break,
            }
        }
    });

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    while let Some(line) = lines.next_line().await? {
        match session.state().await {
            SessionState::Connecting | SessionState::Active => {}
            SessionState::Closing | SessionState::Closed => break,
        }
        if line.trim().is_empty() {
            continue;
        }
        tokio::spawn(dispatch_message(mcp_state.clone(), session.clone(), line));
    }

    debug!("stdin closed, shutting down stdio session");
    sessions.unregister(&session.id).await;
    session.finish_stream().await;
    let _ = writer.await;
    Ok(())
}
