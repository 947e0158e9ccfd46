//! MCP session tracking.
//!
//! A session is one client connection, regardless of transport. It owns the
//! outgoing message channel and the lifecycle state; transports drain the
//! channel while request dispatch pushes into it from concurrently running
//! invocation tasks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::mcp::protocol::{ClientInfo, McpResponse};

/// Outgoing channel depth per session. Dispatch backpressures on a slow
/// transport instead of buffering unboundedly.
const SESSION_CHANNEL_SIZE: usize = 32;

/// Session lifecycle. Transitions only move forward:
/// connecting -> active -> closing -> closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport established, handshake not yet completed.
    Connecting,
    /// Handshake completed, tool calls accepted.
    Active,
    /// Teardown requested, queued responses still flushing.
    Closing,
    /// Terminal. The id is never reused.
    Closed,
}

/// Message pushed to a session's transport.
#[derive(Debug)]
pub enum SessionMessage {
    /// A response to deliver to the client.
    Response(McpResponse),
    /// Tells the transport to terminate its stream after the messages
    /// queued before this one.
    EndOfStream,
}

/// One client session.
pub struct Session {
    pub id: Uuid,
    pub created_at: Instant,
    sender: mpsc::Sender<SessionMessage>,
    state: RwLock<SessionState>,
    client: RwLock<Option<ClientInfo>>,
}

impl Session {
    pub async fn state(&self) -> SessionState {
        *self.state.read().await
    }

    /// Record who is on the other end, from the handshake params.
    pub async fn set_client_info(&self, info: ClientInfo) {
        *self.client.write().await = Some(info);
    }

    pub async fn client_info(&self) -> Option<ClientInfo> {
        self.client.read().await.clone()
    }

    pub async fn is_active(&self) -> bool {
        *self.state.read().await == SessionState::Active
    }

    /// Complete the handshake. Returns false if the session already moved
    /// past connecting, in which case the caller must not re-initialize.
    pub async fn activate(&self) -> bool {
        let mut state = self.state.write().await;
        if *state == SessionState::Connecting {
            *state = SessionState::Active;
            true
        } else {
            false
        }
    }

    /// Begin teardown. In-flight invocations keep running; their results
    /// are discarded once the transport stream has ended.
    pub async fn begin_close(&self) {
        let mut state = self.state.write().await;
        if *state != SessionState::Closed {
            *state = SessionState::Closing;
        }
    }

    pub async fn mark_closed(&self) {
        *self.state.write().await = SessionState::Closed;
    }

    /// Deliver a response to the transport. When the client is gone the
    /// channel is closed and the response is discarded, never redelivered.
    pub async fn send(&self, response: McpResponse) {
        if self
            .sender
            .send(SessionMessage::Response(response))
            .await
            .is_err()
        {
            debug!(session_id = %self.id, "session channel closed, response discarded");
        }
    }

    /// Ask the transport to finish its stream once the queued messages
    /// have been flushed.
    pub async fn finish_stream(&self) {
        let _ = self.sender.send(SessionMessage::EndOfStream).await;
    }
}

/// Tracks all live sessions by id.
pub struct SessionManager {
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new session in the connecting state.
    ///
    /// Returns the session and the receiver for its outgoing messages. The
    /// caller forwards messages from this receiver to the transport.
    pub async fn register(&self) -> (Arc<Session>, mpsc::Receiver<SessionMessage>) {
        let (tx, rx) = mpsc::channel(SESSION_CHANNEL_SIZE);

        let session = Arc::new(Session {
            id: Uuid::new_v4(),
            created_at: Instant::now(),
            sender: tx,
            state: RwLock::new(SessionState::Connecting),
            client: RwLock::new(None),
        });

        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());

        (session, rx)
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<Session>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Unregister a session (called when its transport stream ends).
    ///
    /// The session is marked closed so concurrently running invocation
    /// tasks stop accepting follow-up work.
    pub async fn unregister(&self, id: &Uuid) {
        let removed = self.sessions.write().await.remove(id);
        if let Some(session) = removed {
            session.mark_closed().await;
            let client = session
                .client_info()
                .await
                .map(|c| format!("{} {}", c.name, c.version))
                .unwrap_or_else(|| "unidentified client".to_string());
            debug!(
                session_id = %id,
                client = %client,
                "session closed after {:?}",
                session.created_at.elapsed()
            );
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
