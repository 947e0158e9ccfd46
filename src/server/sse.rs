//! SSE transport routes.
//!
//! A client opens `GET /sse` and receives an `endpoint` event naming the URL
//! it should POST its JSON-RPC messages to, bound to a fresh session id.
//! Everything the session produces afterwards arrives on the same stream as
//! `message` events. `POST /messages` only acknowledges receipt; the actual
//! response is delivered over SSE once the handler finishes.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::session::{SessionMessage, SessionState};
use super::state::{GuardedSessionManager, ServerState};
use crate::mcp::dispatch_message;

const KEEP_ALIVE_INTERVAL_SECS: u64 = 15;

#[derive(Deserialize)]
pub struct MessagesQuery {
    session_id: Uuid,
}

/// Unregisters the session when the SSE stream goes away, no matter whether
/// the stream ended on its own or the client dropped the connection.
struct SessionCleanup {
    sessions: GuardedSessionManager,
    session_id: Uuid,
}

impl Drop for SessionCleanup {
    fn drop(&mut self) {
        let sessions = self.sessions.clone();
        let session_id = self.session_id;
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                sessions.unregister(&session_id).await;
            });
        }
    }
}

pub async fn sse_handler(
    State(state): State<ServerState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (session, rx) = state.sessions.register().await;
    info!("SSE client connected, session {}", session.id);

    let endpoint = format!("/messages?session_id={}", session.id);
    let cleanup = SessionCleanup {
        sessions: state.sessions.clone(),
        session_id: session.id,
    };

    let handshake =
        stream::once(async move { Ok(Event::default().event("endpoint").data(endpoint)) });

    let responses = stream::unfold((rx, cleanup), |(mut rx, cleanup)| async move {
        loop {
            match rx.recv().await {
                Some(SessionMessage::Response(response)) => {
                    match serde_json::to_string(&response) {
                        Ok(json) => {
                            let event = Event::default().event("message").data(json);
                            return Some((Ok(event), (rx, cleanup)));
                        }
                        Err(e) => error!("Failed to serialize response for SSE: {}", e),
                    }
                }
                Some(SessionMessage::EndOfStream) | None => return None,
            }
        }
    });

    Sse::new(handshake.chain(responses))
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(KEEP_ALIVE_INTERVAL_SECS)))
}

pub async fn messages_handler(
    State(state): State<ServerState>,
    Query(query): Query<MessagesQuery>,
    body: String,
) -> StatusCode {
    let Some(session) = state.sessions.get(&query.session_id).await else {
        debug!("message for unknown session {}", query.session_id);
        return StatusCode::NOT_FOUND;
    };

    match session.state().await {
        SessionState::Closing | SessionState::Closed => {
            debug!("message for closed session {}", query.session_id);
            StatusCode::GONE
        }
        SessionState::Connecting | SessionState::Active => {
            tokio::spawn(dispatch_message(state.mcp_state.clone(), session, body));
            StatusCode::ACCEPTED
        }
    }
}
