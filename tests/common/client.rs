//! MCP client for end-to-end tests
//!
//! This module provides a client that speaks the SSE transport the way a
//! real MCP client would: it opens the event stream, reads the endpoint
//! event, POSTs JSON-RPC messages and correlates responses by id.
//!
//! When the wire format changes, update only this file.

use super::constants::*;
use futures::StreamExt;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::mpsc;

/// One parsed event from the SSE stream.
#[derive(Debug, Clone)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

/// Extracts events from a buffer of raw SSE bytes. Frames are separated by a
/// blank line; comment lines (keep-alives) are ignored.
fn parse_sse_frame(frame: &str) -> Option<SseEvent> {
    let mut event = String::new();
    let mut data = String::new();
    for line in frame.lines() {
        if let Some(rest) = line.strip_prefix("event:") {
            event = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(rest.strip_prefix(' ').unwrap_or(rest));
        }
        // Lines starting with ':' are comments, ignore them
    }
    if event.is_empty() && data.is_empty() {
        return None;
    }
    Some(SseEvent { event, data })
}

/// MCP test client connected over SSE
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    /// Where JSON-RPC messages are POSTed, as announced by the endpoint event
    pub messages_url: String,
    events: mpsc::UnboundedReceiver<SseEvent>,
    pending: VecDeque<Value>,
    reader: tokio::task::JoinHandle<()>,
    next_id: i64,
}

impl TestClient {
    /// Opens the SSE stream and waits for the endpoint event.
    ///
    /// # Panics
    ///
    /// Panics if the stream cannot be opened or the endpoint event does not
    /// arrive in time (indicates test infrastructure problem).
    pub async fn connect(base_url: String) -> Self {
        // No overall timeout: the SSE response body outlives any single call
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        let response = client
            .get(format!("{}/sse", base_url))
            .send()
            .await
            .expect("SSE connect failed");
        assert_eq!(response.status(), StatusCode::OK);

        let (tx, events) = mpsc::unbounded_channel();
        let reader = tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut buffer = String::new();
            while let Some(chunk) = stream.next().await {
                let Ok(chunk) = chunk else { break };
                buffer.push_str(&String::from_utf8_lossy(&chunk));
                while let Some(pos) = buffer.find("\n\n") {
                    let frame: String = buffer.drain(..pos + 2).collect();
                    if let Some(event) = parse_sse_frame(frame.trim_end()) {
                        if tx.send(event).is_err() {
                            return;
                        }
                    }
                }
            }
        });

        let mut this = Self {
            client,
            base_url,
            messages_url: String::new(),
            events,
            pending: VecDeque::new(),
            reader,
            next_id: 0,
        };

        let endpoint = this.next_event().await;
        assert_eq!(endpoint.event, "endpoint", "First event must name the endpoint");
        this.messages_url = format!("{}{}", this.base_url, endpoint.data);
        this
    }

    /// Connects and runs the initialize handshake.
    pub async fn initialized(base_url: String) -> Self {
        let mut client = Self::connect(base_url).await;
        let response = client
            .request(
                "initialize",
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {"name": "e2e-tests", "version": "0.0.0"},
                }),
            )
            .await;
        assert!(
            response.get("result").is_some(),
            "initialize failed: {}",
            response
        );
        client.notify("notifications/initialized", None).await;
        client
    }

    fn make_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// POSTs a raw JSON-RPC body. Asserts the transport accepted it.
    pub async fn post_message(&self, body: &Value) {
        let response = self
            .client
            .post(&self.messages_url)
            .json(body)
            .send()
            .await
            .expect("POST /messages failed");
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    /// POSTs a raw string body, returning the transport status code.
    pub async fn post_raw(&self, body: &str) -> StatusCode {
        self.client
            .post(&self.messages_url)
            .body(body.to_string())
            .send()
            .await
            .expect("POST /messages failed")
            .status()
    }

    /// Sends a request and returns its id without waiting for the response.
    pub async fn send_request(&mut self, method: &str, params: Value) -> i64 {
        let id = self.make_id();
        self.post_message(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        }))
        .await;
        id
    }

    /// Sends a notification (no id, so no response is expected).
    pub async fn notify(&self, method: &str, params: Option<Value>) {
        let mut body = json!({
            "jsonrpc": "2.0",
            "method": method,
        });
        if let Some(params) = params {
            body["params"] = params;
        }
        self.post_message(&body).await;
    }

    /// Sends a request and waits for its response.
    pub async fn request(&mut self, method: &str, params: Value) -> Value {
        let id = self.send_request(method, params).await;
        self.response_for(json!(id)).await
    }

    /// Calls a tool and returns the full JSON-RPC response.
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Value {
        self.request("tools/call", json!({"name": name, "arguments": arguments}))
            .await
    }

    /// Next event of any kind from the stream.
    pub async fn next_event(&mut self) -> SseEvent {
        tokio::time::timeout(
            Duration::from_millis(RESPONSE_TIMEOUT_MS),
            self.events.recv(),
        )
        .await
        .expect("Timed out waiting for SSE event")
        .expect("SSE stream closed")
    }

    /// Next JSON-RPC message from the stream, in arrival order.
    pub async fn next_message(&mut self) -> Value {
        if let Some(message) = self.pending.pop_front() {
            return message;
        }
        loop {
            let event = self.next_event().await;
            if event.event == "message" {
                return serde_json::from_str(&event.data).expect("Message event is not JSON");
            }
        }
    }

    /// Reads messages until the one correlated to `id` arrives. Messages for
    /// other requests are kept for later calls.
    pub async fn response_for(&mut self, id: Value) -> Value {
        if let Some(index) = self.pending.iter().position(|m| m["id"] == id) {
            return self.pending.remove(index).unwrap();
        }
        loop {
            let message = self.next_message().await;
            if message["id"] == id {
                return message;
            }
            self.pending.push_back(message);
        }
    }

    /// Waits for the server to end the SSE stream.
    pub async fn wait_for_stream_end(&mut self) {
        tokio::time::timeout(Duration::from_millis(RESPONSE_TIMEOUT_MS), async {
            while self.events.recv().await.is_some() {}
        })
        .await
        .expect("SSE stream did not end in time");
    }

    /// Drops the SSE connection, simulating a client disconnect.
    pub fn disconnect(&self) {
        self.reader.abort();
    }
}

impl Drop for TestClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Digs the tool payload out of a tools/call response. Asserts the call
/// succeeded at the MCP level and was not flagged as a tool failure.
pub fn tool_json(response: &Value) -> Value {
    let result = &response["result"];
    assert!(
        !result["isError"].as_bool().unwrap_or(false),
        "Tool call failed: {}",
        response
    );
    let text = result["content"][0]["text"]
        .as_str()
        .expect("Tool result carries no text content");
    serde_json::from_str(text).expect("Tool result text is not JSON")
}

/// Digs the error text out of a failed tools/call response.
pub fn tool_error_text(response: &Value) -> String {
    let result = &response["result"];
    assert!(
        result["isError"].as_bool().unwrap_or(false),
        "Expected a tool failure, got: {}",
        response
    );
    result["content"][0]["text"]
        .as_str()
        .expect("Tool error carries no text content")
        .to_string()
}
