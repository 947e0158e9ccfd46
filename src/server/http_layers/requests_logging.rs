//! Request logging middleware.
//!
//! Logs the incoming side of each HTTP exchange at a configurable level of
//! detail. Responses on this server are either tiny acknowledgements or
//! SSE streams, so only request bodies are ever captured.

use super::super::state::ServerState;
use axum::extract::State;
use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;
use tracing::{info, warn};

#[derive(PartialEq, PartialOrd, Clone, Debug, clap::ValueEnum)]
pub enum RequestsLoggingLevel {
    None,
    Path,
    Headers,
    Body,
}

impl Default for RequestsLoggingLevel {
    fn default() -> Self {
        Self::Path
    }
}

impl std::fmt::Display for RequestsLoggingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Bodies above this size are reported by size only.
const MAX_LOGGABLE_BODY_LENGTH: usize = 4096;

/// The declared body size, when it is known and small enough to capture.
fn body_capture_size(headers: &HeaderMap) -> Option<usize> {
    let size = headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse::<usize>()
        .ok()?;
    (size <= MAX_LOGGABLE_BODY_LENGTH).then_some(size)
}

/// Reads the request body for logging and rebuilds the request around the
/// buffered bytes so the inner handler still sees it.
async fn log_request_body(request: Request<Body>, size: usize) -> Result<Request<Body>, Response> {
    let (parts, body) = request.into_parts();
    match axum::body::to_bytes(body, size).await {
        Ok(bytes) => {
            info!("  body: {}", String::from_utf8_lossy(&bytes));
            Ok(Request::from_parts(parts, Body::from(bytes)))
        }
        Err(e) => {
            warn!("Failed to read request body for logging: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}

pub async fn log_requests(
    State(state): State<ServerState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let level = state.config.requests_logging_level.clone();
    if level == RequestsLoggingLevel::None {
        return next.run(request).await;
    }

    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    info!(">>> {} {}", method, uri);

    if level >= RequestsLoggingLevel::Headers {
        for (name, value) in request.headers() {
            info!("  {}: {:?}", name, value);
        }
    }

    let request = if level >= RequestsLoggingLevel::Body {
        match body_capture_size(request.headers()) {
            Some(size) => match log_request_body(request, size).await {
                Ok(request) => request,
                Err(response) => return response,
            },
            None => {
                info!("  body: not captured (missing or oversized content-length)");
                request
            }
        }
    } else {
        request
    };

    let response = next.run(request).await;

    info!(
        "<<< {} {} {} ({}ms)",
        method,
        uri,
        response.status().as_u16(),
        start.elapsed().as_millis()
    );

    response
}
