//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{tool_json, TestClient, TestServer};
//!
//! #[tokio::test]
//! async fn test_site_info() {
//!     let server = TestServer::spawn().await;
//!     let mut client = TestClient::initialized(server.base_url.clone()).await;
//!
//!     let response = client.call_tool("site.info", serde_json::json!({})).await;
//!     assert_eq!(tool_json(&response)["site"]["title"], "Mock Ghost");
//! }
//! ```

mod client;
mod constants;
mod ghost_mock;

// Public API - this is what tests import
#[allow(unused_imports)]
pub use client::{tool_error_text, tool_json, SseEvent, TestClient};
#[allow(unused_imports)]
pub use constants::*;
pub use server::TestServer;
