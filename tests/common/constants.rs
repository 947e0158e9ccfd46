//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.

// ============================================================================
// Credentials and protocol
// ============================================================================

/// Admin API key the test server is configured with. The mock backend accepts
/// any well-signed token, it only checks the Authorization scheme.
pub const TEST_ADMIN_KEY: &str = "64f1c1d9a8b3e207:0123456789abcdef0123456789abcdef";

/// Protocol revision the server speaks.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Number of tools the server exposes.
pub const TOOL_COUNT: usize = 16;

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Maximum time to wait for a response on the SSE stream (milliseconds)
pub const RESPONSE_TIMEOUT_MS: u64 = 5000;

/// Backend delay used to keep an invocation in flight (milliseconds)
pub const SLOW_BACKEND_DELAY_MS: u64 = 400;
