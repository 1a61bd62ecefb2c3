//! Test helper utilities for rest-harness unit tests
//!
//! Reusable fixtures shared across test modules.
//!
//! IMPORTANT: These helpers are test-only and should NEVER be used in production code.

// Allow dead code in test utilities - functions are used across different test files
#![allow(dead_code)]

use crate::config::HarnessConfig;
use std::time::Duration;

/// Create a harness configuration with fast timeouts suitable for tests.
///
/// The base URL points at a closed loopback port; unit tests exercising
/// real HTTP go through the integration tree instead.
pub fn create_test_config() -> HarnessConfig {
    HarnessConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        connection_timeout: Duration::from_millis(500),
        response_timeout: Duration::from_millis(1_000),
        retry_count: 3,
        base_retry_delay: Duration::from_millis(10),
        request_logging_enabled: true,
        response_logging_enabled: true,
        default_username: "qa.user@example.com".to_string(),
        default_password: "qa-password".to_string(),
        admin_username: None,
        admin_password: None,
    }
}
