//! Test helper utilities for rest-harness integration tests
//!
//! This module provides reusable fixtures shared across the integration
//! test files.
//!
//! IMPORTANT: These helpers are test-only and should NEVER be used in production code.

// Allow dead code in test utilities - functions are used across different test files
#![allow(dead_code)]

use rest_harness::{HarnessConfig, HttpExecutor, RestAuthApi, TokenCache};
use std::sync::Arc;
use std::time::Duration;

/// Default test identity used by token refresh in the integration tests.
pub const TEST_USERNAME: &str = "qa.user@example.com";
pub const TEST_PASSWORD: &str = "qa-password";

/// Create a harness configuration pointing at a wiremock server, with
/// fast retry delays so exhaustion tests stay quick.
pub fn create_test_config(base_url: &str) -> HarnessConfig {
    HarnessConfig {
        base_url: base_url.to_string(),
        connection_timeout: Duration::from_millis(2_000),
        response_timeout: Duration::from_millis(2_000),
        retry_count: 3,
        base_retry_delay: Duration::from_millis(50),
        request_logging_enabled: true,
        response_logging_enabled: true,
        default_username: TEST_USERNAME.to_string(),
        default_password: TEST_PASSWORD.to_string(),
        admin_username: None,
        admin_password: None,
    }
}

/// Wire up the full executor stack against a wiremock server.
pub fn create_test_executor(base_url: &str) -> (Arc<HarnessConfig>, Arc<TokenCache>, HttpExecutor) {
    let config = Arc::new(create_test_config(base_url));
    let auth = Arc::new(RestAuthApi::new(&config).expect("auth client should build"));
    let tokens = Arc::new(TokenCache::new(auth, &config));
    let executor =
        HttpExecutor::new(config.clone(), tokens.clone()).expect("executor should build");
    (config, tokens, executor)
}

/// Unique email so parallel tests never collide on identity.
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{:08x}@example.com", fastrand::u32(..))
}
