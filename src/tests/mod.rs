// Test modules for rest-harness crate
//
// Test organization follows the template pattern where each source file
// has a corresponding test file that focuses on business logic verification.

// Test helper utilities
pub mod helpers;

// Core unit tests
pub mod cleanup;
pub mod error;

// NOTE: Executor tests live in the integration tree (tests/executor_integration_tests.rs)
// They need a live wiremock server on the loopback interface, so they don't
// belong in unit tests
