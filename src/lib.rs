//! # rest-harness
//!
//! Resilient core for REST API test suites: retried HTTP execution, call
//! correlation, and a shared authentication token lifecycle.
//!
//! ## Key Features
//!
//! - **Resilient Execution**: bounded retry with linear backoff on server
//!   errors and transport failures; deterministic 4xx outcomes returned
//!   untouched for assertion
//! - **Call Correlation**: every request/response pair tagged with a
//!   per-test correlation ID, with suite-wide execution statistics
//! - **Token Lifecycle**: one shared credential with lazy, double-checked
//!   refresh; concurrent tests never trigger redundant logins
//! - **Cleanup Ledger**: test-created accounts registered once and deleted
//!   in a single teardown batch that never masks test outcomes
//!
//! ## Example
//!
//! ```rust,no_run
//! use rest_harness::{
//!     ApiRequest, ExecutionContext, HarnessConfig, HttpExecutor, RestAuthApi, StatsRegistry,
//!     TokenCache,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> rest_harness::HarnessResult<()> {
//! let config = Arc::new(HarnessConfig::from_env()?);
//! let auth = Arc::new(RestAuthApi::new(&config)?);
//! let tokens = Arc::new(TokenCache::new(auth, &config));
//! let executor = HttpExecutor::new(config, tokens)?;
//! let stats = StatsRegistry::new();
//!
//! let mut ctx = ExecutionContext::start("UserTest", "get_profile");
//! let outcome = executor
//!     .execute(&mut ctx, ApiRequest::get("/api/user/profile"))
//!     .await?;
//! assert!(outcome.is_success());
//! ctx.finish(&stats, true, None);
//! # Ok(())
//! # }
//! ```

// Allow missing errors documentation - errors are self-documenting via type signatures
#![allow(clippy::missing_errors_doc)]

pub mod auth;
pub mod cleanup;
pub mod config;
pub mod correlation;
pub mod error;
pub mod executor;
pub mod token;

// Logging utilities (re-exports tracing with log_* naming) - internal only
pub(crate) mod logging;
pub(crate) mod wire_log;

#[cfg(test)]
pub mod tests;

// Re-export main types
pub use auth::{AuthApi, LoginOutcome, LoginRequest, RestAuthApi};
pub use cleanup::{CleanupEntry, CleanupRegistry, CleanupSummary};
pub use config::HarnessConfig;
pub use correlation::{ExecutionContext, ExecutionStats, StatsRegistry, StatsSummary};
pub use error::{HarnessError, HarnessResult};
pub use executor::{ApiRequest, AuthMode, HttpExecutor, RequestOutcome};
pub use token::{Credential, TokenCache, DEFAULT_VALIDITY, EXPIRY_BUFFER};
