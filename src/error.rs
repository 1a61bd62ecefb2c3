//! Error types for harness operations.
//!
//! This module provides structured error handling for rest-harness
//! operations, including categorization, severity levels, and retry
//! guidance.
//!
//! # Error Types
//!
//! The main error type is [`HarnessError`], which covers the failure modes
//! that surface as errors rather than as HTTP outcomes:
//! - Configuration errors (missing base URL, invalid settings)
//! - Transport failures (connection refused, timeouts, DNS)
//! - Token refresh failures (login rejected, credential missing)
//! - Response parsing failures (malformed body where one was required)
//!
//! Deterministic client errors (4xx) and exhausted server errors (5xx) are
//! NOT errors: they come back as a normal
//! [`RequestOutcome`](crate::executor::RequestOutcome) so tests can assert
//! on them directly.
//!
//! # Error Handling Example
//!
//! ```rust,no_run
//! use rest_harness::{HarnessError, HarnessResult};
//!
//! fn handle_error(err: HarnessError) {
//!     // Check if a retry loop should keep going
//!     if err.is_retryable() {
//!         println!("Retryable error: {}", err);
//!     }
//!
//!     // Check error category for routing
//!     match err.category() {
//!         rest_harness::error::ErrorCategory::Transient => {
//!             println!("Temporary issue, try again later");
//!         }
//!         rest_harness::error::ErrorCategory::Client => {
//!             println!("Fix the configuration and try again");
//!         }
//!         _ => {
//!             println!("Service issue, check the API under test");
//!         }
//!     }
//! }
//! ```
//!
//! # Result Type
//!
//! Use [`HarnessResult<T>`] as a convenient alias for
//! `Result<T, HarnessError>`:
//!
//! ```rust
//! use rest_harness::HarnessResult;
//!
//! fn my_function() -> HarnessResult<String> {
//!     Ok("Success".to_string())
//! }
//! ```

use crate::logging::{log_error, log_warn};
use thiserror::Error;

// ============================================================================
// Error categorization types
// ============================================================================

/// High-level categorization of errors for routing and handling decisions.
///
/// Use [`HarnessError::category()`] to get the category for any error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// External service failures (the API under test, network issues).
    ///
    /// The remote service or the path to it had an issue. May be transient
    /// or indicate an outage of the environment under test.
    External,

    /// Client errors (invalid input, configuration).
    ///
    /// The harness user made a mistake that they can fix (missing base
    /// URL, empty credentials, etc.).
    Client,

    /// Temporary failures that are retried inside the executor.
    ///
    /// Connection resets, timeouts, and other transient transport issues.
    Transient,
}

/// Severity level for logging and alerting decisions.
///
/// Use [`HarnessError::severity()`] to get the severity for any error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Action failed and the suite cannot meaningfully continue.
    ///
    /// A broken token or unreachable environment poisons every test that
    /// follows; investigate before re-running.
    Error,

    /// Unexpected but recoverable situation.
    ///
    /// Worth logging for monitoring but may not require action.
    Warning,
}

// ============================================================================
// Harness error types
// ============================================================================

/// Convenient result type for harness operations.
///
/// Alias for `Result<T, HarnessError>`. Use this throughout test support
/// code for consistent error handling.
pub type HarnessResult<T> = std::result::Result<T, HarnessError>;

/// Errors that can occur during harness operations.
///
/// This enum covers the conditions that propagate as errors. Each variant
/// can be:
/// - Categorized via [`category()`](Self::category)
/// - Assessed for severity via [`severity()`](Self::severity)
/// - Checked for retryability via [`is_retryable()`](Self::is_retryable)
///
/// # Creating Errors
///
/// Use the constructor methods which automatically log the error:
///
/// ```rust
/// use rest_harness::HarnessError;
///
/// // These methods log automatically
/// let err = HarnessError::configuration_error("Missing base URL");
/// let err = HarnessError::token_refresh_failed("login returned 401");
/// ```
///
/// # Error Categories
///
/// | Variant | Category | Retryable |
/// |---------|----------|-----------|
/// | `ConfigurationError` | Client | No |
/// | `TransportFailed` | Transient | Yes |
/// | `TokenRefreshFailed` | External | No |
/// | `ResponseParsingError` | External | No |
#[derive(Error, Debug)]
pub enum HarnessError {
    /// Harness configuration is invalid or incomplete.
    ///
    /// Common causes:
    /// - Missing base URL for the environment under test
    /// - Empty default credentials
    /// - A retry count of zero
    #[error("Harness configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration problem.
        message: String,
    },

    /// The HTTP call produced no response at all.
    ///
    /// Connection refused, timeout, DNS failure. Retried inside the
    /// executor; raised only once the retry budget is exhausted, carrying
    /// the operation description (`"METHOD path"`) and the original cause.
    #[error("Transport failure during {operation}")]
    TransportFailed {
        /// The operation that failed, e.g. `"POST /auth/signin"`.
        operation: String,
        /// The underlying error, if available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The shared authentication token could not be refreshed.
    ///
    /// Login returned a non-200 status, or a 200 without the credential
    /// field. Always fatal to the caller: caching a broken token is
    /// categorically worse than failing fast.
    #[error("Token refresh failed: {message}")]
    TokenRefreshFailed {
        /// Details about the refresh failure.
        message: String,
    },

    /// Failed to parse a response body that a flow required.
    ///
    /// The service answered, but the body couldn't be read as the
    /// expected JSON shape.
    #[error("Response parsing failed: {message}")]
    ResponseParsingError {
        /// Details about the parsing failure.
        message: String,
    },
}

impl HarnessError {
    /// Get the error category for routing and handling decisions.
    ///
    /// - `Client`: fix the harness configuration
    /// - `External`: environment-under-test issue, needs follow-up
    /// - `Transient`: already retried by the executor
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigurationError { .. } => ErrorCategory::Client,
            Self::TransportFailed { .. } => ErrorCategory::Transient,
            Self::TokenRefreshFailed { .. } => ErrorCategory::External,
            Self::ResponseParsingError { .. } => ErrorCategory::External,
        }
    }

    /// Get the error severity for logging and alerting.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ConfigurationError { .. } => ErrorSeverity::Error,
            Self::TransportFailed { .. } => ErrorSeverity::Error,
            Self::TokenRefreshFailed { .. } => ErrorSeverity::Error,
            Self::ResponseParsingError { .. } => ErrorSeverity::Warning,
        }
    }

    /// Whether this error is transient and should trigger a retry.
    ///
    /// Only transport failures qualify; the executor's retry loop uses
    /// this, and everything else fails fast.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransportFailed { .. })
    }

    // =========================================================================
    // Constructor methods with automatic logging
    // =========================================================================
    //
    // These methods automatically log the error at the appropriate level.
    // Use them instead of constructing variants directly.

    pub fn configuration_error(message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "configuration_error",
            message = %message,
            "Harness configuration validation failed"
        );
        Self::ConfigurationError { message }
    }

    pub fn transport_failed(
        operation: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        let operation = operation.into();
        log_error!(
            error_type = "transport_failed",
            operation = %operation,
            has_source = source.is_some(),
            "HTTP call produced no response"
        );
        Self::TransportFailed { operation, source }
    }

    pub fn token_refresh_failed(message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "token_refresh_failed",
            message = %message,
            "Authentication token refresh failed"
        );
        Self::TokenRefreshFailed { message }
    }

    pub fn response_parsing_error(message: impl Into<String>) -> Self {
        let message = message.into();
        log_warn!(
            error_type = "response_parsing_error",
            message = %message,
            "Response body format invalid"
        );
        Self::ResponseParsingError { message }
    }
}
