use crate::error::{HarnessError, HarnessResult};
use crate::logging::log_debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Harness-wide configuration for the environment under test.
///
/// Every value is read-only to the core once constructed; tests tune retry
/// behavior and logging verbosity here rather than through per-call
/// parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Base URL of the API under test, e.g. `https://qa.example.com`
    pub base_url: String,
    /// TCP connect timeout for every outbound call
    pub connection_timeout: Duration,
    /// Full-response timeout for every outbound call
    pub response_timeout: Duration,
    /// Total attempts per logical call (not additional retries)
    pub retry_count: u32,
    /// Base delay for linear backoff; attempt N sleeps `N * base_retry_delay`
    pub base_retry_delay: Duration,
    /// Emit full request dumps (headers and body, redacted)
    pub request_logging_enabled: bool,
    /// Emit full response dumps (status, headers, body, redacted)
    pub response_logging_enabled: bool,
    /// Default identity used for shared-token login
    pub default_username: String,
    pub default_password: String,
    /// Elevated identity for admin-only flows; falls back to the defaults
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            connection_timeout: Duration::from_millis(5_000),
            response_timeout: Duration::from_millis(10_000),
            retry_count: 3,
            base_retry_delay: Duration::from_millis(1_000),
            request_logging_enabled: true,
            response_logging_enabled: true,
            default_username: String::new(),
            default_password: String::new(),
            admin_username: None,
            admin_password: None,
        }
    }
}

impl HarnessConfig {
    /// Load configuration from environment variables.
    /// This is the ONLY method that should access environment variables.
    ///
    /// Recognized variables: `HARNESS_BASE_URL`, `HARNESS_USERNAME`,
    /// `HARNESS_PASSWORD`, `HARNESS_ADMIN_USERNAME`,
    /// `HARNESS_ADMIN_PASSWORD`, `HARNESS_RETRY_COUNT`,
    /// `HARNESS_BASE_RETRY_DELAY_MS`, `HARNESS_CONNECTION_TIMEOUT_MS`,
    /// `HARNESS_RESPONSE_TIMEOUT_MS`, `HARNESS_REQUEST_LOGGING`,
    /// `HARNESS_RESPONSE_LOGGING`. Unset variables keep their defaults;
    /// unparsable numeric or boolean values keep their defaults as well.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ConfigurationError`] if the resulting
    /// configuration fails [`validate()`](Self::validate).
    pub fn from_env() -> HarnessResult<Self> {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("HARNESS_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(username) = std::env::var("HARNESS_USERNAME") {
            config.default_username = username;
        }
        if let Ok(password) = std::env::var("HARNESS_PASSWORD") {
            config.default_password = password;
        }
        if let Ok(admin) = std::env::var("HARNESS_ADMIN_USERNAME") {
            config.admin_username = Some(admin);
        }
        if let Ok(admin) = std::env::var("HARNESS_ADMIN_PASSWORD") {
            config.admin_password = Some(admin);
        }
        if let Some(count) = Self::parse_env::<u32>("HARNESS_RETRY_COUNT") {
            config.retry_count = count;
        }
        if let Some(ms) = Self::parse_env::<u64>("HARNESS_BASE_RETRY_DELAY_MS") {
            config.base_retry_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = Self::parse_env::<u64>("HARNESS_CONNECTION_TIMEOUT_MS") {
            config.connection_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = Self::parse_env::<u64>("HARNESS_RESPONSE_TIMEOUT_MS") {
            config.response_timeout = Duration::from_millis(ms);
        }
        if let Some(enabled) = Self::parse_env::<bool>("HARNESS_REQUEST_LOGGING") {
            config.request_logging_enabled = enabled;
        }
        if let Some(enabled) = Self::parse_env::<bool>("HARNESS_RESPONSE_LOGGING") {
            config.response_logging_enabled = enabled;
        }

        config.validate()?;

        log_debug!(
            base_url = %config.base_url,
            retry_count = config.retry_count,
            connection_timeout_ms = config.connection_timeout.as_millis() as u64,
            response_timeout_ms = config.response_timeout.as_millis() as u64,
            request_logging = config.request_logging_enabled,
            response_logging = config.response_logging_enabled,
            "Harness configuration loaded and validated"
        );

        Ok(config)
    }

    /// Validate the configuration is complete.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ConfigurationError`] if:
    /// - `base_url` is empty
    /// - Default credentials are empty (the shared token cache needs them)
    /// - `retry_count` is zero
    pub fn validate(&self) -> HarnessResult<()> {
        if self.base_url.is_empty() {
            return Err(HarnessError::configuration_error(
                "Base URL is required",
            ));
        }
        if self.default_username.is_empty() || self.default_password.is_empty() {
            return Err(HarnessError::configuration_error(
                "Default credentials are required for token refresh",
            ));
        }
        if self.retry_count == 0 {
            return Err(HarnessError::configuration_error(
                "Retry count must be at least 1 (it counts total attempts)",
            ));
        }
        Ok(())
    }

    /// Admin identity, falling back to the default identity.
    pub fn admin_username(&self) -> &str {
        self.admin_username
            .as_deref()
            .unwrap_or(&self.default_username)
    }

    /// Admin password, falling back to the default password.
    pub fn admin_password(&self) -> &str {
        self.admin_password
            .as_deref()
            .unwrap_or(&self.default_password)
    }

    fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
        std::env::var(key).ok().and_then(|s| s.parse::<T>().ok())
    }
}
