//! Minimal authentication call path.
//!
//! The token cache refreshes by logging in, and the cleanup registry logs
//! in, resolves profiles, and deletes accounts. Routing those calls
//! through the full executor would make the executor depend on the cache
//! that depends on the executor; this module is the independent path that
//! breaks the cycle. It carries no retry loop and no correlation ID - it
//! is deliberately the smallest possible client.

use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::logging::log_debug;
use async_trait::async_trait;
use serde::Serialize;

/// Login endpoint of the API under test.
pub const SIGNIN_PATH: &str = "/auth/signin";
/// Profile endpoint; answers with the caller's numeric `id`.
pub const PROFILE_PATH: &str = "/api/user/profile";
/// Account collection; `DELETE {USER_PATH}/{id}` removes an account.
pub const USER_PATH: &str = "/api/user";

/// Wire shape of the login request body.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Result of a well-formed login exchange.
///
/// `jwt` is `Some` only for a 200 response carrying a non-empty `jwt`
/// field. A non-200 status is a normal outcome here, not an error; the
/// caller decides whether that is fatal (token refresh) or merely a
/// failed entry (cleanup).
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub status: u16,
    pub jwt: Option<String>,
}

/// The authentication surface of the API under test.
///
/// Implemented by [`RestAuthApi`] for real suites and mocked in unit
/// tests. All methods return `Err` only for transport or parsing
/// failures; HTTP-level rejections come back as values.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// POST the credentials to the signin endpoint.
    async fn login(&self, email: &str, password: &str) -> HarnessResult<LoginOutcome>;

    /// Resolve the numeric account ID behind `token`, if the profile
    /// endpoint answers 200.
    async fn fetch_profile_id(&self, token: &str) -> HarnessResult<Option<u64>>;

    /// Delete the account; true on 200/204.
    async fn delete_account(&self, token: &str, user_id: u64) -> HarnessResult<bool>;
}

/// reqwest-backed [`AuthApi`] honoring the configured timeouts.
#[derive(Debug, Clone)]
pub struct RestAuthApi {
    client: reqwest::Client,
    base_url: String,
}

impl RestAuthApi {
    /// Build the minimal client from harness configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ConfigurationError`] if the underlying
    /// HTTP client cannot be constructed.
    pub fn new(config: &HarnessConfig) -> HarnessResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connection_timeout)
            .timeout(config.response_timeout)
            .build()
            .map_err(|e| {
                HarnessError::configuration_error(format!("Failed to build HTTP client: {e}"))
            })?;

        log_debug!(
            base_url = %config.base_url,
            "Auth API client initialized"
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AuthApi for RestAuthApi {
    async fn login(&self, email: &str, password: &str) -> HarnessResult<LoginOutcome> {
        let url = format!("{}{}", self.base_url, SIGNIN_PATH);
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            HarnessError::transport_failed(format!("POST {SIGNIN_PATH}"), Some(Box::new(e)))
        })?;

        let status = response.status().as_u16();
        if status != 200 {
            return Ok(LoginOutcome { status, jwt: None });
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            HarnessError::response_parsing_error(format!("Login response was not JSON: {e}"))
        })?;
        let jwt = body
            .get("jwt")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(LoginOutcome { status, jwt })
    }

    async fn fetch_profile_id(&self, token: &str) -> HarnessResult<Option<u64>> {
        let url = format!("{}{}", self.base_url, PROFILE_PATH);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                HarnessError::transport_failed(format!("GET {PROFILE_PATH}"), Some(Box::new(e)))
            })?;

        if response.status().as_u16() != 200 {
            return Ok(None);
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            HarnessError::response_parsing_error(format!("Profile response was not JSON: {e}"))
        })?;
        Ok(body.get("id").and_then(|v| v.as_u64()))
    }

    async fn delete_account(&self, token: &str, user_id: u64) -> HarnessResult<bool> {
        let url = format!("{}{}/{}", self.base_url, USER_PATH, user_id);

        let response = self
            .client
            .delete(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                HarnessError::transport_failed(
                    format!("DELETE {USER_PATH}/{user_id}"),
                    Some(Box::new(e)),
                )
            })?;

        Ok(matches!(response.status().as_u16(), 200 | 204))
    }
}
