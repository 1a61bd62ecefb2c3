//! Resilient HTTP execution against the API under test.
//!
//! [`HttpExecutor`] wraps one logical call with correlation tracking,
//! redacted request/response logging, and bounded retry: server errors
//! (5xx) and transport failures are retried with linear backoff, while
//! anything below 500 is a terminal outcome the test asserts against.
//!
//! Per call the state machine is
//! `Attempting -> {Succeeded | Deterministic4xxReturned |
//! RetryScheduled -> Attempting | ExhaustedFailure}`: a 2xx/3xx/4xx ends
//! the loop immediately, an exhausted 5xx run still returns the last
//! outcome as a value, and only a run that never produced any response
//! raises [`HarnessError::TransportFailed`].

use crate::config::HarnessConfig;
use crate::correlation::ExecutionContext;
use crate::error::{HarnessError, HarnessResult};
use crate::logging::{log_error, log_info, log_warn};
use crate::token::TokenCache;
use crate::wire_log;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// How the Authorization header for a call is resolved.
#[derive(Debug, Clone, Default)]
pub enum AuthMode {
    /// Bearer token from the shared [`TokenCache`] (refreshing if needed).
    #[default]
    CachedBearer,
    /// Explicit bearer token, e.g. one minted by the test's own signup.
    Bearer(String),
    /// No Authorization header; for negative-path auth tests.
    Unauthenticated,
}

/// One logical request: method, path, optional JSON body, query pairs,
/// and the auth mode. Paths are relative to the configured base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub query: Vec<(String, String)>,
    pub auth: AuthMode,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            query: Vec::new(),
            auth: AuthMode::default(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        let mut request = Self::new(Method::POST, path);
        request.body = Some(body);
        request
    }

    pub fn put(path: impl Into<String>, body: serde_json::Value) -> Self {
        let mut request = Self::new(Method::PUT, path);
        request.body = Some(body);
        request
    }

    pub fn patch(path: impl Into<String>, body: serde_json::Value) -> Self {
        let mut request = Self::new(Method::PATCH, path);
        request.body = Some(body);
        request
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Use an explicit bearer token instead of the shared cache.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthMode::Bearer(token.into());
        self
    }

    /// Send without an Authorization header.
    pub fn unauthenticated(mut self) -> Self {
        self.auth = AuthMode::Unauthenticated;
        self
    }

    /// `"METHOD path"` description used in logs and transport errors.
    fn operation(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Normalized result of one logical call.
///
/// Immutable once produced. 4xx and exhausted 5xx land here too - the
/// caller asserts on `status` rather than catching errors.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub status: u16,
    pub body: String,
    pub duration: Duration,
    /// Wire attempts actually made, including the final one.
    pub attempts: u32,
}

impl RequestOutcome {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }

    /// Parse the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ResponseParsingError`] when the body is
    /// not valid JSON.
    pub fn json(&self) -> HarnessResult<serde_json::Value> {
        serde_json::from_str(&self.body).map_err(|e| {
            HarnessError::response_parsing_error(format!("Response body was not JSON: {e}"))
        })
    }
}

/// Executes logical HTTP calls with retry, correlation, and logging.
///
/// One executor is shared by all clients of a suite; it owns the pooled
/// HTTP client and consults the shared [`TokenCache`] for the
/// Authorization header value.
pub struct HttpExecutor {
    client: reqwest::Client,
    config: Arc<HarnessConfig>,
    tokens: Arc<TokenCache>,
    base_url: String,
}

impl HttpExecutor {
    /// Build an executor from configuration and the shared token cache.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ConfigurationError`] if the underlying
    /// HTTP client cannot be constructed.
    pub fn new(config: Arc<HarnessConfig>, tokens: Arc<TokenCache>) -> HarnessResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connection_timeout)
            .timeout(config.response_timeout)
            .build()
            .map_err(|e| {
                HarnessError::configuration_error(format!("Failed to build HTTP client: {e}"))
            })?;
        let base_url = config.base_url.trim_end_matches('/').to_string();

        Ok(Self {
            client,
            config,
            tokens,
            base_url,
        })
    }

    /// Execute one logical call with retry on 5xx and transport failures.
    ///
    /// Makes at most `retry_count` attempts in total, sleeping
    /// `attempt * base_retry_delay` between them (linear backoff). A
    /// status below 500 is terminal and returned immediately; an
    /// exhausted 5xx run returns the last outcome rather than raising.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::TransportFailed`] only when no attempt
    /// ever produced a response, wrapping the final cause and the
    /// operation description. Token resolution errors from the cache
    /// propagate unchanged.
    pub async fn execute(
        &self,
        ctx: &mut ExecutionContext,
        request: ApiRequest,
    ) -> HarnessResult<RequestOutcome> {
        let correlation_id = ctx.register_call();
        let operation = request.operation();
        let headers = self.build_headers(&request).await?;

        wire_log::log_request(
            &correlation_id,
            request.method.as_str(),
            &request.path,
            &headers,
            request.body.as_ref(),
            self.config.request_logging_enabled,
        );

        let started = Instant::now();
        let max_attempts = self.config.retry_count;
        let mut last_server_error: Option<(u16, String)> = None;
        let mut last_transport_error: Option<reqwest::Error> = None;

        for attempt in 1..=max_attempts {
            match self.attempt(&request, &headers).await {
                Ok((status, body)) => {
                    if status < 500 {
                        let outcome = RequestOutcome {
                            status,
                            body,
                            duration: started.elapsed(),
                            attempts: attempt,
                        };
                        self.log_terminal(&correlation_id, &operation, &outcome);
                        return Ok(outcome);
                    }

                    if attempt < max_attempts {
                        let reason = wire_log::extract_error_message(status, &body);
                        wire_log::log_retry(
                            &correlation_id,
                            &operation,
                            attempt,
                            max_attempts,
                            status,
                            &reason,
                        );
                    }
                    last_server_error = Some((status, body));
                }
                Err(error) => {
                    wire_log::log_transport_failure(&correlation_id, &operation, &error);
                    if attempt < max_attempts {
                        log_warn!(
                            correlation_id = %correlation_id,
                            attempt = attempt,
                            max_attempts = max_attempts,
                            "Retrying after transport failure"
                        );
                    }
                    last_transport_error = Some(error);
                }
            }

            if attempt < max_attempts {
                sleep(self.config.base_retry_delay * attempt).await;
            }
        }

        // Prefer any well-formed response over the transport error, even
        // if a later attempt failed without one.
        if let Some((status, body)) = last_server_error {
            let outcome = RequestOutcome {
                status,
                body,
                duration: started.elapsed(),
                attempts: max_attempts,
            };
            wire_log::log_response(
                &correlation_id,
                outcome.status,
                outcome.duration,
                &outcome.body,
                self.config.response_logging_enabled,
            );
            log_error!(
                correlation_id = %correlation_id,
                operation = %operation,
                status = outcome.status,
                attempts = max_attempts,
                "Request failed after all retry attempts"
            );
            return Ok(outcome);
        }

        Err(HarnessError::transport_failed(
            format!("{operation} failed after {max_attempts} attempts"),
            last_transport_error
                .map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        ))
    }

    /// Execute one call with a single attempt, no retry.
    ///
    /// For negative-path tests that expect an error status and should not
    /// pay retry latency; any status, including 5xx, comes back as the
    /// outcome.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::TransportFailed`] immediately when the
    /// attempt produces no response.
    pub async fn execute_once(
        &self,
        ctx: &mut ExecutionContext,
        request: ApiRequest,
    ) -> HarnessResult<RequestOutcome> {
        let correlation_id = ctx.register_call();
        let operation = request.operation();
        let headers = self.build_headers(&request).await?;

        wire_log::log_request(
            &correlation_id,
            request.method.as_str(),
            &request.path,
            &headers,
            request.body.as_ref(),
            self.config.request_logging_enabled,
        );

        let started = Instant::now();
        match self.attempt(&request, &headers).await {
            Ok((status, body)) => {
                let outcome = RequestOutcome {
                    status,
                    body,
                    duration: started.elapsed(),
                    attempts: 1,
                };
                self.log_terminal(&correlation_id, &operation, &outcome);
                Ok(outcome)
            }
            Err(error) => {
                wire_log::log_transport_failure(&correlation_id, &operation, &error);
                Err(HarnessError::transport_failed(
                    operation,
                    Some(Box::new(error)),
                ))
            }
        }
    }

    async fn build_headers(&self, request: &ApiRequest) -> HarnessResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let token = match &request.auth {
            AuthMode::CachedBearer => Some(self.tokens.get_token().await?),
            AuthMode::Bearer(token) => Some(token.clone()),
            AuthMode::Unauthenticated => None,
        };
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                HarnessError::configuration_error(format!(
                    "Bearer token is not a valid header value: {e}"
                ))
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    /// One wire attempt; status and body, or the raw transport error.
    async fn attempt(
        &self,
        request: &ApiRequest,
        headers: &HeaderMap,
    ) -> Result<(u16, String), reqwest::Error> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .headers(headers.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }

    /// Response dump plus the one-line summary for a terminal outcome.
    fn log_terminal(&self, correlation_id: &str, operation: &str, outcome: &RequestOutcome) {
        wire_log::log_response(
            correlation_id,
            outcome.status,
            outcome.duration,
            &outcome.body,
            self.config.response_logging_enabled,
        );

        let duration_ms = outcome.duration.as_millis() as u64;
        if outcome.status >= 500 {
            // Only reachable without retry.
            log_warn!(
                correlation_id = %correlation_id,
                operation = %operation,
                status = outcome.status,
                duration_ms = duration_ms,
                "Completed with server error (no retry)"
            );
        } else if outcome.status >= 400 {
            log_warn!(
                correlation_id = %correlation_id,
                operation = %operation,
                status = outcome.status,
                duration_ms = duration_ms,
                "Completed with client error"
            );
        } else {
            log_info!(
                correlation_id = %correlation_id,
                operation = %operation,
                status = outcome.status,
                duration_ms = duration_ms,
                attempts = outcome.attempts,
                "Completed successfully"
            );
        }
    }
}
