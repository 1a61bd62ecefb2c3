//! Shared authentication token cache with lazy, double-checked refresh.
//!
//! One cache instance is shared (via `Arc`) by every concurrently running
//! test. Readers take the cheap `RwLock` fast path; only a caller that
//! finds the credential missing or inside the expiry buffer takes the
//! refresh mutex, re-checks, and performs the login. Exactly one login
//! runs no matter how many callers detect expiry at once.

use crate::auth::AuthApi;
use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::logging::{log_debug, log_info};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// A credential this close to expiry is treated as already expired, so a
/// token never runs out mid-flight during a slow call.
pub const EXPIRY_BUFFER: Duration = Duration::from_secs(2 * 60);

/// Validity assumed for tokens minted by the login endpoint.
pub const DEFAULT_VALIDITY: Duration = Duration::from_secs(30 * 60);

/// A bearer token plus its issuance and expiry metadata.
///
/// Replaced wholesale on refresh, never partially updated.
#[derive(Debug, Clone)]
pub struct Credential {
    pub value: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(value: impl Into<String>, validity: Duration) -> Self {
        let issued_at = Utc::now();
        Self {
            value: value.into(),
            issued_at,
            expires_at: issued_at + validity,
        }
    }

    /// Valid iff `now + EXPIRY_BUFFER` is still before the expiry.
    pub fn is_valid(&self) -> bool {
        Utc::now() + EXPIRY_BUFFER < self.expires_at
    }
}

/// Thread-safe owner of the suite's shared credential.
pub struct TokenCache {
    current: RwLock<Option<Credential>>,
    refresh_lock: Mutex<()>,
    auth: Arc<dyn AuthApi>,
    username: String,
    password: String,
}

impl TokenCache {
    /// Create a cache that refreshes with the configured default identity
    /// through the given auth path.
    pub fn new(auth: Arc<dyn AuthApi>, config: &HarnessConfig) -> Self {
        Self {
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            auth,
            username: config.default_username.clone(),
            password: config.default_password.clone(),
        }
    }

    /// Return the current valid token value, refreshing first if needed.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::TokenRefreshFailed`] when login answers
    /// non-200 or omits the `jwt` field, and [`HarnessError::TransportFailed`]
    /// when the login call itself fails. A stale or empty token is never
    /// returned in place of an error.
    pub async fn get_token(&self) -> HarnessResult<String> {
        // Fast path: shared read, no refresh coordination.
        if let Some(value) = self.valid_value().await {
            return Ok(value);
        }

        let _refresh_guard = self.refresh_lock.lock().await;

        // Re-check under the lock: another caller may have refreshed
        // while this one waited.
        if let Some(value) = self.valid_value().await {
            return Ok(value);
        }

        let credential = self.refresh().await?;
        let value = credential.value.clone();
        *self.current.write().await = Some(credential);
        Ok(value)
    }

    /// Install a credential directly, bypassing login.
    ///
    /// Used when a test needs a token tied to an identity it just created
    /// rather than the shared default identity.
    pub async fn set_token(&self, value: impl Into<String>, validity: Duration) {
        let credential = Credential::new(value, validity);
        log_debug!(
            expires_at = %credential.expires_at,
            "Credential installed administratively"
        );
        *self.current.write().await = Some(credential);
    }

    /// Invalidate the cache; the next [`get_token`](Self::get_token)
    /// performs a fresh login.
    pub async fn clear_token(&self) {
        *self.current.write().await = None;
        log_debug!("Credential cache cleared");
    }

    /// Non-blocking diagnostic: is a usable credential currently cached?
    pub async fn has_valid_token(&self) -> bool {
        self.valid_value().await.is_some()
    }

    async fn valid_value(&self) -> Option<String> {
        self.current
            .read()
            .await
            .as_ref()
            .filter(|c| c.is_valid())
            .map(|c| c.value.clone())
    }

    async fn refresh(&self) -> HarnessResult<Credential> {
        log_debug!(username = %self.username, "Refreshing authentication token");

        let outcome = self.auth.login(&self.username, &self.password).await?;

        if outcome.status != 200 {
            return Err(HarnessError::token_refresh_failed(format!(
                "Login returned status {}",
                outcome.status
            )));
        }
        let jwt = outcome.jwt.ok_or_else(|| {
            HarnessError::token_refresh_failed("jwt field missing from login response")
        })?;

        let credential = Credential::new(jwt, DEFAULT_VALIDITY);
        log_info!(
            expires_at = %credential.expires_at,
            "Authentication token refreshed"
        );
        Ok(credential)
    }
}
