//! Batch deletion ledger for test-created accounts.
//!
//! Every identity a test signs up gets registered here, no matter which
//! test created it or whether that test passed; the suite drains the
//! registry once at teardown. Cleanup failures are logged and counted but
//! never propagated - teardown noise must not mask real test outcomes.

use crate::auth::AuthApi;
use crate::error::HarnessResult;
use crate::logging::{log_debug, log_error, log_info, log_warn};
use std::sync::{Arc, Mutex};

/// One registered account: identity, the secret that can log it in, and
/// whatever resolution state was already known at registration time.
#[derive(Debug, Clone)]
pub struct CleanupEntry {
    pub email: String,
    pub password: String,
    /// Token minted during the test, reused at drain when present.
    pub token: Option<String>,
    /// Numeric account ID, resolved via the profile endpoint when absent.
    pub user_id: Option<u64>,
}

/// Counts reported after a drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub total: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Append-only registry of accounts to delete at suite teardown.
///
/// Appends from parallel tests only contend on a short mutex hold; the
/// drain runs single-threaded after all tests finish.
pub struct CleanupRegistry {
    entries: Mutex<Vec<CleanupEntry>>,
    auth: Arc<dyn AuthApi>,
}

impl CleanupRegistry {
    pub fn new(auth: Arc<dyn AuthApi>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            auth,
        }
    }

    /// Register an account known only by its credentials; token and ID
    /// are resolved at drain time.
    pub fn register(&self, email: impl Into<String>, password: impl Into<String>) {
        self.register_full(email, password, None, None);
    }

    /// Register an account with everything the test already knows.
    pub fn register_full(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
        user_id: Option<u64>,
        token: Option<String>,
    ) {
        let email = email.into();
        let entry = CleanupEntry {
            email: email.clone(),
            password: password.into(),
            token,
            user_id,
        };
        let total = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries.push(entry);
            entries.len()
        };
        log_debug!(email = %email, total = total, "Registered account for cleanup");
    }

    /// Replace the secret of a registered account after the test rotated
    /// it, dropping any cached token since the credentials changed.
    pub fn update_password(
        &self,
        email: &str,
        new_password: impl Into<String>,
    ) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = entries.iter_mut().find(|e| e.email == email) {
            entry.password = new_password.into();
            entry.token = None;
            log_debug!(email = %email, "Updated password for registered account");
            true
        } else {
            false
        }
    }

    pub fn registered_count(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Copy of the current entries.
    pub fn snapshot(&self) -> Vec<CleanupEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Delete every registered account, once, reporting per-batch counts.
    ///
    /// A failing entry never aborts the batch; the registry is cleared
    /// afterwards regardless of partial failures, so a re-run starts
    /// clean.
    pub async fn drain_and_cleanup(&self) -> CleanupSummary {
        let entries = self.snapshot();
        if entries.is_empty() {
            log_info!("No test accounts registered for cleanup");
            return CleanupSummary::default();
        }

        log_info!(total = entries.len(), "Test account cleanup starting");

        let mut summary = CleanupSummary {
            total: entries.len(),
            ..CleanupSummary::default()
        };

        for entry in &entries {
            match self.delete_entry(entry).await {
                Ok(true) => {
                    summary.deleted += 1;
                    log_info!(email = %entry.email, "Deleted test account");
                }
                Ok(false) => {
                    summary.failed += 1;
                    log_warn!(email = %entry.email, "Could not delete test account");
                }
                Err(error) => {
                    summary.failed += 1;
                    log_error!(
                        email = %entry.email,
                        error = %error,
                        "Error deleting test account"
                    );
                }
            }
        }

        log_info!(
            total = summary.total,
            deleted = summary.deleted,
            failed = summary.failed,
            "Test account cleanup finished"
        );

        let mut held = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        held.clear();

        summary
    }

    /// Resolve a token and numeric ID for one entry, then delete it.
    /// Ok(false) means a step was rejected by the service; Err means a
    /// call failed outright.
    async fn delete_entry(&self, entry: &CleanupEntry) -> HarnessResult<bool> {
        let token = match &entry.token {
            Some(token) => token.clone(),
            None => {
                let outcome = self.auth.login(&entry.email, &entry.password).await?;
                match (outcome.status, outcome.jwt) {
                    (200, Some(jwt)) => jwt,
                    (status, _) => {
                        log_warn!(
                            email = %entry.email,
                            status = status,
                            "Cleanup login failed"
                        );
                        return Ok(false);
                    }
                }
            }
        };

        let user_id = match entry.user_id {
            Some(id) => id,
            None => match self.auth.fetch_profile_id(&token).await? {
                Some(id) => id,
                None => {
                    log_warn!(
                        email = %entry.email,
                        "Cleanup could not resolve account ID"
                    );
                    return Ok(false);
                }
            },
        };

        self.auth.delete_account(&token, user_id).await
    }
}
