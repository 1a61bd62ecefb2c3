// Unit Tests for Cleanup Registry
//
// UNIT UNDER TEST: CleanupRegistry
//
// BUSINESS RESPONSIBILITY:
//   - Tracks every test-created account for batch deletion at teardown
//   - Survives credential rotation: updating a password drops the stale token
//   - Never aborts the batch on one entry's failure
//   - Clears itself after a drain regardless of partial failures
//
// TEST COVERAGE:
//   - Concurrent registration
//   - Password rotation clearing the cached token
//   - Drain resolution order: cached token > login, cached ID > profile
//   - Per-entry failure accounting and batch summary counts
//   - Exactly-once deletion across repeated drains

use crate::auth::{LoginOutcome, MockAuthApi};
use crate::cleanup::CleanupRegistry;
use crate::error::HarnessError;
use std::sync::Arc;

fn login_success(jwt: &str) -> LoginOutcome {
    LoginOutcome {
        status: 200,
        jwt: Some(jwt.to_string()),
    }
}

#[cfg(test)]
mod registration_tests {
    use super::*;

    #[test]
    fn test_concurrent_registration_keeps_every_entry() {
        // Test verifies appends from parallel tests never lose entries

        // Arrange
        let registry = Arc::new(CleanupRegistry::new(Arc::new(MockAuthApi::new())));
        let mut handles = Vec::new();

        // Act
        for worker in 0..8 {
            let registry = registry.clone();
            handles.push(std::thread::spawn(move || {
                for account in 0..25 {
                    registry.register(
                        format!("user{worker}-{account}@example.com"),
                        "password",
                    );
                }
            }));
        }
        for handle in handles {
            handle.join().expect("registration thread panicked");
        }

        // Assert
        assert_eq!(registry.registered_count(), 8 * 25);
    }

    #[test]
    fn test_update_password_rotates_secret_and_drops_token() {
        // Test verifies rotating credentials invalidates the cached token,
        // since the old token belonged to the old password

        // Arrange
        let registry = CleanupRegistry::new(Arc::new(MockAuthApi::new()));
        registry.register_full(
            "rotated@example.com",
            "old-password",
            Some(7),
            Some("stale-token".to_string()),
        );

        // Act
        let updated = registry.update_password("rotated@example.com", "new-password");

        // Assert
        assert!(updated);
        let entry = &registry.snapshot()[0];
        assert_eq!(entry.password, "new-password");
        assert!(entry.token.is_none(), "Cached token must be dropped");
        assert_eq!(entry.user_id, Some(7), "Resolved ID survives rotation");
    }

    #[test]
    fn test_update_password_for_unknown_email_is_a_noop() {
        let registry = CleanupRegistry::new(Arc::new(MockAuthApi::new()));
        assert!(!registry.update_password("missing@example.com", "x"));
    }
}

#[cfg(test)]
mod drain_tests {
    use super::*;

    #[tokio::test]
    async fn test_drain_resolves_token_and_id_then_deletes() {
        // Test verifies the full resolution path for an entry registered
        // with credentials only: login, profile fetch, delete

        // Arrange
        let mut mock = MockAuthApi::new();
        mock.expect_login()
            .times(1)
            .returning(|_, _| Ok(login_success("drain-token")));
        mock.expect_fetch_profile_id()
            .times(1)
            .returning(|_| Ok(Some(42)));
        mock.expect_delete_account()
            .times(1)
            .withf(|token, id| token == "drain-token" && *id == 42)
            .returning(|_, _| Ok(true));
        let registry = CleanupRegistry::new(Arc::new(mock));
        registry.register("resolved@example.com", "password");

        // Act
        let summary = registry.drain_and_cleanup().await;

        // Assert
        assert_eq!(summary.total, 1);
        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(registry.registered_count(), 0, "Registry clears after drain");
    }

    #[tokio::test]
    async fn test_drain_reuses_cached_token_and_id() {
        // Test verifies a fully resolved entry skips login and profile fetch

        // Arrange
        let mut mock = MockAuthApi::new();
        mock.expect_login().never();
        mock.expect_fetch_profile_id().never();
        mock.expect_delete_account()
            .times(1)
            .returning(|_, _| Ok(true));
        let registry = CleanupRegistry::new(Arc::new(mock));
        registry.register_full(
            "known@example.com",
            "password",
            Some(9),
            Some("minted-token".to_string()),
        );

        // Act
        let summary = registry.drain_and_cleanup().await;

        // Assert
        assert_eq!(summary.deleted, 1);
    }

    #[tokio::test]
    async fn test_one_failing_login_never_aborts_the_batch() {
        // Test verifies per-entry failure accounting: one rejected login
        // still lets the other entry through, and the registry ends empty

        // Arrange
        let mut mock = MockAuthApi::new();
        mock.expect_login().times(2).returning(|email, _| {
            if email == "bad@example.com" {
                Ok(LoginOutcome {
                    status: 401,
                    jwt: None,
                })
            } else {
                Ok(login_success("good-token"))
            }
        });
        mock.expect_fetch_profile_id()
            .times(1)
            .returning(|_| Ok(Some(1)));
        mock.expect_delete_account()
            .times(1)
            .returning(|_, _| Ok(true));
        let registry = CleanupRegistry::new(Arc::new(mock));
        registry.register("good@example.com", "password");
        registry.register("bad@example.com", "password");

        // Act
        let summary = registry.drain_and_cleanup().await;

        // Assert
        assert_eq!(summary.total, 2);
        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(
            registry.registered_count(),
            0,
            "Registry clears even after partial failure"
        );
    }

    #[tokio::test]
    async fn test_transport_error_counts_as_failure_not_panic() {
        // Test verifies an outright call failure is recovered locally

        // Arrange
        let mut mock = MockAuthApi::new();
        mock.expect_login()
            .times(1)
            .returning(|_, _| Err(HarnessError::transport_failed("POST /auth/signin", None)));
        let registry = CleanupRegistry::new(Arc::new(mock));
        registry.register("unreachable@example.com", "password");

        // Act
        let summary = registry.drain_and_cleanup().await;

        // Assert
        assert_eq!(summary.failed, 1);
        assert_eq!(registry.registered_count(), 0);
    }

    #[tokio::test]
    async fn test_deletion_happens_exactly_once_after_rotation() {
        // Test verifies register -> update_password -> drain deletes the
        // account exactly once with the rotated credentials, and a second
        // drain finds nothing to do

        // Arrange
        let mut mock = MockAuthApi::new();
        mock.expect_login()
            .times(1)
            .withf(|_, password| password == "rotated-password")
            .returning(|_, _| Ok(login_success("rotated-token")));
        mock.expect_fetch_profile_id()
            .times(1)
            .returning(|_| Ok(Some(5)));
        mock.expect_delete_account()
            .times(1)
            .returning(|_, _| Ok(true));
        let registry = CleanupRegistry::new(Arc::new(mock));
        registry.register_full(
            "rotating@example.com",
            "original-password",
            None,
            Some("pre-rotation-token".to_string()),
        );
        registry.update_password("rotating@example.com", "rotated-password");

        // Act
        let first = registry.drain_and_cleanup().await;
        let second = registry.drain_and_cleanup().await;

        // Assert
        assert_eq!(first.deleted, 1);
        assert_eq!(second.total, 0, "Second drain must find an empty registry");
    }

    #[tokio::test]
    async fn test_empty_drain_reports_zero_counts() {
        let registry = CleanupRegistry::new(Arc::new(MockAuthApi::new()));
        let summary = registry.drain_and_cleanup().await;
        assert_eq!(summary.total, 0);
        assert_eq!(summary.deleted, 0);
        assert_eq!(summary.failed, 0);
    }
}
