// Unit Tests for Harness Error Taxonomy
//
// UNIT UNDER TEST: HarnessError
//
// BUSINESS RESPONSIBILITY:
//   - Classifies failures into categories driving caller behavior
//   - Distinguishes retryable transport failures from fatal errors
//   - Preserves original causes for transport failures
//   - Keeps the returned-vs-raised propagation policy auditable
//
// TEST COVERAGE:
//   - Category and severity mapping per variant
//   - Retryability: only transport failures retry
//   - Display formatting carries the operation / message context
//   - Source chain preservation

use crate::error::{ErrorCategory, ErrorSeverity, HarnessError};

#[cfg(test)]
mod harness_error_tests {
    use super::*;

    #[test]
    fn test_category_mapping_drives_handling() {
        // Test verifies each variant maps to the category its handling
        // policy is keyed on

        assert_eq!(
            HarnessError::configuration_error("missing base URL").category(),
            ErrorCategory::Client,
            "Config problems are the harness user's to fix"
        );
        assert_eq!(
            HarnessError::transport_failed("GET /api/user/profile", None).category(),
            ErrorCategory::Transient,
            "Transport failures are retried"
        );
        assert_eq!(
            HarnessError::token_refresh_failed("login returned 401").category(),
            ErrorCategory::External,
            "Refresh failures point at the environment under test"
        );
        assert_eq!(
            HarnessError::response_parsing_error("not JSON").category(),
            ErrorCategory::External
        );
    }

    #[test]
    fn test_only_transport_failures_are_retryable() {
        // Test verifies the executor's retry loop keys off exactly one
        // variant; everything else fails fast

        assert!(HarnessError::transport_failed("POST /auth/signin", None).is_retryable());
        assert!(!HarnessError::configuration_error("bad").is_retryable());
        assert!(!HarnessError::token_refresh_failed("bad").is_retryable());
        assert!(!HarnessError::response_parsing_error("bad").is_retryable());
    }

    #[test]
    fn test_severity_mapping() {
        // Test verifies parsing problems log softer than the fatal variants

        assert_eq!(
            HarnessError::response_parsing_error("bad").severity(),
            ErrorSeverity::Warning
        );
        assert_eq!(
            HarnessError::token_refresh_failed("bad").severity(),
            ErrorSeverity::Error
        );
        assert_eq!(
            HarnessError::configuration_error("bad").severity(),
            ErrorSeverity::Error
        );
    }

    #[test]
    fn test_transport_failure_preserves_operation_and_cause() {
        // Test verifies the wrapped error names the operation and keeps the
        // original cause reachable through the source chain

        // Arrange
        let cause = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");

        // Act
        let error = HarnessError::transport_failed(
            "DELETE /api/user/42",
            Some(Box::new(cause)),
        );

        // Assert
        assert!(
            error.to_string().contains("DELETE /api/user/42"),
            "Display should carry the operation description"
        );
        let source = std::error::Error::source(&error);
        assert!(source.is_some(), "Original cause should be preserved");
        assert!(source.unwrap().to_string().contains("refused"));
    }

    #[test]
    fn test_display_carries_context() {
        // Test verifies messages are self-describing in log output

        let error = HarnessError::token_refresh_failed("jwt field missing from login response");
        assert!(error.to_string().contains("jwt field missing"));

        let error = HarnessError::configuration_error("Base URL is required");
        assert!(error.to_string().contains("Base URL is required"));
    }
}
