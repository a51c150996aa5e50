/// Application constants
///
/// This module contains all hardcoded values used throughout the application.
/// Constants are organized by category for easy maintenance.
// ============================================================================
// Polling
// ============================================================================

/// Rounds spent waiting for validation records or DNS propagation
pub const POLL_MAX_ROUNDS: u32 = 60;

/// Seconds between two polling rounds
pub const POLL_INTERVAL_SECONDS: u64 = 3;

/// Rounds the Step Functions checker waits for issuance
pub const CHECK_MAX_ROUNDS: u32 = 60;

// ============================================================================
// DNS Records
// ============================================================================

/// TTL applied to every generated record set
pub const RECORD_TTL_SECONDS: i64 = 300;

/// Domain of the certificate authority allowed by the CAA records
pub const CAA_ISSUER_DOMAIN: &str = "amazon.com";

/// Comment attached to every change batch
pub const CHANGE_BATCH_COMMENT: &str = "by certforge DnsCertificate custom resource";

/// Prefix of the route53 error raised when deleting a missing record set
pub const RECORD_ABSENT_MESSAGE: &str = "Tried to delete resource record set";

// ============================================================================
// Idempotency
// ============================================================================

/// Default prefix for parameters stored by certforge
pub const DEFAULT_PARAMETER_PREFIX: &str = "/certforge";

/// Description attached to the SNS message id parameter
pub const MESSAGE_ID_PARAMETER_DESCRIPTION: &str =
    "certforge: SNS duplicate detection for DnsCertificate";

// ============================================================================
// CloudFormation
// ============================================================================

/// Prefix of the physical id reported when a create fails before any
/// certificate exists
pub const FAILED_PHYSICAL_ID_PREFIX: &str = "certforge-failed";

/// Maximum length of the reason sent back to CloudFormation (the whole
/// response body is limited to 4096 bytes)
pub const MAX_REASON_LENGTH: usize = 1024;

// ============================================================================
// Retry Configuration
// ============================================================================

/// Maximum number of retries for transient failures
pub const MAX_RETRIES: u32 = 4;

/// Base delay for exponential backoff in milliseconds
pub const RETRY_BASE_DELAY_MS: u64 = 500;

/// Maximum delay for exponential backoff in milliseconds
pub const RETRY_MAX_DELAY_MS: u64 = 8_000;

/// Jitter factor for retry delays (0.0 to 1.0)
pub const RETRY_JITTER_FACTOR: f64 = 0.1;

// ============================================================================
// Metrics
// ============================================================================

/// Default CloudWatch namespace
pub const METRICS_NAMESPACE: &str = "Certforge";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polling_budget_is_three_minutes() {
        assert_eq!(POLL_MAX_ROUNDS as u64 * POLL_INTERVAL_SECONDS, 180);
    }

    #[test]
    fn test_retry_constants() {
        assert!(RETRY_BASE_DELAY_MS < RETRY_MAX_DELAY_MS);
        assert!(RETRY_JITTER_FACTOR > 0.0 && RETRY_JITTER_FACTOR < 1.0);
    }
}
