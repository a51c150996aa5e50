/// ARN parsing helpers for ACM certificates and CloudFormation stacks
use crate::error::CertforgeError;
use regex::Regex;
use std::sync::LazyLock;

static CERTIFICATE_ARN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^arn:aws[^:]*:acm:[^:]*:[^:]*:certificate/.+$").unwrap());

static CERTIFICATE_REGION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^arn:aws[^:]*:acm:([^:]+):").unwrap());

static ARN_REGION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^arn:aws[^:]*:[^:]*:([^:]*):").unwrap());

static STACK_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^arn:[^:]+:cloudformation:[^:]*:[^:]*:stack/(.+)$").unwrap());

/// Whether the value is an ACM certificate ARN
///
/// Physical ids of failed creations (`certforge-failed-...`) are not, which
/// makes their deletion a no-op.
///
/// # Examples
/// ```
/// use certforge_core::utils::arn::is_certificate_arn;
///
/// assert!(is_certificate_arn("arn:aws:acm:us-east-1:123456789012:certificate/abc"));
/// assert!(!is_certificate_arn("certforge-failed-1234"));
/// ```
pub fn is_certificate_arn(value: &str) -> bool {
    CERTIFICATE_ARN_PATTERN.is_match(value)
}

/// Region embedded in an ACM certificate ARN
pub fn certificate_region(certificate_arn: &str) -> Result<&str, CertforgeError> {
    CERTIFICATE_REGION_PATTERN
        .captures(certificate_arn)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| {
            CertforgeError::Validation(format!(
                "could not extract the region from the arn {}",
                certificate_arn
            ))
        })
}

/// Region embedded in any ARN (empty for global services)
pub fn arn_region(arn: &str) -> Option<&str> {
    ARN_REGION_PATTERN
        .captures(arn)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// The `<stack-name>/<stack-guid>` part of a CloudFormation stack ARN
pub fn stack_name_and_guid(stack_arn: &str) -> Result<&str, CertforgeError> {
    STACK_ID_PATTERN
        .captures(stack_arn)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| CertforgeError::Event(format!("invalid stack id {}", stack_arn)))
}
