/// Error types for the certforge custom resources
use aws_smithy_types::error::display::DisplayErrorContext;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CertforgeError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Record already absent: {0}")]
    RecordAbsent(String),

    #[error("Validation timeout: {0}")]
    ValidationTimeout(String),

    #[error("Propagation timeout: {0}")]
    PropagationTimeout(String),

    #[error("the certificate {certificate_arn} is in invalid status {status}")]
    TerminalStatus {
        certificate_arn: String,
        status: String,
    },

    /// A failure that happened after the certificate was requested. The
    /// certificate stays allocated and its ARN becomes the physical id.
    #[error("{source}")]
    PartiallyCreated {
        certificate_arn: String,
        source: Box<CertforgeError>,
    },

    #[error("Invalid event: {0}")]
    Event(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Response error: {0}")]
    Response(String),
}

impl CertforgeError {
    /// Determines if an error is retriable
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Provider(_) => true,
            Self::Response(_) => true,
            Self::Validation(_) => false,
            Self::NotFound(_) => false,
            Self::RecordAbsent(_) => false,
            Self::ValidationTimeout(_) => false,
            Self::PropagationTimeout(_) => false,
            Self::TerminalStatus { .. } => false,
            Self::PartiallyCreated { source, .. } => source.is_retriable(),
            Self::Event(_) => false,
            Self::Config(_) => false,
        }
    }

    /// Builds a provider error carrying the operation context and the full
    /// SDK error chain
    pub fn provider<E>(context: impl std::fmt::Display, err: E) -> Self
    where
        E: std::error::Error,
    {
        Self::Provider(format!("{}: {}", context, DisplayErrorContext(err)))
    }

    pub fn partially_created(certificate_arn: &str, source: CertforgeError) -> Self {
        match source {
            already @ Self::PartiallyCreated { .. } => already,
            other => Self::PartiallyCreated {
                certificate_arn: certificate_arn.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The certificate ARN attached to a failure, if one was allocated
    pub fn certificate_arn(&self) -> Option<&str> {
        match self {
            Self::PartiallyCreated {
                certificate_arn, ..
            } => Some(certificate_arn),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<serde_json::Error> for CertforgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Event(err.to_string())
    }
}

impl From<std::env::VarError> for CertforgeError {
    fn from(err: std::env::VarError) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T, E = CertforgeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable_errors() {
        assert!(CertforgeError::Provider("throttled".to_string()).is_retriable());
        assert!(CertforgeError::Response("timeout".to_string()).is_retriable());
        assert!(!CertforgeError::Validation("test".to_string()).is_retriable());
        assert!(!CertforgeError::PropagationTimeout("C1".to_string()).is_retriable());
    }

    #[test]
    fn test_error_display() {
        let err = CertforgeError::TerminalStatus {
            certificate_arn: "arn:aws:acm:us-east-1:123:certificate/abc".to_string(),
            status: "FAILED".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "the certificate arn:aws:acm:us-east-1:123:certificate/abc is in invalid status FAILED"
        );
    }

    #[test]
    fn test_partially_created_keeps_arn_and_message() {
        let err = CertforgeError::partially_created(
            "arn:aws:acm:us-east-1:123:certificate/abc",
            CertforgeError::ValidationTimeout("no DNS entries".to_string()),
        );
        assert_eq!(
            err.certificate_arn(),
            Some("arn:aws:acm:us-east-1:123:certificate/abc")
        );
        assert_eq!(err.to_string(), "Validation timeout: no DNS entries");

        // wrapping twice keeps the innermost certificate
        let rewrapped = CertforgeError::partially_created("arn:other", err);
        assert_eq!(
            rewrapped.certificate_arn(),
            Some("arn:aws:acm:us-east-1:123:certificate/abc")
        );
    }
}
