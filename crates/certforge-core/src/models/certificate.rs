/// Certificate domain types shared by the lifecycle manager and the adapters
use super::properties::Tag;

/// Hosted zone with both identifiers resolved
///
/// The id is kept without the `/hostedzone/` prefix route53 returns, and the
/// name always ends with a dot, so two resolutions of the same zone compare
/// equal whichever identifier was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZone {
    pub id: String,
    pub name: String,
}

impl HostedZone {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: normalize_zone_id(id),
            name: crate::certificate::domain::normalize_domain(name),
        }
    }
}

pub fn normalize_zone_id(id: &str) -> String {
    id.trim_start_matches("/hostedzone/").to_string()
}

/// Validated `DnsCertificate` properties
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateRequest {
    pub domain_name: String,
    /// Explicit region; `None` means the region of the stack
    pub region: Option<String>,
    pub subject_alternative_names: Vec<String>,
    pub tags: Vec<Tag>,
    pub hosted_zone: HostedZone,
    pub with_caa_records: bool,
}

impl CertificateRequest {
    /// Every distinct domain the certificate covers, primary first
    pub fn domains(&self) -> Vec<&str> {
        let mut domains: Vec<&str> = Vec::with_capacity(self.subject_alternative_names.len() + 1);
        for domain in std::iter::once(self.domain_name.as_str())
            .chain(self.subject_alternative_names.iter().map(String::as_str))
        {
            if !domains.contains(&domain) {
                domains.push(domain);
            }
        }
        domains
    }
}

/// DNS record the certificate authority expects for one domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRecord {
    pub name: String,
    pub value: String,
    pub record_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainValidationOption {
    pub domain_name: String,
    /// Published asynchronously after the request
    pub resource_record: Option<ValidationRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateStatus {
    Issued,
    PendingValidation,
    Other(String),
}

impl CertificateStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Issued => "ISSUED",
            Self::PendingValidation => "PENDING_VALIDATION",
            Self::Other(status) => status,
        }
    }
}

impl From<&str> for CertificateStatus {
    fn from(status: &str) -> Self {
        match status {
            "ISSUED" => Self::Issued,
            "PENDING_VALIDATION" => Self::PendingValidation,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateDescription {
    pub certificate_arn: String,
    pub status: CertificateStatus,
    pub domain_validation_options: Vec<DomainValidationOption>,
}

impl CertificateDescription {
    /// Whether every given domain has a published validation record
    pub fn has_records_for(&self, domains: &[&str]) -> bool {
        domains.iter().all(|domain| {
            self.domain_validation_options
                .iter()
                .any(|option| option.domain_name == *domain && option.resource_record.is_some())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(domain: &str, published: bool) -> DomainValidationOption {
        DomainValidationOption {
            domain_name: domain.to_string(),
            resource_record: published.then(|| ValidationRecord {
                name: format!("_x1.{}.", domain),
                value: "_y1.acm-validations.aws.".to_string(),
                record_type: "CNAME".to_string(),
            }),
        }
    }

    #[test]
    fn test_hosted_zone_normalization() {
        let by_id = HostedZone::new("/hostedzone/Z1D633PJN98FT9", "example.com");
        let by_name = HostedZone::new("Z1D633PJN98FT9", "example.com.");
        assert_eq!(by_id, by_name);
        assert_eq!(by_id.name, "example.com.");
    }

    #[test]
    fn test_status_conversion() {
        assert_eq!(CertificateStatus::from("ISSUED"), CertificateStatus::Issued);
        assert_eq!(
            CertificateStatus::from("PENDING_VALIDATION"),
            CertificateStatus::PendingValidation
        );
        assert_eq!(CertificateStatus::from("FAILED").as_str(), "FAILED");
    }

    #[test]
    fn test_has_records_for() {
        let description = CertificateDescription {
            certificate_arn: "arn".to_string(),
            status: CertificateStatus::PendingValidation,
            domain_validation_options: vec![
                option("a.example.com", true),
                option("b.example.com", false),
            ],
        };
        assert!(description.has_records_for(&["a.example.com"]));
        assert!(!description.has_records_for(&["a.example.com", "b.example.com"]));
        assert!(!description.has_records_for(&["c.example.com"]));
    }

    #[test]
    fn test_domains_are_deduplicated() {
        let request = CertificateRequest {
            domain_name: "example.com".to_string(),
            region: None,
            subject_alternative_names: vec![
                "www.example.com".to_string(),
                "example.com".to_string(),
            ],
            tags: vec![],
            hosted_zone: HostedZone::new("Z1", "example.com"),
            with_caa_records: true,
        };
        assert_eq!(request.domains(), vec!["example.com", "www.example.com"]);
    }
}
