/// Generation of the DNS record changes backing a certificate
use super::domain::normalize_domain;
use crate::constants::CAA_ISSUER_DOMAIN;
use crate::models::{ChangeAction, DnsChange, DomainValidationOption, RecordType};

/// Which record kinds to emit for every domain validation option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationPolicy {
    pub with_dns_validation: bool,
    pub with_caa: bool,
}

impl GenerationPolicy {
    /// CAA records only, used to toggle them on an existing certificate
    pub const CAA_ONLY: Self = Self {
        with_dns_validation: false,
        with_caa: true,
    };

    /// Validation CNAME records, plus CAA records when requested
    pub fn validation(with_caa: bool) -> Self {
        Self {
            with_dns_validation: true,
            with_caa,
        }
    }
}

/// The CAA record value allowing the certificate authority to issue
pub fn caa_value() -> String {
    format!("0 issue \"{}\"", CAA_ISSUER_DOMAIN)
}

/// Produces the record changes for the given validation options
///
/// Options without a published record contribute no CNAME change. Identical
/// changes are emitted once (a wildcard and its apex share one validation
/// record), keeping the first-seen order.
pub fn generate(
    options: &[DomainValidationOption],
    action: ChangeAction,
    policy: GenerationPolicy,
) -> Vec<DnsChange> {
    let mut changes: Vec<DnsChange> = Vec::with_capacity(options.len() * 2);

    for option in options {
        if policy.with_dns_validation
            && let Some(record) = &option.resource_record
        {
            push_unique(
                &mut changes,
                DnsChange::new(
                    action,
                    record.name.as_str(),
                    RecordType::from(record.record_type.as_str()),
                    record.value.as_str(),
                ),
            );
        }
        if policy.with_caa {
            push_unique(
                &mut changes,
                DnsChange::new(
                    action,
                    normalize_domain(&option.domain_name),
                    RecordType::Caa,
                    caa_value(),
                ),
            );
        }
    }

    changes
}

fn push_unique(changes: &mut Vec<DnsChange>, change: DnsChange) {
    if !changes.contains(&change) {
        changes.push(change);
    }
}
