/// DNS provider seam and its Route53 implementation
use crate::certificate::domain::normalize_domain;
use crate::constants::{CHANGE_BATCH_COMMENT, RECORD_ABSENT_MESSAGE};
use crate::error::CertforgeError;
use crate::models::{
    ChangeAction, ChangeReceipt, ChangeStatus, DnsChange, HostedZone, normalize_zone_id,
};
use async_trait::async_trait;
use aws_sdk_route53::operation::change_resource_record_sets::ChangeResourceRecordSetsError;
use aws_sdk_route53::types::{
    Change, ChangeBatch, ChangeInfo, ResourceRecord, ResourceRecordSet, RrType,
};
use aws_smithy_types::error::display::DisplayErrorContext;
use tracing::{debug, info};

#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Submits the changes as one atomic batch
    ///
    /// A batch deleting a record set that does not exist fails with
    /// `RecordAbsent`.
    async fn change_record_sets(
        &self,
        zone_id: &str,
        changes: &[DnsChange],
    ) -> Result<ChangeReceipt, CertforgeError>;

    async fn change_status(&self, change_id: &str) -> Result<ChangeStatus, CertforgeError>;

    async fn zone_by_name(&self, zone_name: &str) -> Result<HostedZone, CertforgeError>;

    async fn zone_by_id(&self, zone_id: &str) -> Result<HostedZone, CertforgeError>;
}

pub struct Route53DnsProvider {
    client: aws_sdk_route53::Client,
}

impl Route53DnsProvider {
    pub fn new(client: aws_sdk_route53::Client) -> Self {
        Self { client }
    }
}

fn build_error(err: impl std::error::Error) -> CertforgeError {
    CertforgeError::Provider(format!("invalid route53 change: {}", err))
}

fn to_change(change: &DnsChange) -> Result<Change, CertforgeError> {
    let record = ResourceRecord::builder()
        .value(&change.value)
        .build()
        .map_err(build_error)?;
    let record_set = ResourceRecordSet::builder()
        .name(&change.name)
        .r#type(RrType::from(change.record_type.as_str()))
        .ttl(change.ttl)
        .resource_records(record)
        .build()
        .map_err(build_error)?;
    let action = match change.action {
        ChangeAction::Upsert => aws_sdk_route53::types::ChangeAction::Upsert,
        ChangeAction::Delete => aws_sdk_route53::types::ChangeAction::Delete,
    };

    Change::builder()
        .action(action)
        .resource_record_set(record_set)
        .build()
        .map_err(build_error)
}

fn to_receipt(info: &ChangeInfo) -> ChangeReceipt {
    ChangeReceipt {
        id: info.id().to_string(),
        status: parse_status(info.status().as_str()),
    }
}

fn parse_status(status: &str) -> ChangeStatus {
    if status.eq_ignore_ascii_case("INSYNC") {
        ChangeStatus::InSync
    } else {
        ChangeStatus::Pending
    }
}

fn is_record_absent(err: &ChangeResourceRecordSetsError) -> bool {
    match err {
        ChangeResourceRecordSetsError::InvalidChangeBatch(invalid) => {
            invalid
                .messages()
                .iter()
                .any(|m| m.contains(RECORD_ABSENT_MESSAGE))
                || invalid
                    .message()
                    .is_some_and(|m| m.contains(RECORD_ABSENT_MESSAGE))
        }
        _ => false,
    }
}

#[async_trait]
impl DnsProvider for Route53DnsProvider {
    async fn change_record_sets(
        &self,
        zone_id: &str,
        changes: &[DnsChange],
    ) -> Result<ChangeReceipt, CertforgeError> {
        let batch = ChangeBatch::builder()
            .comment(CHANGE_BATCH_COMMENT)
            .set_changes(Some(
                changes.iter().map(to_change).collect::<Result<Vec<_>, _>>()?,
            ))
            .build()
            .map_err(build_error)?;

        let output = self
            .client
            .change_resource_record_sets()
            .hosted_zone_id(zone_id)
            .change_batch(batch)
            .send()
            .await
            .map_err(|e| {
                let rendered = DisplayErrorContext(&e).to_string();
                if e.as_service_error().is_some_and(is_record_absent)
                    || rendered.contains(RECORD_ABSENT_MESSAGE)
                {
                    CertforgeError::RecordAbsent(rendered)
                } else {
                    CertforgeError::Provider(format!(
                        "could not change record sets in zone {}: {}",
                        zone_id, rendered
                    ))
                }
            })?;

        let info = output.change_info().ok_or_else(|| {
            CertforgeError::Provider("route53 returned no change info".to_string())
        })?;
        let receipt = to_receipt(info);

        info!(
            zone_id = zone_id,
            change_id = %receipt.id,
            changes = changes.len(),
            "Submitted record set changes"
        );
        Ok(receipt)
    }

    async fn change_status(&self, change_id: &str) -> Result<ChangeStatus, CertforgeError> {
        let output = self
            .client
            .get_change()
            .id(change_id)
            .send()
            .await
            .map_err(|e| {
                CertforgeError::provider(format!("could not get the change {}", change_id), e)
            })?;

        let status = output
            .change_info()
            .map(|info| to_receipt(info).status)
            .unwrap_or(ChangeStatus::Pending);
        debug!(change_id = change_id, status = ?status, "Checked change status");
        Ok(status)
    }

    async fn zone_by_name(&self, zone_name: &str) -> Result<HostedZone, CertforgeError> {
        let wanted = normalize_domain(zone_name).to_ascii_lowercase();
        let output = self
            .client
            .list_hosted_zones_by_name()
            .dns_name(&wanted)
            .send()
            .await
            .map_err(|e| {
                CertforgeError::provider(
                    format!("could not look up the hosted zone {}", zone_name),
                    e,
                )
            })?;

        // The listing starts at the given name, so the first zone may be a
        // lexicographic neighbour
        output
            .hosted_zones()
            .iter()
            .map(|zone| HostedZone::new(zone.id(), zone.name()))
            .find(|zone| zone.name.eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| {
                CertforgeError::Validation(format!("hosted zone {} not found", zone_name))
            })
    }

    async fn zone_by_id(&self, zone_id: &str) -> Result<HostedZone, CertforgeError> {
        let output = self
            .client
            .get_hosted_zone()
            .id(normalize_zone_id(zone_id))
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_hosted_zone()) {
                    CertforgeError::Validation(format!("hosted zone {} not found", zone_id))
                } else {
                    CertforgeError::provider(
                        format!("could not get the hosted zone {}", zone_id),
                        e,
                    )
                }
            })?;

        let zone = output.hosted_zone().ok_or_else(|| {
            CertforgeError::Provider(format!("route53 returned no hosted zone for {}", zone_id))
        })?;
        Ok(HostedZone::new(zone.id(), zone.name()))
    }
}
