/// Certificate lifecycle: request, validation records, tags, replacement and
/// deletion
use super::changes::{GenerationPolicy, generate};
use super::domain::{is_same_region, same_name_set, same_tag_set};
use super::executor::DnsChangeExecutor;
use crate::error::CertforgeError;
use crate::models::{CertificateRequest, ChangeAction, DomainValidationOption, Tag};
use crate::services::{CertificateAuthority, Metrics, MetricsService};
use crate::utils::arn::is_certificate_arn;
use crate::utils::poll::PollSettings;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// A new certificate was requested; CloudFormation deletes the old one
    /// once the new physical id is reported
    Replaced { certificate_arn: String },
    UpdatedInPlace,
}

pub struct CertificateManager {
    authority: Arc<dyn CertificateAuthority>,
    executor: DnsChangeExecutor,
    metrics: Arc<dyn MetricsService>,
    poll: PollSettings,
}

impl CertificateManager {
    pub fn new(
        authority: Arc<dyn CertificateAuthority>,
        executor: DnsChangeExecutor,
        metrics: Arc<dyn MetricsService>,
        poll: PollSettings,
    ) -> Self {
        Self {
            authority,
            executor,
            metrics,
            poll,
        }
    }

    /// Requests the certificate, tags it and publishes its validation records
    ///
    /// Any failure after the request carries the new ARN as
    /// `PartiallyCreated`.
    pub async fn create(&self, request: &CertificateRequest) -> Result<String, CertforgeError> {
        let certificate_arn = self.authority.request_certificate(request).await?;
        Metrics::certificate_requested(self.metrics.as_ref()).await;

        self.provision(&certificate_arn, request)
            .await
            .map_err(|e| CertforgeError::partially_created(&certificate_arn, e))?;
        Ok(certificate_arn)
    }

    async fn provision(
        &self,
        certificate_arn: &str,
        request: &CertificateRequest,
    ) -> Result<(), CertforgeError> {
        if !request.tags.is_empty() {
            self.authority.add_tags(certificate_arn, &request.tags).await?;
        }
        self.create_validation_records(certificate_arn, request).await
    }

    /// Waits until ACM published a validation record for every domain
    pub async fn await_validation_options(
        &self,
        certificate_arn: &str,
        domains: &[&str],
    ) -> Result<Vec<DomainValidationOption>, CertforgeError> {
        for round in 0..self.poll.max_rounds {
            let description = self.authority.describe_certificate(certificate_arn).await?;
            if description.has_records_for(domains) {
                return Ok(description.domain_validation_options);
            }
            debug!(
                certificate_arn = certificate_arn,
                round = round,
                "Validation records not published yet"
            );
            self.poll.pause().await;
        }

        Err(CertforgeError::ValidationTimeout(format!(
            "no DNS entries for certificate {}",
            certificate_arn
        )))
    }

    pub async fn create_validation_records(
        &self,
        certificate_arn: &str,
        request: &CertificateRequest,
    ) -> Result<(), CertforgeError> {
        let options = self
            .await_validation_options(certificate_arn, &request.domains())
            .await?;
        let changes = generate(
            &options,
            ChangeAction::Upsert,
            GenerationPolicy::validation(request.with_caa_records),
        );

        info!(
            certificate_arn = certificate_arn,
            zone_id = %request.hosted_zone.id,
            changes = changes.len(),
            "Publishing validation records"
        );
        self.executor
            .apply_batch(&request.hosted_zone.id, &changes)
            .await?;
        Ok(())
    }

    /// Removes the validation records (and CAA records when declared)
    ///
    /// A certificate that no longer exists has nothing left to clean up.
    pub async fn delete_validation_records(
        &self,
        certificate_arn: &str,
        request: &CertificateRequest,
    ) -> Result<(), CertforgeError> {
        self.delete_records(
            certificate_arn,
            request,
            GenerationPolicy::validation(request.with_caa_records),
        )
        .await
    }

    pub async fn create_caa_records(
        &self,
        certificate_arn: &str,
        request: &CertificateRequest,
    ) -> Result<(), CertforgeError> {
        let options = self.current_options(certificate_arn).await?;
        let changes = generate(&options, ChangeAction::Upsert, GenerationPolicy::CAA_ONLY);
        self.executor
            .apply_batch(&request.hosted_zone.id, &changes)
            .await?;
        Ok(())
    }

    pub async fn delete_caa_records(
        &self,
        certificate_arn: &str,
        request: &CertificateRequest,
    ) -> Result<(), CertforgeError> {
        self.delete_records(certificate_arn, request, GenerationPolicy::CAA_ONLY)
            .await
    }

    async fn delete_records(
        &self,
        certificate_arn: &str,
        request: &CertificateRequest,
        policy: GenerationPolicy,
    ) -> Result<(), CertforgeError> {
        let options = match self.current_options(certificate_arn).await {
            Ok(options) => options,
            Err(CertforgeError::NotFound(_)) => {
                info!(
                    certificate_arn = certificate_arn,
                    "Certificate already gone, no records to delete"
                );
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let changes = generate(&options, ChangeAction::Delete, policy);
        info!(
            certificate_arn = certificate_arn,
            zone_id = %request.hosted_zone.id,
            changes = changes.len(),
            "Deleting certificate records"
        );
        self.executor
            .apply_with_fallback(&request.hosted_zone.id, &changes)
            .await
    }

    async fn current_options(
        &self,
        certificate_arn: &str,
    ) -> Result<Vec<DomainValidationOption>, CertforgeError> {
        Ok(self
            .authority
            .describe_certificate(certificate_arn)
            .await?
            .domain_validation_options)
    }

    /// Replaces every tag of the certificate with `tags`
    pub async fn update_tags(
        &self,
        certificate_arn: &str,
        tags: &[Tag],
    ) -> Result<(), CertforgeError> {
        let existing = self.authority.list_tags(certificate_arn).await?;
        if !existing.is_empty() {
            self.authority
                .remove_tags(certificate_arn, &existing)
                .await?;
        }
        if !tags.is_empty() {
            self.authority.add_tags(certificate_arn, tags).await?;
        }
        info!(
            certificate_arn = certificate_arn,
            removed = existing.len(),
            added = tags.len(),
            "Replaced certificate tags"
        );
        Ok(())
    }

    /// Applies an update, requesting a new certificate when the covered
    /// names, the region or the hosted zone changed
    pub async fn update(
        &self,
        stack_id: &str,
        certificate_arn: &str,
        old: &CertificateRequest,
        new: &CertificateRequest,
    ) -> Result<UpdateOutcome, CertforgeError> {
        if needs_replacement(stack_id, old, new) {
            info!(
                certificate_arn = certificate_arn,
                domain_name = %new.domain_name,
                "Certificate names or region changed, requesting a new certificate"
            );
            if is_certificate_arn(certificate_arn) {
                self.delete_validation_records(certificate_arn, old).await?;
            } else {
                warn!(
                    physical_resource_id = certificate_arn,
                    "Previous physical id is not a certificate, nothing to clean up"
                );
            }
            let replacement = self.create(new).await?;
            return Ok(UpdateOutcome::Replaced {
                certificate_arn: replacement,
            });
        }

        if !same_tag_set(&old.tags, &new.tags) {
            self.update_tags(certificate_arn, &new.tags).await?;
        }

        match (old.with_caa_records, new.with_caa_records) {
            (false, true) => self.create_caa_records(certificate_arn, new).await?,
            (true, false) => self.delete_caa_records(certificate_arn, old).await?,
            _ => {}
        }

        Ok(UpdateOutcome::UpdatedInPlace)
    }

    /// Deletes the certificate; a certificate that is already gone is fine
    pub async fn delete_certificate(&self, certificate_arn: &str) -> Result<(), CertforgeError> {
        match self.authority.delete_certificate(certificate_arn).await {
            Ok(()) => Ok(()),
            Err(CertforgeError::NotFound(_)) => {
                info!(certificate_arn = certificate_arn, "Certificate already deleted");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Whether an update needs a new certificate
///
/// The primary name, the set of alternative names, the effective region and
/// the hosted zone identify a certificate; tags and CAA records can change
/// in place.
pub fn needs_replacement(
    stack_id: &str,
    old: &CertificateRequest,
    new: &CertificateRequest,
) -> bool {
    old.domain_name != new.domain_name
        || !same_name_set(&old.subject_alternative_names, &new.subject_alternative_names)
        || !is_same_region(stack_id, old.region.as_deref(), new.region.as_deref())
        || old.hosted_zone != new.hosted_zone
}
