/// `DnsCertificateRecordSetGroup` custom resource handler
///
/// Publishes the validation (and CAA) records of an existing certificate in a
/// hosted zone, for certificates requested outside of the stack or in
/// another account. Runs synchronously: the response is sent before the
/// invocation returns.
use super::common::{failure_physical_id, fallback_physical_id, report_failure, report_success};
use crate::certificate::domain::is_subdomain;
use crate::certificate::{DnsChangeExecutor, GenerationPolicy, generate, resolve_hosted_zone};
use crate::constants::FAILED_PHYSICAL_ID_PREFIX;
use crate::error::CertforgeError;
use crate::models::{
    CfnEvent, ChangeAction, DnsChange, HostedZone, RecordSetGroupProperties, RequestType,
};
use crate::services::{
    AcmCertificateAuthority, CertificateAuthority, CloudWatchMetricsService, CompletionSignal,
    DnsProvider, HttpCompletionSignal, MetricsService, NoopMetricsService, ProviderConfig,
    Route53DnsProvider,
};
use crate::utils::logging::redact_response_url;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Record set group properties with the hosted zone resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSetGroup {
    pub certificate_arn: String,
    pub hosted_zone: HostedZone,
    pub with_caa_records: bool,
}

impl RecordSetGroup {
    /// Whether an update only toggles the CAA records
    pub fn is_caa_toggle(&self, new: &RecordSetGroup) -> bool {
        self.certificate_arn == new.certificate_arn
            && self.hosted_zone == new.hosted_zone
            && self.with_caa_records != new.with_caa_records
    }
}

pub struct RecordSetGroupHandler {
    pub authority: Arc<dyn CertificateAuthority>,
    pub dns: Arc<dyn DnsProvider>,
    pub executor: DnsChangeExecutor,
    pub signal: Arc<dyn CompletionSignal>,
    pub metrics: Arc<dyn MetricsService>,
}

impl RecordSetGroupHandler {
    pub fn from_aws(
        aws_config: &aws_config::SdkConfig,
        config: &ProviderConfig,
    ) -> Result<Self, CertforgeError> {
        let metrics: Arc<dyn MetricsService> = if config.metrics_enabled {
            Arc::new(CloudWatchMetricsService::with_namespace(
                aws_sdk_cloudwatch::Client::new(aws_config),
                config.metrics_namespace.clone(),
            ))
        } else {
            Arc::new(NoopMetricsService)
        };
        let dns: Arc<dyn DnsProvider> = Arc::new(Route53DnsProvider::new(
            aws_sdk_route53::Client::new(aws_config),
        ));

        Ok(Self {
            authority: Arc::new(AcmCertificateAuthority::new(aws_config.clone())),
            executor: DnsChangeExecutor::new(dns.clone(), metrics.clone(), config.poll),
            dns,
            signal: Arc::new(HttpCompletionSignal::new()?),
            metrics,
        })
    }

    /// Processes the request and reports the outcome to CloudFormation
    pub async fn handle(&self, payload: Value) -> Result<Value, CertforgeError> {
        let event: CfnEvent = serde_json::from_value(payload).map_err(|e| {
            error!("Failed to parse RecordSetGroup event: {}", e);
            CertforgeError::Event(format!("unsupported event: {}", e))
        })?;
        info!(
            request_type = %event.request_type,
            logical_resource_id = %event.logical_resource_id,
            response_url = %redact_response_url(&event.response_url),
            "Processing custom resource request"
        );

        let (status, physical_resource_id, reported) = match self.process(&event).await {
            Ok(physical_resource_id) => {
                let reported = report_success(
                    self.signal.as_ref(),
                    self.metrics.as_ref(),
                    &event,
                    &physical_resource_id,
                    Map::new(),
                )
                .await;
                ("SUCCESS", physical_resource_id, reported)
            }
            Err(e) => {
                let physical_resource_id = failure_physical_id(&event, &e);
                error!(error = %e, "Record set group request failed");
                let reported = report_failure(
                    self.signal.as_ref(),
                    self.metrics.as_ref(),
                    &event,
                    &physical_resource_id,
                    &e.to_string(),
                )
                .await;
                ("FAILED", physical_resource_id, reported)
            }
        };

        // a lost response leaves the stack waiting; let Lambda retry the
        // invocation
        reported?;
        Ok(json!({ "status": status, "physicalResourceId": physical_resource_id }))
    }

    /// Runs the request and returns the physical id to report
    pub async fn process(&self, event: &CfnEvent) -> Result<String, CertforgeError> {
        match event.request_type {
            RequestType::Create => {
                let group = self.resolve(&event.resource_properties).await?;
                self.create_group(event, &group).await
            }
            RequestType::Update => {
                let physical_resource_id = event
                    .physical_id()
                    .map(str::to_string)
                    .unwrap_or_else(|| fallback_physical_id(event));
                let old_properties = event.old_resource_properties.as_ref().ok_or_else(|| {
                    CertforgeError::Event("update without OldResourceProperties".to_string())
                })?;
                let new = self.resolve(&event.resource_properties).await?;
                let old = self.resolve(old_properties).await?;

                if old == new {
                    debug!("Record set group unchanged");
                    Ok(physical_resource_id)
                } else if old.is_caa_toggle(&new) {
                    if new.with_caa_records {
                        self.create_caa_records(&new).await?;
                    } else {
                        self.delete_caa_records(&new).await?;
                    }
                    Ok(physical_resource_id)
                } else {
                    self.create_group(event, &new).await
                }
            }
            RequestType::Delete => {
                let physical_resource_id = event
                    .physical_id()
                    .map(str::to_string)
                    .unwrap_or_else(|| fallback_physical_id(event));
                if physical_resource_id.starts_with(FAILED_PHYSICAL_ID_PREFIX) {
                    info!("Record set group was never created, nothing to delete");
                    return Ok(physical_resource_id);
                }
                let group = self.resolve(&event.resource_properties).await?;
                self.delete_group(&group).await?;
                Ok(physical_resource_id)
            }
            RequestType::Unknown => Err(CertforgeError::Event(
                "unsupported request type".to_string(),
            )),
        }
    }

    async fn resolve(&self, properties: &Value) -> Result<RecordSetGroup, CertforgeError> {
        let properties = RecordSetGroupProperties::decode(properties)?;
        let hosted_zone =
            resolve_hosted_zone(self.dns.as_ref(), &properties.hosted_zone_ref()?).await?;
        Ok(RecordSetGroup {
            with_caa_records: properties.with_caa_records(),
            certificate_arn: properties.certificate_arn,
            hosted_zone,
        })
    }

    /// Changes for the domains of the certificate that live in the group's
    /// hosted zone
    async fn changes(
        &self,
        group: &RecordSetGroup,
        action: ChangeAction,
        policy: GenerationPolicy,
    ) -> Result<Vec<DnsChange>, CertforgeError> {
        let description = self
            .authority
            .describe_certificate(&group.certificate_arn)
            .await?;
        let options: Vec<_> = description
            .domain_validation_options
            .into_iter()
            .filter(|option| is_subdomain(&option.domain_name, &group.hosted_zone.name))
            .collect();
        Ok(generate(&options, action, policy))
    }

    async fn create_group(
        &self,
        event: &CfnEvent,
        group: &RecordSetGroup,
    ) -> Result<String, CertforgeError> {
        let changes = self
            .changes(
                group,
                ChangeAction::Upsert,
                GenerationPolicy::validation(group.with_caa_records),
            )
            .await?;
        let receipt = self
            .executor
            .apply_batch(&group.hosted_zone.id, &changes)
            .await?;

        let physical_resource_id = receipt
            .map(|receipt| receipt.id)
            .unwrap_or_else(|| fallback_physical_id(event));
        info!(
            certificate_arn = %group.certificate_arn,
            zone_id = %group.hosted_zone.id,
            physical_resource_id = %physical_resource_id,
            "Published record set group"
        );
        Ok(physical_resource_id)
    }

    async fn delete_group(&self, group: &RecordSetGroup) -> Result<(), CertforgeError> {
        let changes = self
            .changes(
                group,
                ChangeAction::Delete,
                GenerationPolicy::validation(group.with_caa_records),
            )
            .await?;
        self.executor
            .apply_with_fallback(&group.hosted_zone.id, &changes)
            .await
    }

    async fn create_caa_records(&self, group: &RecordSetGroup) -> Result<(), CertforgeError> {
        let changes = self
            .changes(group, ChangeAction::Upsert, GenerationPolicy::CAA_ONLY)
            .await?;
        self.executor
            .apply_batch(&group.hosted_zone.id, &changes)
            .await?;
        Ok(())
    }

    async fn delete_caa_records(&self, group: &RecordSetGroup) -> Result<(), CertforgeError> {
        let changes = self
            .changes(group, ChangeAction::Delete, GenerationPolicy::CAA_ONLY)
            .await?;
        self.executor
            .apply_with_fallback(&group.hosted_zone.id, &changes)
            .await
    }
}
