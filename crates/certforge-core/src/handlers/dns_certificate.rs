/// `DnsCertificate` custom resource handler
///
/// Requests arrive through SNS (which may deliver a message more than once)
/// or directly from CloudFormation. Create and replacement updates hand the
/// certificate over to the wait state machine; everything else completes
/// synchronously.
use super::common::{failure_physical_id, fallback_physical_id, report_failure, report_success};
use crate::certificate::{
    CertificateManager, DnsChangeExecutor, UpdateOutcome, resolve_certificate_request,
};
use crate::error::CertforgeError;
use crate::models::{CfnEvent, CheckState, Delivery, InboundEvent, RequestType};
use crate::services::{
    AcmCertificateAuthority, CloudFormationStacks, CloudWatchMetricsService, CompletionSignal,
    CompletionWaiter, DnsProvider, DynamoDbKeyValueStore, HttpCompletionSignal, IdempotencyGuard,
    KeyValueStore, Metrics, MetricsService, NoopMetricsService, ProviderConfig,
    Route53DnsProvider, SsmParameterStore, StackIntrospection, StepFunctionsWaiter,
};
use crate::utils::arn::is_certificate_arn;
use crate::utils::logging::redact_response_url;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{error, info, warn};

/// What happened to one delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// Handed over to the wait state machine, which sends the response
    Pending,
    /// Redelivery of a message already processed
    Skipped,
    Succeeded,
    Failed,
}

enum Dispatch {
    Pending,
    Skipped,
    Completed { physical_resource_id: String },
}

pub struct CertificateEventDispatcher {
    pub manager: CertificateManager,
    pub dns: Arc<dyn DnsProvider>,
    pub stacks: Arc<dyn StackIntrospection>,
    pub idempotency: IdempotencyGuard,
    pub waiter: Arc<dyn CompletionWaiter>,
    pub signal: Arc<dyn CompletionSignal>,
    pub metrics: Arc<dyn MetricsService>,
}

impl CertificateEventDispatcher {
    /// Wires the AWS implementations from a loaded SDK configuration
    pub fn from_aws(
        aws_config: &aws_config::SdkConfig,
        config: &ProviderConfig,
    ) -> Result<Self, CertforgeError> {
        let state_machine_arn = config.require_state_machine_arn()?.to_string();

        let metrics: Arc<dyn MetricsService> = if config.metrics_enabled {
            Arc::new(CloudWatchMetricsService::with_namespace(
                aws_sdk_cloudwatch::Client::new(aws_config),
                config.metrics_namespace.clone(),
            ))
        } else {
            Arc::new(NoopMetricsService)
        };
        let store: Arc<dyn KeyValueStore> = match &config.idempotency_table {
            Some(table) => Arc::new(DynamoDbKeyValueStore::new(
                aws_sdk_dynamodb::Client::new(aws_config),
                table.clone(),
            )),
            None => Arc::new(SsmParameterStore::new(aws_sdk_ssm::Client::new(aws_config))),
        };
        let dns: Arc<dyn DnsProvider> = Arc::new(Route53DnsProvider::new(
            aws_sdk_route53::Client::new(aws_config),
        ));
        let manager = CertificateManager::new(
            Arc::new(AcmCertificateAuthority::new(aws_config.clone())),
            DnsChangeExecutor::new(dns.clone(), metrics.clone(), config.poll),
            metrics.clone(),
            config.poll,
        );

        Ok(Self {
            manager,
            dns,
            stacks: Arc::new(CloudFormationStacks::new(
                aws_sdk_cloudformation::Client::new(aws_config),
            )),
            idempotency: IdempotencyGuard::new(store, config.parameter_prefix.clone()),
            waiter: Arc::new(StepFunctionsWaiter::new(
                aws_sdk_sfn::Client::new(aws_config),
                state_machine_arn,
            )),
            signal: Arc::new(HttpCompletionSignal::new()?),
            metrics,
        })
    }

    /// Processes every delivery of the Lambda payload and summarises the
    /// outcomes
    ///
    /// Failures are reported to CloudFormation, never to the Lambda runtime:
    /// an error result would make SNS redeliver the message.
    pub async fn handle(&self, payload: Value) -> Result<Value, CertforgeError> {
        let inbound: InboundEvent = serde_json::from_value(payload).map_err(|e| {
            error!("Failed to parse DnsCertificate event: {}", e);
            CertforgeError::Event(format!("unsupported event: {}", e))
        })?;

        let mut deliveries = Vec::new();
        for delivery in inbound.into_deliveries() {
            match delivery {
                Ok(delivery) => {
                    let message_id = delivery.message_id.clone();
                    let outcome = self.process(delivery).await;
                    deliveries.push(json!({ "messageId": message_id, "outcome": outcome }));
                }
                Err(e) => {
                    // without a decodable request there is no response URL
                    error!(error = %e, "Dropping undecodable SNS message");
                    deliveries.push(json!({
                        "outcome": DeliveryOutcome::Failed,
                        "error": e.to_string()
                    }));
                }
            }
        }

        Ok(json!({ "deliveries": deliveries }))
    }

    #[tracing::instrument(
        name = "dns_certificate.process",
        skip(self, delivery),
        fields(
            message_id = %delivery.message_id,
            request_type = %delivery.event.request_type,
            stack_id = %delivery.event.stack_id,
            logical_resource_id = %delivery.event.logical_resource_id
        )
    )]
    pub async fn process(&self, delivery: Delivery) -> DeliveryOutcome {
        let Delivery { message_id, event } = delivery;
        info!(
            response_url = %redact_response_url(&event.response_url),
            "Processing custom resource request"
        );

        match self.dispatch(&message_id, &event).await {
            Ok(Dispatch::Pending) => DeliveryOutcome::Pending,
            Ok(Dispatch::Skipped) => DeliveryOutcome::Skipped,
            Ok(Dispatch::Completed {
                physical_resource_id,
            }) => {
                match report_success(
                    self.signal.as_ref(),
                    self.metrics.as_ref(),
                    &event,
                    &physical_resource_id,
                    Map::new(),
                )
                .await
                {
                    Ok(()) => DeliveryOutcome::Succeeded,
                    Err(_) => DeliveryOutcome::Failed,
                }
            }
            Err(e) => {
                let physical_resource_id = failure_physical_id(&event, &e);
                error!(
                    error = %e,
                    physical_resource_id = %physical_resource_id,
                    "Custom resource request failed"
                );
                // a failed signal is already logged; nothing else can be done
                let _ = report_failure(
                    self.signal.as_ref(),
                    self.metrics.as_ref(),
                    &event,
                    &physical_resource_id,
                    &e.to_string(),
                )
                .await;
                DeliveryOutcome::Failed
            }
        }
    }

    async fn dispatch(
        &self,
        message_id: &str,
        event: &CfnEvent,
    ) -> Result<Dispatch, CertforgeError> {
        match event.request_type {
            RequestType::Create => {
                if self.is_duplicate(message_id, event).await? {
                    return Ok(Dispatch::Skipped);
                }
                self.create(message_id, event).await
            }
            RequestType::Update => {
                if self.is_duplicate(message_id, event).await? {
                    return Ok(Dispatch::Skipped);
                }
                self.update(message_id, event).await
            }
            RequestType::Delete => self.delete(event).await,
            RequestType::Unknown => Err(CertforgeError::Event(
                "unsupported request type".to_string(),
            )),
        }
    }

    async fn is_duplicate(
        &self,
        message_id: &str,
        event: &CfnEvent,
    ) -> Result<bool, CertforgeError> {
        let skip = self
            .idempotency
            .should_skip(&event.stack_id, &event.logical_resource_id, message_id)
            .await?;
        if skip {
            Metrics::duplicate_delivery_skipped(
                self.metrics.as_ref(),
                &event.request_type.to_string(),
            )
            .await;
        }
        Ok(skip)
    }

    async fn create(&self, message_id: &str, event: &CfnEvent) -> Result<Dispatch, CertforgeError> {
        let request =
            resolve_certificate_request(self.dns.as_ref(), &event.resource_properties).await?;
        let certificate_arn = self.manager.create(&request).await?;
        self.hand_off(message_id, event, &certificate_arn)
            .await
            .map_err(|e| CertforgeError::partially_created(&certificate_arn, e))?;
        Ok(Dispatch::Pending)
    }

    async fn update(&self, message_id: &str, event: &CfnEvent) -> Result<Dispatch, CertforgeError> {
        let physical_resource_id = event.physical_id().ok_or_else(|| {
            CertforgeError::Event("update without PhysicalResourceId".to_string())
        })?;
        let old_properties = event.old_resource_properties.as_ref().ok_or_else(|| {
            CertforgeError::Event("update without OldResourceProperties".to_string())
        })?;

        let new = resolve_certificate_request(self.dns.as_ref(), &event.resource_properties).await?;
        let old = resolve_certificate_request(self.dns.as_ref(), old_properties).await?;

        match self
            .manager
            .update(&event.stack_id, physical_resource_id, &old, &new)
            .await?
        {
            UpdateOutcome::Replaced { certificate_arn } => {
                self.hand_off(message_id, event, &certificate_arn)
                    .await
                    .map_err(|e| CertforgeError::partially_created(&certificate_arn, e))?;
                Ok(Dispatch::Pending)
            }
            UpdateOutcome::UpdatedInPlace => Ok(Dispatch::Completed {
                physical_resource_id: physical_resource_id.to_string(),
            }),
        }
    }

    async fn delete(&self, event: &CfnEvent) -> Result<Dispatch, CertforgeError> {
        let Some(certificate_arn) = event.physical_id().filter(|id| is_certificate_arn(id)) else {
            info!(
                physical_resource_id = ?event.physical_id(),
                "Physical id is not a certificate, nothing to delete"
            );
            return Ok(Dispatch::Completed {
                physical_resource_id: event
                    .physical_id()
                    .map(str::to_string)
                    .unwrap_or_else(|| fallback_physical_id(event)),
            });
        };

        let request =
            resolve_certificate_request(self.dns.as_ref(), &event.resource_properties).await?;

        if self.is_being_replaced(event, certificate_arn).await? {
            info!(
                certificate_arn = certificate_arn,
                "Certificate was replaced, its records were cleaned up by the update"
            );
        } else {
            self.manager
                .delete_validation_records(certificate_arn, &request)
                .await?;
            self.idempotency
                .forget(&event.stack_id, &event.logical_resource_id)
                .await?;
        }

        self.manager.delete_certificate(certificate_arn).await?;
        info!(certificate_arn = certificate_arn, "Deleted certificate");
        Ok(Dispatch::Completed {
            physical_resource_id: certificate_arn.to_string(),
        })
    }

    /// Whether the stack still holds another certificate for this logical
    /// resource, i.e. this delete is the cleanup of an update replacement
    ///
    /// Best effort: the stack may change between this read and the deletion.
    async fn is_being_replaced(
        &self,
        event: &CfnEvent,
        certificate_arn: &str,
    ) -> Result<bool, CertforgeError> {
        match self
            .stacks
            .physical_resource_id(&event.stack_id, &event.logical_resource_id)
            .await
        {
            Ok(Some(current)) => Ok(current != certificate_arn),
            Ok(None) => Ok(false),
            Err(CertforgeError::NotFound(reason)) => {
                warn!(reason = %reason, "Stack resource not found, treating as deleted");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn hand_off(
        &self,
        message_id: &str,
        event: &CfnEvent,
        certificate_arn: &str,
    ) -> Result<(), CertforgeError> {
        let mut pending = event.clone();
        pending.physical_resource_id = Some(certificate_arn.to_string());
        self.waiter
            .start_wait(message_id, &CheckState::new(pending))
            .await?;
        info!(
            certificate_arn = certificate_arn,
            "Certificate handed over to the completion checker"
        );
        Ok(())
    }
}
