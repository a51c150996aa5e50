/// Step Functions task polling a pending certificate until it is issued
///
/// Each invocation runs one round. The state machine loops (with a wait
/// state) while `IsComplete` is false.
use super::common::{fallback_physical_id, report_failure, report_success};
use crate::constants::CHECK_MAX_ROUNDS;
use crate::error::CertforgeError;
use crate::models::{CertificateStatus, CheckState, RequestType};
use crate::services::{
    AcmCertificateAuthority, CertificateAuthority, CloudWatchMetricsService, CompletionSignal,
    HttpCompletionSignal, MetricsService, NoopMetricsService, ProviderConfig,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Result of one check round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Issued,
    Pending,
    Failed(String),
}

pub struct CompletionChecker {
    pub authority: Arc<dyn CertificateAuthority>,
    pub signal: Arc<dyn CompletionSignal>,
    pub metrics: Arc<dyn MetricsService>,
    pub max_rounds: u32,
}

impl CompletionChecker {
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

        Ok(Self {
            authority: Arc::new(AcmCertificateAuthority::new(aws_config.clone())),
            signal: Arc::new(HttpCompletionSignal::new()?),
            metrics,
            max_rounds: CHECK_MAX_ROUNDS,
        })
    }

    pub async fn handle(&self, payload: Value) -> Result<Value, CertforgeError> {
        let state: CheckState = serde_json::from_value(payload).map_err(|e| {
            error!("Failed to parse check state: {}", e);
            CertforgeError::Event(format!("invalid check state: {}", e))
        })?;
        let state = self.check(state).await;
        Ok(serde_json::to_value(state)?)
    }

    /// Runs one round and returns the state for the next one
    ///
    /// A response lost to a transient failure leaves the state incomplete,
    /// so the next round evaluates and reports again. A rejected response,
    /// or any response once the round budget is spent, completes the state.
    #[tracing::instrument(
        name = "certificate_check.check",
        skip(self, state),
        fields(
            round = state.round,
            logical_resource_id = %state.event.logical_resource_id,
            physical_resource_id = ?state.event.physical_id()
        )
    )]
    pub async fn check(&self, mut state: CheckState) -> CheckState {
        let outcome = self.evaluate(&state).await;
        let physical_resource_id = state
            .event
            .physical_id()
            .map(str::to_string)
            .unwrap_or_else(|| fallback_physical_id(&state.event));

        let reported = match &outcome {
            CheckOutcome::Pending => {
                info!("Certificate not issued yet");
                state.round += 1;
                return state;
            }
            CheckOutcome::Issued => {
                info!("Certificate issued");
                report_success(
                    self.signal.as_ref(),
                    self.metrics.as_ref(),
                    &state.event,
                    &physical_resource_id,
                    Map::new(),
                )
                .await
            }
            CheckOutcome::Failed(reason) => {
                error!(reason = %reason, "Certificate check failed");
                report_failure(
                    self.signal.as_ref(),
                    self.metrics.as_ref(),
                    &state.event,
                    &physical_resource_id,
                    reason,
                )
                .await
            }
        };

        state.is_complete = match reported {
            Ok(()) => true,
            Err(e) if e.is_retriable() && state.round < self.max_rounds => {
                warn!(error = %e, "Response not delivered, reporting again next round");
                false
            }
            Err(e) => {
                error!(error = %e, "Response not delivered, giving up");
                true
            }
        };
        state.round += 1;
        state
    }

    pub async fn evaluate(&self, state: &CheckState) -> CheckOutcome {
        // nothing is pending after a delete
        if state.event.request_type == RequestType::Delete {
            return CheckOutcome::Issued;
        }
        let Some(certificate_arn) = state.event.physical_id() else {
            return CheckOutcome::Failed("no certificate to check".to_string());
        };
        if state.round >= self.max_rounds {
            return CheckOutcome::Failed(format!(
                "certificate {} did not stabilize",
                certificate_arn
            ));
        }

        match self.authority.describe_certificate(certificate_arn).await {
            Ok(description) => match description.status {
                CertificateStatus::Issued => CheckOutcome::Issued,
                CertificateStatus::PendingValidation => CheckOutcome::Pending,
                CertificateStatus::Other(status) => CheckOutcome::Failed(
                    CertforgeError::TerminalStatus {
                        certificate_arn: certificate_arn.to_string(),
                        status,
                    }
                    .to_string(),
                ),
            },
            Err(e) => CheckOutcome::Failed(format!("exception during checking: {}", e)),
        }
    }
}
