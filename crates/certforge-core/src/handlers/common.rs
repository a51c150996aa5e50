/// Completion reporting shared by the custom resource handlers
use crate::constants::FAILED_PHYSICAL_ID_PREFIX;
use crate::error::CertforgeError;
use crate::models::{CfnEvent, CompletionResponse};
use crate::services::{CompletionSignal, Metrics, MetricsService};
use serde_json::{Map, Value};
use tracing::{error, info};

/// Physical id reported when nothing was ever allocated for the resource
pub fn fallback_physical_id(event: &CfnEvent) -> String {
    format!("{}-{}", FAILED_PHYSICAL_ID_PREFIX, event.request_id)
}

/// Physical id to report with a failure
///
/// An ARN allocated before the failure wins, then the id CloudFormation
/// already knows, then the fallback id.
pub fn failure_physical_id(event: &CfnEvent, error: &CertforgeError) -> String {
    error
        .certificate_arn()
        .or_else(|| event.physical_id())
        .map(str::to_string)
        .unwrap_or_else(|| fallback_physical_id(event))
}

pub async fn report_success(
    signal: &dyn CompletionSignal,
    metrics: &dyn MetricsService,
    event: &CfnEvent,
    physical_resource_id: &str,
    data: Map<String, Value>,
) -> Result<(), CertforgeError> {
    let response = CompletionResponse::success(event, physical_resource_id, data);
    deliver(signal, metrics, event, &response).await
}

pub async fn report_failure(
    signal: &dyn CompletionSignal,
    metrics: &dyn MetricsService,
    event: &CfnEvent,
    physical_resource_id: &str,
    reason: &str,
) -> Result<(), CertforgeError> {
    let response = CompletionResponse::failed(event, physical_resource_id, reason);
    deliver(signal, metrics, event, &response).await
}

async fn deliver(
    signal: &dyn CompletionSignal,
    metrics: &dyn MetricsService,
    event: &CfnEvent,
    response: &CompletionResponse,
) -> Result<(), CertforgeError> {
    match signal.send(&event.response_url, response).await {
        Ok(()) => {
            info!(
                request_type = %event.request_type,
                logical_resource_id = %event.logical_resource_id,
                status = response.status.as_str(),
                "Reported completion"
            );
            Metrics::completion_signalled(metrics, response.status.as_str()).await;
            Ok(())
        }
        Err(e) => {
            error!(
                request_type = %event.request_type,
                logical_resource_id = %event.logical_resource_id,
                status = response.status.as_str(),
                error = %e,
                "Failed to report completion"
            );
            Err(e)
        }
    }
}
