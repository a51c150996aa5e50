/// CloudFormation custom resource response body
use super::events::CfnEvent;
use crate::constants::MAX_REASON_LENGTH;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use typed_builder::TypedBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, TypedBuilder)]
pub struct CompletionResponse {
    #[serde(rename = "Status")]
    pub status: ResponseStatus,
    #[serde(rename = "Reason")]
    #[builder(default, setter(into))]
    pub reason: String,
    #[serde(rename = "PhysicalResourceId")]
    #[builder(setter(into))]
    pub physical_resource_id: String,
    #[serde(rename = "StackId")]
    #[builder(setter(into))]
    pub stack_id: String,
    #[serde(rename = "RequestId")]
    #[builder(setter(into))]
    pub request_id: String,
    #[serde(rename = "LogicalResourceId")]
    #[builder(setter(into))]
    pub logical_resource_id: String,
    #[serde(rename = "NoEcho")]
    #[builder(default)]
    pub no_echo: bool,
    #[serde(rename = "Data")]
    #[builder(default)]
    pub data: Map<String, Value>,
}

impl CompletionResponse {
    pub fn success(event: &CfnEvent, physical_resource_id: &str, data: Map<String, Value>) -> Self {
        Self::builder()
            .status(ResponseStatus::Success)
            .physical_resource_id(physical_resource_id)
            .stack_id(event.stack_id.as_str())
            .request_id(event.request_id.as_str())
            .logical_resource_id(event.logical_resource_id.as_str())
            .data(data)
            .build()
    }

    pub fn failed(event: &CfnEvent, physical_resource_id: &str, reason: &str) -> Self {
        Self::builder()
            .status(ResponseStatus::Failed)
            .reason(truncate_reason(reason))
            .physical_resource_id(physical_resource_id)
            .stack_id(event.stack_id.as_str())
            .request_id(event.request_id.as_str())
            .logical_resource_id(event.logical_resource_id.as_str())
            .build()
    }
}

fn truncate_reason(reason: &str) -> String {
    if reason.chars().count() <= MAX_REASON_LENGTH {
        reason.to_string()
    } else {
        let mut truncated: String = reason.chars().take(MAX_REASON_LENGTH - 3).collect();
        truncated.push_str("...");
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::events::RequestType;

    fn event() -> CfnEvent {
        CfnEvent {
            request_type: RequestType::Delete,
            response_url: "https://example.com/response".to_string(),
            stack_id: "arn:aws:cloudformation:eu-west-1:999999999999:stack/s/g".to_string(),
            request_id: "req-1".to_string(),
            resource_type: "Custom::DnsCertificate".to_string(),
            logical_resource_id: "Certificate".to_string(),
            physical_resource_id: Some(
                "arn:aws:acm:eu-west-1:999999999999:certificate/abc".to_string(),
            ),
            service_token: None,
            resource_properties: Value::Null,
            old_resource_properties: None,
        }
    }

    #[test]
    fn test_success_body_shape() {
        let response = CompletionResponse::success(&event(), "phys-1", Map::new());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["Status"], "SUCCESS");
        assert_eq!(json["PhysicalResourceId"], "phys-1");
        assert_eq!(json["StackId"], "arn:aws:cloudformation:eu-west-1:999999999999:stack/s/g");
        assert_eq!(json["RequestId"], "req-1");
        assert_eq!(json["LogicalResourceId"], "Certificate");
        assert_eq!(json["Reason"], "");
        assert!(json["Data"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_failed_reason_is_truncated() {
        let reason = "x".repeat(5000);
        let response = CompletionResponse::failed(&event(), "phys-1", &reason);
        assert_eq!(response.status, ResponseStatus::Failed);
        assert_eq!(response.reason.chars().count(), MAX_REASON_LENGTH);
        assert!(response.reason.ends_with("..."));
    }
}
