/// Lambda event structures: CloudFormation custom resource requests, the SNS
/// envelope they may arrive in, and the Step Functions check state
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// CloudFormation custom resource request
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CfnEvent {
    #[serde(rename = "RequestType")]
    pub request_type: RequestType,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    #[serde(rename = "StackId")]
    pub stack_id: String,
    #[serde(rename = "RequestId")]
    pub request_id: String,
    #[serde(rename = "ResourceType", default)]
    pub resource_type: String,
    #[serde(rename = "LogicalResourceId")]
    pub logical_resource_id: String,
    #[serde(
        rename = "PhysicalResourceId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub physical_resource_id: Option<String>,
    #[serde(rename = "ServiceToken", default, skip_serializing_if = "Option::is_none")]
    pub service_token: Option<String>,
    #[serde(rename = "ResourceProperties", default)]
    pub resource_properties: Value,
    #[serde(
        rename = "OldResourceProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub old_resource_properties: Option<Value>,
}

impl CfnEvent {
    /// The physical id CloudFormation knows for this resource, if any
    pub fn physical_id(&self) -> Option<&str> {
        self.physical_resource_id
            .as_deref()
            .filter(|id| !id.is_empty())
    }
}

/// SNS event delivered to Lambda
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnsEvent {
    #[serde(rename = "Records")]
    pub records: Vec<SnsRecord>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnsRecord {
    #[serde(rename = "EventSource", default)]
    pub event_source: String,
    #[serde(rename = "Sns")]
    pub sns: SnsMessage,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnsMessage {
    #[serde(rename = "MessageId")]
    pub message_id: String,
    #[serde(rename = "TopicArn", default)]
    pub topic_arn: String,
    /// The CloudFormation request, JSON encoded
    #[serde(rename = "Message")]
    pub message: String,
}

/// Inbound payload of the DnsCertificate Lambda: either an SNS envelope or a
/// request sent directly by CloudFormation
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InboundEvent {
    Sns(SnsEvent),
    Direct(Box<CfnEvent>),
}

/// One decoded delivery: the CloudFormation request and the identifier used
/// for duplicate detection
#[derive(Debug, Clone)]
pub struct Delivery {
    pub message_id: String,
    pub event: CfnEvent,
}

impl InboundEvent {
    /// Decodes every delivery; a record whose message cannot be decoded is
    /// returned as an error in place
    pub fn into_deliveries(self) -> Vec<Result<Delivery, serde_json::Error>> {
        match self {
            Self::Sns(sns) => sns
                .records
                .into_iter()
                .map(|record| {
                    serde_json::from_str::<CfnEvent>(&record.sns.message).map(|event| Delivery {
                        message_id: record.sns.message_id,
                        event,
                    })
                })
                .collect(),
            Self::Direct(event) => vec![Ok(Delivery {
                message_id: event.request_id.clone(),
                event: *event,
            })],
        }
    }
}

/// Step Functions state carried between two certificate checks
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckState {
    #[serde(flatten)]
    pub event: CfnEvent,
    #[serde(rename = "Round", default)]
    pub round: u32,
    /// True once a completion signal has been sent
    #[serde(rename = "IsComplete", default)]
    pub is_complete: bool,
}

impl CheckState {
    pub fn new(event: CfnEvent) -> Self {
        Self {
            event,
            round: 0,
            is_complete: false,
        }
    }
}
