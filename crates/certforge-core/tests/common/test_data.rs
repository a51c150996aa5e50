/// Test data builders and helpers
use serde_json::{Value, json};

pub const STACK_ID: &str =
    "arn:aws:cloudformation:eu-west-1:123456789012:stack/web-stack/0e6bb3a0-1111-2222";
pub const ZONE_ID: &str = "Z0EXAMPLE";
pub const ZONE_NAME: &str = "codesmith.ch.";
pub const OTHER_ZONE_ID: &str = "Z0OTHER";
pub const OTHER_ZONE_NAME: &str = "example.org.";
pub const RESPONSE_URL: &str =
    "https://cloudformation-custom-resource-response-euwest1.s3.amazonaws.com/resp?X-Amz-Signature=abc";

/// Build `DnsCertificate` properties in the given hosted zone
pub fn certificate_properties(domain: &str, sans: &[&str], zone_name: &str) -> Value {
    json!({
        "ServiceToken": "arn:aws:sns:eu-west-1:123456789012:certforge",
        "DomainName": domain,
        "SubjectAlternativeNames": sans,
        "HostedZoneName": zone_name,
        "Tags": [{"Key": "team", "Value": "web"}]
    })
}

/// Build a CloudFormation custom resource request
pub fn cfn_event(
    request_type: &str,
    request_id: &str,
    properties: Value,
    physical_id: Option<&str>,
) -> Value {
    let mut event = json!({
        "RequestType": request_type,
        "ResponseURL": RESPONSE_URL,
        "StackId": STACK_ID,
        "RequestId": request_id,
        "ResourceType": "Custom::DnsCertificate",
        "LogicalResourceId": "Certificate",
        "ResourceProperties": properties
    });
    if let Some(physical_id) = physical_id {
        event["PhysicalResourceId"] = json!(physical_id);
    }
    event
}

/// Wrap a request in the SNS envelope Lambda receives
pub fn sns_envelope(message_id: &str, event: &Value) -> Value {
    json!({
        "Records": [{
            "EventSource": "aws:sns",
            "Sns": {
                "MessageId": message_id,
                "TopicArn": "arn:aws:sns:eu-west-1:123456789012:certforge",
                "Message": event.to_string()
            }
        }]
    })
}
