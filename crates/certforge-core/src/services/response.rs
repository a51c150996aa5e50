/// Delivery of custom resource responses to CloudFormation
use crate::error::CertforgeError;
use crate::models::CompletionResponse;
use crate::utils::logging::redact_response_url;
use crate::utils::retry::{RetryConfig, retry_with_backoff};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::info;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionSignal: Send + Sync {
    /// Delivers the response to the presigned response URL of the request
    async fn send(
        &self,
        response_url: &str,
        response: &CompletionResponse,
    ) -> Result<(), CertforgeError>;
}

/// HTTP PUT of the JSON response body
///
/// The presigned URL is signed without a content type, so the request sends
/// an empty one.
pub struct HttpCompletionSignal {
    client: reqwest::Client,
    retry: RetryConfig,
}

impl HttpCompletionSignal {
    pub fn new() -> Result<Self, CertforgeError> {
        Self::with_retry(RetryConfig::default())
    }

    pub fn with_retry(retry: RetryConfig) -> Result<Self, CertforgeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CertforgeError::Config(format!("could not build HTTP client: {}", e)))?;
        Ok(Self { client, retry })
    }

    async fn put(&self, response_url: &str, body: &str) -> Result<(), CertforgeError> {
        let response = self
            .client
            .put(response_url)
            .header(CONTENT_TYPE, "")
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| CertforgeError::Response(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status.is_server_error() {
            Err(CertforgeError::Response(format!(
                "response rejected with status {}",
                status
            )))
        } else {
            // an expired or tampered URL will not get better
            Err(CertforgeError::Event(format!(
                "response rejected with status {}",
                status
            )))
        }
    }
}

#[async_trait]
impl CompletionSignal for HttpCompletionSignal {
    async fn send(
        &self,
        response_url: &str,
        response: &CompletionResponse,
    ) -> Result<(), CertforgeError> {
        let body = serde_json::to_string(response)?;

        retry_with_backoff("cfn_response", &self.retry, || self.put(response_url, &body))
            .await?;

        info!(
            status = response.status.as_str(),
            physical_resource_id = %response.physical_resource_id,
            logical_resource_id = %response.logical_resource_id,
            response_url = %redact_response_url(response_url),
            "Sent response to CloudFormation"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResponseStatus;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn response() -> CompletionResponse {
        CompletionResponse::builder()
            .status(ResponseStatus::Success)
            .physical_resource_id("arn:aws:acm:eu-west-1:999999999999:certificate/abc")
            .stack_id("arn:aws:cloudformation:eu-west-1:999999999999:stack/s/g")
            .request_id("req-1")
            .logical_resource_id("Certificate")
            .build()
    }

    fn signal() -> HttpCompletionSignal {
        HttpCompletionSignal::with_retry(RetryConfig::new(2, 1, 5)).unwrap()
    }

    #[tokio::test]
    async fn test_put_response_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/response"))
            .and(body_partial_json(serde_json::json!({
                "Status": "SUCCESS",
                "RequestId": "req-1",
                "LogicalResourceId": "Certificate"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/response?X-Amz-Signature=secret", server.uri());
        signal().send(&url, &response()).await.unwrap();
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let url = format!("{}/response", server.uri());
        let err = signal().send(&url, &response()).await.unwrap_err();
        assert!(matches!(err, CertforgeError::Response(_)));
    }

    #[tokio::test]
    async fn test_forbidden_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/response", server.uri());
        let err = signal().send(&url, &response()).await.unwrap_err();
        assert!(!err.is_retriable());
    }
}
