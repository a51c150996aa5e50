/// Logging setup and redaction helpers
///
/// CloudFormation response URLs are presigned S3 URLs; their query string is
/// a credential and must never reach the logs.
use tracing_subscriber::EnvFilter;
use url::Url;

/// Initializes the JSON tracing subscriber used by every Lambda binary
///
/// The filter comes from `RUST_LOG` and defaults to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .without_time() // CloudWatch adds the ingestion time
        .init();
}

/// Removes the query string (the presigned signature) from a response URL
///
/// # Examples
/// ```
/// use certforge_core::utils::logging::redact_response_url;
///
/// assert_eq!(
///     redact_response_url("https://cfn.s3.amazonaws.com/resp?X-Amz-Signature=abc"),
///     "https://cfn.s3.amazonaws.com/resp"
/// );
/// ```
pub fn redact_response_url(response_url: &str) -> String {
    match Url::parse(response_url) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => "[invalid url]".to_string(),
    }
}
