/// Exponential backoff for transient provider and response failures
use crate::constants::{MAX_RETRIES, RETRY_BASE_DELAY_MS, RETRY_JITTER_FACTOR, RETRY_MAX_DELAY_MS};
use crate::error::CertforgeError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Relative spread applied to every delay, `0.1` is +/- 10%
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(MAX_RETRIES, RETRY_BASE_DELAY_MS, RETRY_MAX_DELAY_MS)
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(base_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
            jitter_factor: RETRY_JITTER_FACTOR,
        }
    }

    /// Delay before retry number `retry` (zero based): the base delay
    /// doubled per retry, capped, then jittered
    pub fn delay_for(&self, retry: u32) -> Duration {
        let doubled = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(retry.min(31)));
        let capped = doubled.min(self.max_delay);

        let spread = (rand::random::<f64>() * 2.0 - 1.0) * self.jitter_factor;
        let jittered_ms = (capped.as_millis() as f64 * (1.0 + spread)).max(0.0);
        Duration::from_millis(jittered_ms as u64)
    }
}

/// Runs `operation` until it succeeds, fails with a non-retriable error or
/// the retry budget is spent
///
/// The last error is returned as is, so callers can still match on its
/// variant.
///
/// # Example
/// ```ignore
/// retry_with_backoff("cfn_response", &RetryConfig::default(), || {
///     signal.put(url, &body)
/// })
/// .await?;
/// ```
pub async fn retry_with_backoff<F, Fut, T>(
    operation_name: &str,
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, CertforgeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CertforgeError>>,
{
    let mut retries = 0;

    loop {
        let error = match operation().await {
            Ok(value) => {
                if retries > 0 {
                    debug!(
                        operation = operation_name,
                        retries = retries,
                        "Succeeded after retrying"
                    );
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if !error.is_retriable() || retries >= config.max_retries {
            warn!(
                operation = operation_name,
                retries = retries,
                retriable = error.is_retriable(),
                error = %error,
                "Giving up"
            );
            return Err(error);
        }

        let delay = config.delay_for(retries);
        warn!(
            operation = operation_name,
            retry = retries + 1,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Transient failure, backing off"
        );
        tokio::time::sleep(delay).await;
        retries += 1;
    }
}
