/// Custom resource metrics published to CloudWatch
use crate::constants::METRICS_NAMESPACE;
use async_trait::async_trait;
use aws_sdk_cloudwatch::types::{Dimension, MetricDatum, StandardUnit};
use aws_smithy_types::error::display::DisplayErrorContext;
use std::time::SystemTime;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricUnit {
    Count,
    Milliseconds,
}

impl From<MetricUnit> for StandardUnit {
    fn from(unit: MetricUnit) -> Self {
        match unit {
            MetricUnit::Count => StandardUnit::Count,
            MetricUnit::Milliseconds => StandardUnit::Milliseconds,
        }
    }
}

/// One observation of a named metric
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub name: &'static str,
    pub value: f64,
    pub unit: MetricUnit,
    pub dimensions: Vec<(&'static str, String)>,
}

impl MetricSample {
    /// A single occurrence of an event
    pub fn count(name: &'static str) -> Self {
        Self {
            name,
            value: 1.0,
            unit: MetricUnit::Count,
            dimensions: Vec::new(),
        }
    }

    pub fn millis(name: &'static str, value: f64) -> Self {
        Self {
            name,
            value,
            unit: MetricUnit::Milliseconds,
            dimensions: Vec::new(),
        }
    }

    pub fn with_dimension(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.dimensions.push((key, value.into()));
        self
    }

    fn to_datum(&self) -> MetricDatum {
        let dimensions: Vec<Dimension> = self
            .dimensions
            .iter()
            .map(|(key, value)| Dimension::builder().name(*key).value(value).build())
            .collect();

        MetricDatum::builder()
            .metric_name(self.name)
            .value(self.value)
            .unit(self.unit.into())
            .timestamp(aws_smithy_types::DateTime::from(SystemTime::now()))
            .set_dimensions((!dimensions.is_empty()).then_some(dimensions))
            .build()
    }
}

/// Sink for metric samples; recording never fails the caller
#[async_trait]
pub trait MetricsService: Send + Sync {
    async fn record(&self, sample: MetricSample);
}

pub struct CloudWatchMetricsService {
    client: aws_sdk_cloudwatch::Client,
    namespace: String,
}

impl CloudWatchMetricsService {
    pub fn new(client: aws_sdk_cloudwatch::Client) -> Self {
        Self::with_namespace(client, METRICS_NAMESPACE.to_string())
    }

    pub fn with_namespace(client: aws_sdk_cloudwatch::Client, namespace: String) -> Self {
        Self { client, namespace }
    }
}

#[async_trait]
impl MetricsService for CloudWatchMetricsService {
    async fn record(&self, sample: MetricSample) {
        let result = self
            .client
            .put_metric_data()
            .namespace(&self.namespace)
            .metric_data(sample.to_datum())
            .send()
            .await;

        match result {
            Ok(_) => debug!(
                target: "metrics",
                metric = sample.name,
                value = sample.value,
                "Published metric"
            ),
            Err(e) => warn!(
                target: "metrics",
                metric = sample.name,
                error = %DisplayErrorContext(&e),
                "Failed to publish metric"
            ),
        }
    }
}

/// Metrics service used when `METRICS_ENABLED` is false
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetricsService;

#[async_trait]
impl MetricsService for NoopMetricsService {
    async fn record(&self, _sample: MetricSample) {}
}

/// The metrics the custom resources emit
pub struct Metrics;

impl Metrics {
    pub async fn certificate_requested(service: &dyn MetricsService) {
        service.record(MetricSample::count("CertificatesRequested")).await;
    }

    /// A redelivered SNS message that was ignored
    pub async fn duplicate_delivery_skipped(service: &dyn MetricsService, request_type: &str) {
        service
            .record(
                MetricSample::count("DuplicateDeliveriesSkipped")
                    .with_dimension("RequestType", request_type),
            )
            .await;
    }

    /// A change batch replayed record by record
    pub async fn dns_batch_fallback(service: &dyn MetricsService) {
        service.record(MetricSample::count("DnsBatchFallbacks")).await;
    }

    /// Time a change batch took to reach INSYNC
    pub async fn dns_propagated(service: &dyn MetricsService, duration_ms: f64) {
        service
            .record(MetricSample::millis("DnsPropagationTime", duration_ms))
            .await;
    }

    /// A response delivered to CloudFormation
    pub async fn completion_signalled(service: &dyn MetricsService, status: &str) {
        service
            .record(MetricSample::count("CompletionSignals").with_dimension("Status", status))
            .await;
    }
}

/// Metrics service keeping every sample in memory, for tests
#[derive(Default)]
pub struct MockMetricsService {
    samples: Mutex<Vec<MetricSample>>,
}

impl MockMetricsService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_metric_values(&self, name: &str) -> Vec<f64> {
        self.samples
            .lock()
            .await
            .iter()
            .filter(|sample| sample.name == name)
            .map(|sample| sample.value)
            .collect()
    }

    pub async fn samples(&self) -> Vec<MetricSample> {
        self.samples.lock().await.clone()
    }
}

#[async_trait]
impl MetricsService for MockMetricsService {
    async fn record(&self, sample: MetricSample) {
        self.samples.lock().await.push(sample);
    }
}
