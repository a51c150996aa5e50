//! Common test utilities and helpers for integration tests
#![allow(dead_code)]

pub mod mock_aws;
pub mod test_data;

use certforge_core::certificate::{CertificateManager, DnsChangeExecutor};
use certforge_core::handlers::{
    CertificateEventDispatcher, CompletionChecker, RecordSetGroupHandler,
};
use certforge_core::services::{
    DnsProvider, IdempotencyGuard, InMemoryKeyValueStore, MetricsService, MockMetricsService,
};
use certforge_core::utils::poll::PollSettings;
use mock_aws::{MockAcm, MockRoute53, MockSignal, MockStacks, MockWaiter};
use std::sync::Arc;

/// Every fake behind the handlers, shared so tests can inspect them
pub struct TestEnv {
    pub acm: Arc<MockAcm>,
    pub route53: Arc<MockRoute53>,
    pub stacks: Arc<MockStacks>,
    pub waiter: Arc<MockWaiter>,
    pub signal: Arc<MockSignal>,
    pub metrics: Arc<MockMetricsService>,
    pub store: Arc<InMemoryKeyValueStore>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            acm: Arc::new(MockAcm::new()),
            route53: Arc::new(MockRoute53::with_zones(&[
                (test_data::ZONE_ID, test_data::ZONE_NAME),
                (test_data::OTHER_ZONE_ID, test_data::OTHER_ZONE_NAME),
            ])),
            stacks: Arc::new(MockStacks::new()),
            waiter: Arc::new(MockWaiter::new()),
            signal: Arc::new(MockSignal::new()),
            metrics: Arc::new(MockMetricsService::new()),
            store: Arc::new(InMemoryKeyValueStore::new()),
        }
    }

    fn poll() -> PollSettings {
        PollSettings::immediate(5)
    }

    fn executor(&self) -> DnsChangeExecutor {
        let dns: Arc<dyn DnsProvider> = self.route53.clone();
        let metrics: Arc<dyn MetricsService> = self.metrics.clone();
        DnsChangeExecutor::new(dns, metrics, Self::poll())
    }

    pub fn dispatcher(&self) -> CertificateEventDispatcher {
        CertificateEventDispatcher {
            manager: CertificateManager::new(
                self.acm.clone(),
                self.executor(),
                self.metrics.clone(),
                Self::poll(),
            ),
            dns: self.route53.clone(),
            stacks: self.stacks.clone(),
            idempotency: IdempotencyGuard::with_default_prefix(self.store.clone()),
            waiter: self.waiter.clone(),
            signal: self.signal.clone(),
            metrics: self.metrics.clone(),
        }
    }

    pub fn checker(&self, max_rounds: u32) -> CompletionChecker {
        CompletionChecker {
            authority: self.acm.clone(),
            signal: self.signal.clone(),
            metrics: self.metrics.clone(),
            max_rounds,
        }
    }

    pub fn record_set_group(&self) -> RecordSetGroupHandler {
        RecordSetGroupHandler {
            authority: self.acm.clone(),
            dns: self.route53.clone(),
            executor: self.executor(),
            signal: self.signal.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a unique SNS message ID
pub fn generate_message_id() -> String {
    format!("test-{}", uuid::Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_message_id() {
        let id1 = generate_message_id();
        let id2 = generate_message_id();
        assert!(id1.starts_with("test-"));
        assert_ne!(id1, id2);
    }
}
