/// Submission of record changes and wait for their propagation
use crate::error::CertforgeError;
use crate::models::{ChangeReceipt, ChangeStatus, DnsChange};
use crate::services::{DnsProvider, Metrics, MetricsService};
use crate::utils::poll::PollSettings;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct DnsChangeExecutor {
    dns: Arc<dyn DnsProvider>,
    metrics: Arc<dyn MetricsService>,
    poll: PollSettings,
}

impl DnsChangeExecutor {
    pub fn new(
        dns: Arc<dyn DnsProvider>,
        metrics: Arc<dyn MetricsService>,
        poll: PollSettings,
    ) -> Self {
        Self { dns, metrics, poll }
    }

    /// Applies the changes as one batch and waits until the batch is in sync
    ///
    /// An empty change list is a no-op and yields no receipt.
    pub async fn apply_batch(
        &self,
        zone_id: &str,
        changes: &[DnsChange],
    ) -> Result<Option<ChangeReceipt>, CertforgeError> {
        if changes.is_empty() {
            debug!(zone_id = zone_id, "No record changes to apply");
            return Ok(None);
        }

        for change in changes {
            debug!(zone_id = zone_id, change = %change, "Record change");
        }

        let receipt = self.dns.change_record_sets(zone_id, changes).await?;
        self.await_propagation(&receipt).await?;
        Ok(Some(receipt))
    }

    /// Applies the batch, replaying it record by record when it fails
    ///
    /// Used for deletions: a record that is already gone does not fail the
    /// replay.
    pub async fn apply_with_fallback(
        &self,
        zone_id: &str,
        changes: &[DnsChange],
    ) -> Result<(), CertforgeError> {
        let Err(batch_error) = self.apply_batch(zone_id, changes).await else {
            return Ok(());
        };

        warn!(
            zone_id = zone_id,
            error = %batch_error,
            "Change batch failed, applying changes one by one"
        );
        Metrics::dns_batch_fallback(self.metrics.as_ref()).await;

        for change in changes {
            match self
                .apply_batch(zone_id, std::slice::from_ref(change))
                .await
            {
                Ok(_) => {}
                Err(CertforgeError::RecordAbsent(reason)) => {
                    info!(change = %change, reason = %reason, "Record already absent");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Polls the change until it is in sync or the round budget is spent
    pub async fn await_propagation(&self, receipt: &ChangeReceipt) -> Result<(), CertforgeError> {
        let started = Instant::now();
        let mut status = receipt.status;

        for round in 0..self.poll.max_rounds {
            if status == ChangeStatus::InSync {
                break;
            }
            debug!(change_id = %receipt.id, round = round, "Waiting for change to sync");
            self.poll.pause().await;
            status = self.dns.change_status(&receipt.id).await?;
        }

        if status != ChangeStatus::InSync {
            return Err(CertforgeError::PropagationTimeout(format!(
                "change {} did not sync in time",
                receipt.id
            )));
        }

        info!(change_id = %receipt.id, "Change is in sync");
        Metrics::dns_propagated(self.metrics.as_ref(), started.elapsed().as_millis() as f64).await;
        Ok(())
    }
}
