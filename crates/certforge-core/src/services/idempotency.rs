/// Duplicate delivery detection for SNS messages
use super::store::KeyValueStore;
use crate::constants::DEFAULT_PARAMETER_PREFIX;
use crate::error::CertforgeError;
use crate::utils::arn::stack_name_and_guid;
use std::sync::Arc;
use tracing::{debug, info};

/// Remembers the last message id processed for each resource
///
/// The token of a resource is overwritten by every new message, so a
/// redelivery is only detected while it is the latest message seen for that
/// resource.
pub struct IdempotencyGuard {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl IdempotencyGuard {
    pub fn new(store: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    pub fn with_default_prefix(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(store, DEFAULT_PARAMETER_PREFIX)
    }

    /// `/<prefix>/DnsCertificateSnsMessageId/<stack-name>/<stack-guid>/<logical-id>`
    pub fn token_key(
        &self,
        stack_id: &str,
        logical_resource_id: &str,
    ) -> Result<String, CertforgeError> {
        Ok(format!(
            "/{}/DnsCertificateSnsMessageId/{}/{}",
            self.prefix.trim_matches('/'),
            stack_name_and_guid(stack_id)?,
            logical_resource_id
        ))
    }

    /// Whether the message was already processed for this resource
    ///
    /// When it was not, the message id is recorded before returning, so a
    /// redelivery that arrives while the first delivery is still being
    /// processed is skipped too.
    pub async fn should_skip(
        &self,
        stack_id: &str,
        logical_resource_id: &str,
        message_id: &str,
    ) -> Result<bool, CertforgeError> {
        let key = self.token_key(stack_id, logical_resource_id)?;

        if self.store.get(&key).await?.as_deref() == Some(message_id) {
            info!(
                message_id = message_id,
                logical_resource_id = logical_resource_id,
                "Duplicate message detected, skipping"
            );
            return Ok(true);
        }

        self.store.put(&key, message_id).await?;
        debug!(key = %key, message_id = message_id, "Recorded message id");
        Ok(false)
    }

    /// Drops the token of a deleted resource
    pub async fn forget(
        &self,
        stack_id: &str,
        logical_resource_id: &str,
    ) -> Result<(), CertforgeError> {
        let key = self.token_key(stack_id, logical_resource_id)?;
        self.store.delete(&key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::InMemoryKeyValueStore;

    const STACK_ID: &str =
        "arn:aws:cloudformation:eu-west-1:999999999999:stack/test-stack/0f6b1a30-0000-11ef-0000-0a1b2c3d4e5f";

    fn guard() -> (Arc<InMemoryKeyValueStore>, IdempotencyGuard) {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let guard = IdempotencyGuard::with_default_prefix(store.clone());
        (store, guard)
    }

    #[test]
    fn test_token_key_layout() {
        let (_, guard) = guard();
        assert_eq!(
            guard.token_key(STACK_ID, "Certificate").unwrap(),
            "/certforge/DnsCertificateSnsMessageId/test-stack/0f6b1a30-0000-11ef-0000-0a1b2c3d4e5f/Certificate"
        );
        assert!(guard.token_key("not-a-stack", "Certificate").is_err());
    }

    #[tokio::test]
    async fn test_redelivery_is_skipped() {
        let (_, guard) = guard();
        assert!(!guard.should_skip(STACK_ID, "Certificate", "m1").await.unwrap());
        assert!(guard.should_skip(STACK_ID, "Certificate", "m1").await.unwrap());
        // another resource of the same stack is tracked separately
        assert!(!guard.should_skip(STACK_ID, "Other", "m1").await.unwrap());
    }

    #[tokio::test]
    async fn test_newer_message_overwrites_token() {
        let (_, guard) = guard();
        assert!(!guard.should_skip(STACK_ID, "Certificate", "m1").await.unwrap());
        assert!(!guard.should_skip(STACK_ID, "Certificate", "m2").await.unwrap());
        assert!(!guard.should_skip(STACK_ID, "Certificate", "m1").await.unwrap());
    }

    #[tokio::test]
    async fn test_forget_removes_token() {
        let (store, guard) = guard();
        guard.should_skip(STACK_ID, "Certificate", "m1").await.unwrap();
        assert_eq!(store.len().await, 1);

        guard.forget(STACK_ID, "Certificate").await.unwrap();
        guard.forget(STACK_ID, "Certificate").await.unwrap();
        assert!(store.is_empty().await);
    }
}
