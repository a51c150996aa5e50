/// Durable key/value storage for delivery tokens
use crate::constants::MESSAGE_ID_PARAMETER_DESCRIPTION;
use crate::error::CertforgeError;
use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_ssm::types::ParameterType;
use chrono::Utc;
use std::collections::HashMap;
use tracing::{debug, info};

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// The stored value, `None` when the key does not exist
    async fn get(&self, key: &str) -> Result<Option<String>, CertforgeError>;

    /// Stores the value, overwriting any previous one
    async fn put(&self, key: &str, value: &str) -> Result<(), CertforgeError>;

    /// Removes the key; removing a missing key succeeds
    async fn delete(&self, key: &str) -> Result<(), CertforgeError>;
}

/// SSM Parameter Store backed storage, one String parameter per key
pub struct SsmParameterStore {
    client: aws_sdk_ssm::Client,
}

impl SsmParameterStore {
    pub fn new(client: aws_sdk_ssm::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl KeyValueStore for SsmParameterStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CertforgeError> {
        match self
            .client
            .get_parameter()
            .name(key)
            .with_decryption(true)
            .send()
            .await
        {
            Ok(output) => Ok(output
                .parameter()
                .and_then(|p| p.value())
                .map(str::to_string)),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_parameter_not_found()) => {
                debug!(key = key, "Parameter not found");
                Ok(None)
            }
            Err(e) => Err(CertforgeError::provider(
                format!("could not get the parameter {}", key),
                e,
            )),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), CertforgeError> {
        self.client
            .put_parameter()
            .name(key)
            .description(MESSAGE_ID_PARAMETER_DESCRIPTION)
            .value(value)
            .r#type(ParameterType::String)
            .overwrite(true)
            .send()
            .await
            .map_err(|e| {
                CertforgeError::provider(format!("could not put the parameter {}", key), e)
            })?;

        debug!(key = key, "Stored parameter");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CertforgeError> {
        match self.client.delete_parameter().name(key).send().await {
            Ok(_) => {
                info!(key = key, "Deleted parameter");
                Ok(())
            }
            Err(e) if e.as_service_error().is_some_and(|se| se.is_parameter_not_found()) => {
                debug!(key = key, "Parameter already absent");
                Ok(())
            }
            Err(e) => Err(CertforgeError::provider(
                format!("could not delete the parameter {}", key),
                e,
            )),
        }
    }
}

/// DynamoDB backed storage, selected by `IDEMPOTENCY_TABLE`
///
/// Items carry the key in `tokenKey`, the value in `value` and the write
/// time in `updatedAt`.
pub struct DynamoDbKeyValueStore {
    client: aws_sdk_dynamodb::Client,
    table_name: String,
}

impl DynamoDbKeyValueStore {
    pub fn new(client: aws_sdk_dynamodb::Client, table_name: String) -> Self {
        Self { client, table_name }
    }
}

#[async_trait]
impl KeyValueStore for DynamoDbKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CertforgeError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("tokenKey", AttributeValue::S(key.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| {
                CertforgeError::provider(format!("DynamoDB get_item failed for {}", key), e)
            })?;

        Ok(result
            .item()
            .and_then(|item| item.get("value"))
            .and_then(|value| value.as_s().ok())
            .cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), CertforgeError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .item("tokenKey", AttributeValue::S(key.to_string()))
            .item("value", AttributeValue::S(value.to_string()))
            .item(
                "updatedAt",
                AttributeValue::N(Utc::now().timestamp().to_string()),
            )
            .send()
            .await
            .map_err(|e| {
                CertforgeError::provider(format!("DynamoDB put_item failed for {}", key), e)
            })?;

        debug!(key = key, table = %self.table_name, "Stored token");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CertforgeError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("tokenKey", AttributeValue::S(key.to_string()))
            .send()
            .await
            .map_err(|e| {
                CertforgeError::provider(format!("DynamoDB delete_item failed for {}", key), e)
            })?;

        info!(key = key, table = %self.table_name, "Deleted token");
        Ok(())
    }
}

/// In-memory storage for testing
#[derive(Default)]
pub struct InMemoryKeyValueStore {
    store: tokio::sync::Mutex<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.store.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.lock().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CertforgeError> {
        Ok(self.store.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), CertforgeError> {
        self.store
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CertforgeError> {
        self.store.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_ok, block_on};

    #[test]
    fn test_in_memory_store_overwrites_and_forgets() {
        let store = InMemoryKeyValueStore::new();
        block_on(async {
            assert_eq!(assert_ok!(store.get("a").await), None);

            assert_ok!(store.put("a", "1").await);
            assert_ok!(store.put("a", "2").await);
            assert_eq!(assert_ok!(store.get("a").await), Some("2".to_string()));
            assert_eq!(store.len().await, 1);

            assert_ok!(store.delete("a").await);
            assert_ok!(store.delete("a").await);
            assert!(store.is_empty().await);
        });
    }
}
