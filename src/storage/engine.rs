use async_trait::async_trait;
use serde_json::Value;

use crate::core::Result;

/// Record store trait - allows pluggable key-value backends
///
/// Each key is independently addressable and atomic on its own; there is no
/// multi-key transaction. Callers that need read-modify-write over a shared
/// key must serialize it themselves.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value
    async fn put(&self, key: &str, value: Value) -> Result<()>;

    /// Remove `key`, reporting whether a value was present
    async fn delete(&self, key: &str) -> Result<bool>;

    /// All entries whose key starts with `prefix`, ordered by key
    async fn list_prefix(&self, prefix: &str) -> Result<Vec<(String, Value)>>;

    /// Check if a key holds a value
    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
