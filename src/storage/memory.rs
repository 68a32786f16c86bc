use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::RecordStore;
use crate::core::Result;

/// Volatile record store backed by an ordered map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

pub(crate) fn scan_prefix(records: &BTreeMap<String, Value>, prefix: &str) -> Vec<(String, Value)> {
    records
        .range(prefix.to_string()..)
        .take_while(|(key, _)| key.starts_with(prefix))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        self.records.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.records.write().await.remove(key).is_some())
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<(String, Value)>> {
        Ok(scan_prefix(&*self.records.read().await, prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn put_get_delete_roundtrip() {
        let store = MemoryStore::new();
        store.put("project/a", json!({"name": "A"})).await.unwrap();

        assert_eq!(
            store.get("project/a").await.unwrap(),
            Some(json!({"name": "A"}))
        );
        assert!(store.contains("project/a").await.unwrap());

        assert!(store.delete("project/a").await.unwrap());
        assert!(!store.delete("project/a").await.unwrap());
        assert_eq!(store.get("project/a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_prefix_stays_inside_namespace() {
        let store = MemoryStore::new();
        store.put("project/b", json!(2)).await.unwrap();
        store.put("project/a", json!(1)).await.unwrap();
        store.put("projects/x", json!(3)).await.unwrap();
        store.put("task/a", json!(4)).await.unwrap();

        let listed = store.list_prefix("project/").await.unwrap();
        let keys: Vec<_> = listed.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["project/a", "project/b"]);
    }

    #[tokio::test]
    async fn put_overwrites_existing_value() {
        let store = MemoryStore::new();
        store.put("k", json!("old")).await.unwrap();
        store.put("k", json!("new")).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!("new")));
        assert_eq!(store.list_prefix("").await.unwrap().len(), 1);
    }
}
