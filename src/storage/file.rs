use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::RecordStore;
use super::memory::scan_prefix;
use super::persistence::{DurabilityMode, PersistenceManager, WalEntry};
use crate::core::Result;

/// Durable record store: an in-memory map whose mutations are logged to a WAL
/// and periodically folded into a snapshot.
///
/// The map and the log share one mutex so that the order of entries in the
/// log matches the order in which they were applied.
pub struct FileStore {
    inner: Mutex<FileStoreInner>,
}

struct FileStoreInner {
    records: BTreeMap<String, Value>,
    persistence: PersistenceManager,
}

impl FileStore {
    /// Open (or create) a store in `data_dir`, recovering any existing state.
    pub fn open<P: AsRef<Path>>(data_dir: P, durability_mode: DurabilityMode) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let persistence = PersistenceManager::new(data_dir, durability_mode)?;
        let records = persistence.recover()?;
        info!(
            data_dir = %data_dir.display(),
            records = records.len(),
            ?durability_mode,
            "file store opened"
        );
        Ok(Self {
            inner: Mutex::new(FileStoreInner {
                records,
                persistence,
            }),
        })
    }

    pub async fn set_checkpoint_threshold(&self, threshold: usize) {
        self.inner
            .lock()
            .await
            .persistence
            .wal_mut()
            .set_checkpoint_threshold(threshold);
    }

    /// Write a snapshot of the current key space and truncate the log.
    pub async fn checkpoint(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let FileStoreInner {
            records,
            persistence,
        } = &mut *inner;
        persistence.checkpoint(records)
    }

    async fn apply(&self, entry: WalEntry) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        let FileStoreInner {
            records,
            persistence,
        } = &mut *inner;

        if let Err(err) = persistence.log(&entry) {
            error!(key = entry.key(), error = %err, "failed to log record mutation");
            return Err(err);
        }

        let existed = records.contains_key(entry.key());
        entry.apply(records);

        // The mutation is already logged and applied; a failed checkpoint
        // leaves the WAL intact and is retried on the next write.
        if persistence.needs_checkpoint() {
            debug!("checkpoint threshold reached");
            if let Err(err) = persistence.checkpoint(records) {
                error!(error = %err, "automatic checkpoint failed");
            }
        }
        Ok(existed)
    }
}

#[async_trait]
impl RecordStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.inner.lock().await.records.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        self.apply(WalEntry::Put {
            key: key.to_string(),
            value,
        })
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        // Absent keys are not logged.
        if !self.inner.lock().await.records.contains_key(key) {
            return Ok(false);
        }
        self.apply(WalEntry::Delete {
            key: key.to_string(),
        })
        .await
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<(String, Value)>> {
        Ok(scan_prefix(&self.inner.lock().await.records, prefix))
    }
}
