use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::core::{Result, StoreError};
use crate::storage::RecordStore;

/// Ordered id list for one entity kind, stored under a single key.
///
/// Every change goes through [`EntityIndex::edit`], which holds the per-kind
/// lock from the read until the commit. Concurrent creates and deletes on
/// different ids therefore never drop each other's entries.
pub struct EntityIndex {
    store: Arc<dyn RecordStore>,
    key: String,
    lock: Mutex<()>,
}

/// An open read-modify-write on the index. Dropping it without
/// [`commit`](IndexEdit::commit) discards the changes.
pub struct IndexEdit<'a> {
    index: &'a EntityIndex,
    _guard: MutexGuard<'a, ()>,
    ids: Vec<String>,
    dirty: bool,
}

impl EntityIndex {
    pub fn new(store: Arc<dyn RecordStore>, index_name: &str) -> Self {
        Self {
            store,
            key: format!("__index/{index_name}"),
            lock: Mutex::new(()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current ids in insertion order. Reads do not take the lock.
    pub async fn ids(&self) -> Result<Vec<String>> {
        self.load().await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.load().await?.is_empty())
    }

    pub async fn edit(&self) -> Result<IndexEdit<'_>> {
        let guard = self.lock.lock().await;
        let ids = self.load().await?;
        Ok(IndexEdit {
            index: self,
            _guard: guard,
            ids,
            dirty: false,
        })
    }

    /// Append `id` unless already present. Returns whether it was added.
    pub async fn add(&self, id: &str) -> Result<bool> {
        let mut edit = self.edit().await?;
        let added = edit.push(id);
        edit.commit().await?;
        Ok(added)
    }

    /// Remove `id` if present. Returns whether it was there.
    pub async fn remove(&self, id: &str) -> Result<bool> {
        let mut edit = self.edit().await?;
        let removed = edit.remove(id);
        edit.commit().await?;
        Ok(removed)
    }

    async fn load(&self) -> Result<Vec<String>> {
        match self.store.get(&self.key).await? {
            None => Ok(Vec::new()),
            Some(value) => {
                serde_json::from_value(value).map_err(|e| StoreError::decode(&self.key, e))
            }
        }
    }
}

impl IndexEdit<'_> {
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    pub fn push(&mut self, id: &str) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push(id.to_string());
        self.dirty = true;
        true
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.ids.len();
        self.ids.retain(|existing| existing != id);
        let removed = self.ids.len() != before;
        self.dirty |= removed;
        removed
    }

    /// Keep only ids accepted by `keep`, returning the dropped ones.
    pub fn retain<F>(&mut self, mut keep: F) -> Vec<String>
    where
        F: FnMut(&str) -> bool,
    {
        let (kept, dropped): (Vec<_>, Vec<_>) =
            self.ids.drain(..).partition(|id| keep(id.as_str()));
        self.ids = kept;
        self.dirty |= !dropped.is_empty();
        dropped
    }

    /// Write the ids back if anything changed.
    pub async fn commit(mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let len = self.ids.len();
        let value = Value::from(std::mem::take(&mut self.ids));
        self.index.store.put(&self.index.key, value).await?;
        debug!(index = %self.index.key, len, "index committed");
        Ok(())
    }
}
