use futures::future::try_join_all;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{Entity, EntityIndex};
use crate::core::{Result, StoreError};
use crate::storage::RecordStore;

/// Outcome of rebuilding an index from the records actually stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Ids that were indexed and backed by a record.
    pub kept: usize,
    /// Indexed ids with no record behind them.
    pub dropped: Vec<String>,
    /// Records that were missing from the index.
    pub adopted: Vec<String>,
}

/// Typed CRUD over one entity kind.
///
/// Records are stored under `<ENTITY_NAME>/<id>`; the ids of live records are
/// kept in an [`EntityIndex`]. Cloning is cheap and clones share the index
/// and seed locks, so construct one instance per kind and hand out clones.
pub struct IndexedEntity<E: Entity> {
    store: Arc<dyn RecordStore>,
    index: Arc<EntityIndex>,
    seed_lock: Arc<Mutex<()>>,
    _kind: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for IndexedEntity<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            index: Arc::clone(&self.index),
            seed_lock: Arc::clone(&self.seed_lock),
            _kind: PhantomData,
        }
    }
}

impl<E: Entity> IndexedEntity<E> {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        let index = Arc::new(EntityIndex::new(Arc::clone(&store), E::INDEX_NAME));
        Self {
            store,
            index,
            seed_lock: Arc::new(Mutex::new(())),
            _kind: PhantomData,
        }
    }

    /// Storage key of the record with `id`.
    pub fn key(id: &str) -> String {
        format!("{}/{}", E::ENTITY_NAME, id)
    }

    fn namespace() -> String {
        format!("{}/", E::ENTITY_NAME)
    }

    fn seed_marker() -> String {
        format!("__seeded/{}", E::INDEX_NAME)
    }

    pub fn index(&self) -> &EntityIndex {
        &self.index
    }

    pub async fn exists(&self, id: &str) -> Result<bool> {
        self.store.contains(&Self::key(id)).await
    }

    /// The stored record, if any.
    pub async fn get(&self, id: &str) -> Result<Option<E>> {
        let key = Self::key(id);
        match self.store.get(&key).await? {
            None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StoreError::decode(key, e)),
        }
    }

    /// The stored record, or the kind's initial state when absent.
    pub async fn get_state(&self, id: &str) -> Result<E> {
        Ok(self.get(id).await?.unwrap_or_else(E::initial_state))
    }

    /// Write `value` under its own id and make sure the id is indexed.
    ///
    /// An existing record with the same id is overwritten; id uniqueness is
    /// the caller's job.
    pub async fn create(&self, value: E) -> Result<E> {
        let key = Self::key(value.id());
        self.write(&key, &value).await?;
        self.index.add(value.id()).await?;
        debug!(entity = E::ENTITY_NAME, id = value.id(), "entity created");
        Ok(value)
    }

    /// Apply `update` to the stored record and write the result back.
    ///
    /// Returns `None` without writing when no record exists. The read and the
    /// write are not atomic: two concurrent mutations of the same id both
    /// start from the same state and the later write wins. The id is pinned
    /// to `id` whatever `update` returns.
    pub async fn mutate<F>(&self, id: &str, update: F) -> Result<Option<E>>
    where
        F: FnOnce(E) -> E + Send,
    {
        let Some(current) = self.get(id).await? else {
            return Ok(None);
        };
        let mut next = update(current);
        next.set_id(id.to_string());
        self.write(&Self::key(id), &next).await?;
        debug!(entity = E::ENTITY_NAME, id, "entity mutated");
        Ok(Some(next))
    }

    /// Remove the record and its index entry. The index entry is removed even
    /// when no record was stored, so a dangling id heals itself here.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let existed = self.store.delete(&Self::key(id)).await?;
        let was_indexed = self.index.remove(id).await?;
        if was_indexed && !existed {
            warn!(entity = E::ENTITY_NAME, id, "removed dangling index entry");
        }
        debug!(entity = E::ENTITY_NAME, id, existed, "entity deleted");
        Ok(existed)
    }

    /// Every indexed record in insertion order. Ids whose record has gone
    /// missing are skipped.
    pub async fn list(&self) -> Result<Vec<E>> {
        let ids = self.index.ids().await?;
        let fetched = try_join_all(ids.iter().map(|id| self.get(id))).await?;

        let mut items = Vec::with_capacity(fetched.len());
        for (id, item) in ids.iter().zip(fetched) {
            match item {
                Some(item) => items.push(item),
                None => warn!(entity = E::ENTITY_NAME, id = %id, "indexed id has no record"),
            }
        }
        Ok(items)
    }

    pub async fn count(&self) -> Result<usize> {
        Ok(self.index.ids().await?.len())
    }

    /// Insert `seed_data` the first time the collection is found empty.
    ///
    /// Once seeded (or once the index is found non-empty) a marker is stored
    /// and later calls cost a single key lookup. Returns whether this call
    /// inserted the seed set.
    pub async fn ensure_seed(&self, seed_data: &[E]) -> Result<bool> {
        let marker = Self::seed_marker();
        if self.store.contains(&marker).await? {
            return Ok(false);
        }

        let _guard = self.seed_lock.lock().await;
        if self.store.contains(&marker).await? {
            return Ok(false);
        }

        let seeded = if self.index.is_empty().await? {
            for item in seed_data {
                self.create(item.clone()).await?;
            }
            info!(
                entity = E::ENTITY_NAME,
                records = seed_data.len(),
                "seed data inserted"
            );
            true
        } else {
            false
        };

        self.store.put(&marker, serde_json::Value::Bool(true)).await?;
        Ok(seeded)
    }

    /// Rebuild the index from the records in this kind's namespace.
    ///
    /// Runs under the index lock, so creates and deletes that reach the index
    /// step wait for it to finish.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let namespace = Self::namespace();
        let mut edit = self.index.edit().await?;

        let stored: Vec<String> = self
            .store
            .list_prefix(&namespace)
            .await?
            .into_iter()
            .filter_map(|(key, _)| key.strip_prefix(&namespace).map(str::to_string))
            .collect();

        let dropped = edit.retain(|id| stored.iter().any(|s| s == id));
        let kept = edit.ids().len();
        let mut adopted = Vec::new();
        for id in &stored {
            if edit.push(id) {
                adopted.push(id.clone());
            }
        }
        edit.commit().await?;

        if !dropped.is_empty() || !adopted.is_empty() {
            warn!(
                entity = E::ENTITY_NAME,
                dropped = dropped.len(),
                adopted = adopted.len(),
                "index reconciled"
            );
        }
        Ok(ReconcileReport {
            kept,
            dropped,
            adopted,
        })
    }

    async fn write(&self, key: &str, value: &E) -> Result<()> {
        let encoded = serde_json::to_value(value).map_err(|e| StoreError::encode(key, e))?;
        self.store.put(key, encoded).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: String,
        text: String,
    }

    impl Entity for Note {
        const ENTITY_NAME: &'static str = "note";
        const INDEX_NAME: &'static str = "notes";

        fn id(&self) -> &str {
            &self.id
        }

        fn set_id(&mut self, id: String) {
            self.id = id;
        }

        fn initial_state() -> Self {
            Note {
                id: String::new(),
                text: String::new(),
            }
        }
    }

    fn note(id: &str, text: &str) -> Note {
        Note {
            id: id.to_string(),
            text: text.to_string(),
        }
    }

    fn notes() -> (Arc<MemoryStore>, IndexedEntity<Note>) {
        let store = Arc::new(MemoryStore::new());
        let notes = IndexedEntity::new(store.clone());
        (store, notes)
    }

    #[test]
    fn key_is_namespaced_by_kind() {
        assert_eq!(IndexedEntity::<Note>::key("n1"), "note/n1");
    }

    #[tokio::test]
    async fn get_state_falls_back_to_initial_state() {
        let (_store, notes) = notes();
        assert!(!notes.exists("n1").await.unwrap());
        assert_eq!(notes.get_state("n1").await.unwrap(), Note::initial_state());
    }

    #[tokio::test]
    async fn create_twice_overwrites_and_indexes_once() {
        let (_store, notes) = notes();
        notes.create(note("n1", "first")).await.unwrap();
        notes.create(note("n1", "second")).await.unwrap();

        assert_eq!(notes.count().await.unwrap(), 1);
        assert_eq!(notes.get_state("n1").await.unwrap().text, "second");
    }

    #[tokio::test]
    async fn mutate_pins_id_and_skips_absent_records() {
        let (store, notes) = notes();
        notes.create(note("n1", "draft")).await.unwrap();

        let updated = notes
            .mutate("n1", |mut n| {
                n.id = "hijacked".to_string();
                n.text = "final".to_string();
                n
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated, note("n1", "final"));
        assert!(!notes.exists("hijacked").await.unwrap());

        assert_eq!(notes.mutate("missing", |n| n).await.unwrap(), None);
        assert!(!store.contains("note/missing").await.unwrap());
    }

    #[tokio::test]
    async fn delete_heals_dangling_index_entry() {
        let (store, notes) = notes();
        notes.create(note("n1", "x")).await.unwrap();
        store.delete("note/n1").await.unwrap();

        assert!(!notes.delete("n1").await.unwrap());
        assert!(notes.index().ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_skips_ids_without_records() {
        let (store, notes) = notes();
        notes.create(note("a", "1")).await.unwrap();
        notes.create(note("b", "2")).await.unwrap();
        notes.create(note("c", "3")).await.unwrap();
        store.delete("note/b").await.unwrap();

        let listed = notes.list().await.unwrap();
        assert_eq!(listed, vec![note("a", "1"), note("c", "3")]);
    }

    #[tokio::test]
    async fn ensure_seed_runs_once_even_after_collection_is_emptied() {
        let (_store, notes) = notes();
        let seed = vec![note("s1", "one"), note("s2", "two")];

        assert!(notes.ensure_seed(&seed).await.unwrap());
        assert!(!notes.ensure_seed(&seed).await.unwrap());
        assert_eq!(notes.count().await.unwrap(), 2);

        notes.delete("s1").await.unwrap();
        notes.delete("s2").await.unwrap();
        assert!(!notes.ensure_seed(&seed).await.unwrap());
        assert!(notes.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ensure_seed_leaves_populated_collection_alone() {
        let (_store, notes) = notes();
        notes.create(note("mine", "kept")).await.unwrap();

        assert!(!notes.ensure_seed(&[note("s1", "one")]).await.unwrap());
        assert_eq!(notes.list().await.unwrap(), vec![note("mine", "kept")]);
    }

    #[tokio::test]
    async fn reconcile_drops_dangling_and_adopts_orphans() {
        let (store, notes) = notes();
        notes.create(note("a", "1")).await.unwrap();
        notes.create(note("b", "2")).await.unwrap();
        store.delete("note/a").await.unwrap();
        store
            .put("note/orphan", json!({"id": "orphan", "text": "lost"}))
            .await
            .unwrap();

        let report = notes.reconcile().await.unwrap();
        assert_eq!(report.kept, 1);
        assert_eq!(report.dropped, vec!["a"]);
        assert_eq!(report.adopted, vec!["orphan"]);
        assert_eq!(notes.index().ids().await.unwrap(), vec!["b", "orphan"]);
    }
}
