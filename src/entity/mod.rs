//! Indexed entity persistence.
//!
//! Every entity kind gets its own key namespace (`<entity>/<id>`) inside a
//! shared [`RecordStore`](crate::storage::RecordStore) plus an index key
//! holding the ordered ids of its live records, so listing never scans the
//! key space.

mod index;
mod indexed;

pub use index::{EntityIndex, IndexEdit};
pub use indexed::{IndexedEntity, ReconcileReport};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Capability describing one entity kind.
///
/// Implementors supply the key namespace, the index name, the fallback value
/// returned for absent ids and the demonstration records inserted on first
/// access. The persistence layer never needs to change to add a new kind.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Key namespace; records live at `<ENTITY_NAME>/<id>`.
    const ENTITY_NAME: &'static str;

    /// Name of the id index for this kind.
    const INDEX_NAME: &'static str;

    fn id(&self) -> &str;

    /// Overwrite the id. Used to pin a mutated record to its key.
    fn set_id(&mut self, id: String);

    /// Value returned by `get_state` when nothing is stored.
    fn initial_state() -> Self;

    /// Demonstration records for an empty collection.
    fn seed_data() -> Vec<Self> {
        Vec::new()
    }
}
