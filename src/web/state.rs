use std::sync::Arc;

use crate::domain::Project;
use crate::entity::{Entity, IndexedEntity};
use crate::storage::RecordStore;

#[derive(Clone)]
pub struct AppState {
    pub projects: IndexedEntity<Project>,
    /// Seed set computed once at startup so due dates are stable.
    pub seed: Arc<[Project]>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_seed(store, Project::seed_data())
    }

    pub fn with_seed(store: Arc<dyn RecordStore>, seed: Vec<Project>) -> Self {
        Self {
            projects: IndexedEntity::new(store),
            seed: seed.into(),
        }
    }
}
