// ============================================================================
// Project dashboard backend
// ============================================================================

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod entity;
pub mod storage;
pub mod web;

pub use core::{Result, StoreError};
pub use domain::{Project, ProjectPriority, ProjectStatus};
pub use entity::{Entity, IndexedEntity};
pub use storage::{DurabilityMode, FileStore, MemoryStore, RecordStore};
pub use web::{AppState, build_router};
