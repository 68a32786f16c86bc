pub mod engine;
pub mod file;
pub mod memory;
pub mod persistence;

pub use engine::RecordStore;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use persistence::DurabilityMode;
