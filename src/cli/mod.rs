//! Command-line entry points: `serve`, `seed` and `reindex`.
//!
//! Flags override the values loaded from the environment.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::{AppConfig, StorageBackend};
use crate::storage::{DurabilityMode, FileStore, MemoryStore, RecordStore};

#[derive(Debug, Parser)]
#[command(name = "projectboard")]
#[command(about = "Project dashboard API server and maintenance tools")]
pub struct Cli {
    /// Storage backend: file or memory.
    #[arg(long, global = true, value_parser = StorageBackend::parse)]
    pub storage: Option<StorageBackend>,

    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// WAL durability: sync, async or none.
    #[arg(long, global = true)]
    pub durability: Option<DurabilityMode>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API.
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Insert the seed projects if the collection has never been seeded.
    Seed,
    /// Rebuild the project index from the stored records.
    Reindex,
}

impl Cli {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(storage) = self.storage {
            config.storage_backend = storage;
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(durability) = self.durability {
            config.durability = durability;
        }
        if let Command::Serve { host, port } = &self.command {
            if let Some(host) = host {
                config.host = host.clone();
            }
            if let Some(port) = port {
                config.port = *port;
            }
        }
    }
}

/// The configured record store, kept concrete so it can be flushed on exit.
pub enum StoreHandle {
    Memory(Arc<MemoryStore>),
    File(Arc<FileStore>),
}

impl StoreHandle {
    pub async fn open(config: &AppConfig) -> Result<Self> {
        match config.storage_backend {
            StorageBackend::Memory => {
                info!("storage backend: memory");
                Ok(Self::Memory(Arc::new(MemoryStore::new())))
            }
            StorageBackend::File => {
                info!(data_dir = %config.data_dir.display(), "storage backend: file");
                let store = FileStore::open(&config.data_dir, config.durability)
                    .with_context(|| {
                        format!("failed to open data directory {}", config.data_dir.display())
                    })?;
                store
                    .set_checkpoint_threshold(config.checkpoint_threshold)
                    .await;
                Ok(Self::File(Arc::new(store)))
            }
        }
    }

    pub fn store(&self) -> Arc<dyn RecordStore> {
        match self {
            Self::Memory(store) => Arc::clone(store) as Arc<dyn RecordStore>,
            Self::File(store) => Arc::clone(store) as Arc<dyn RecordStore>,
        }
    }

    /// Fold the WAL into a snapshot. No-op for the memory backend.
    pub async fn close(&self) -> Result<()> {
        if let Self::File(store) = self {
            store
                .checkpoint()
                .await
                .context("failed to checkpoint file store")?;
        }
        Ok(())
    }
}
