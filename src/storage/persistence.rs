//! Write-Ahead Logging (WAL) and snapshot layer behind the file-backed record store

use crate::core::{Result, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

pub const WAL_FILE: &str = "records.wal";
pub const SNAPSHOT_FILE: &str = "records.snapshot";
pub const DEFAULT_CHECKPOINT_THRESHOLD: usize = 1000;

// ============================================================================
// WAL Entry Types
// ============================================================================

/// One logged mutation of the key space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WalEntry {
    Put { key: String, value: Value },
    Delete { key: String },
}

impl WalEntry {
    pub fn key(&self) -> &str {
        match self {
            WalEntry::Put { key, .. } | WalEntry::Delete { key } => key,
        }
    }

    pub fn apply(self, records: &mut BTreeMap<String, Value>) {
        match self {
            WalEntry::Put { key, value } => {
                records.insert(key, value);
            }
            WalEntry::Delete { key } => {
                records.remove(&key);
            }
        }
    }
}

// ============================================================================
// Record Snapshot
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordSnapshot {
    pub version: u32,
    pub records: BTreeMap<String, Value>,
    pub metadata: SnapshotMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub created_at: DateTime<Utc>,
    pub record_count: usize,
}

impl RecordSnapshot {
    pub fn new(records: BTreeMap<String, Value>) -> Self {
        let record_count = records.len();
        Self {
            version: 1,
            records,
            metadata: SnapshotMetadata {
                created_at: Utc::now(),
                record_count,
            },
        }
    }
}

// ============================================================================
// Durability Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurabilityMode {
    /// fsync after every logged entry
    #[default]
    Sync,
    /// flush to the OS, let it decide when to sync
    Async,
    /// no logging at all; the data directory is only written on checkpoint
    None,
}

impl FromStr for DurabilityMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sync" => Ok(Self::Sync),
            "async" => Ok(Self::Async),
            "none" | "off" => Ok(Self::None),
            _ => Err(format!(
                "Invalid durability mode '{s}'. Valid values: sync, async, none"
            )),
        }
    }
}

// ============================================================================
// WAL Manager
// ============================================================================

pub struct WalManager {
    wal_path: PathBuf,
    wal_file: Option<BufWriter<File>>,
    durability_mode: DurabilityMode,
    entries_since_checkpoint: usize,
    checkpoint_threshold: usize,
}

impl WalManager {
    pub fn new<P: AsRef<Path>>(wal_path: P, durability_mode: DurabilityMode) -> Result<Self> {
        let wal_path = wal_path.as_ref().to_path_buf();
        if let Some(parent) = wal_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let wal_file = if durability_mode != DurabilityMode::None {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&wal_path)?;
            Some(BufWriter::new(file))
        } else {
            None
        };

        Ok(Self {
            wal_path,
            wal_file,
            durability_mode,
            entries_since_checkpoint: 0,
            checkpoint_threshold: DEFAULT_CHECKPOINT_THRESHOLD,
        })
    }

    pub fn append(&mut self, entry: &WalEntry) -> Result<()> {
        if self.durability_mode == DurabilityMode::None {
            return Ok(());
        }
        let file = self
            .wal_file
            .as_mut()
            .ok_or_else(|| StoreError::Wal("WAL file not initialized".to_string()))?;
        let serialized =
            rmp_serde::to_vec(entry).map_err(|e| StoreError::encode(entry.key(), e))?;
        let len = u32::try_from(serialized.len())
            .map_err(|_| StoreError::encode(entry.key(), "entry exceeds 4 GiB"))?;
        file.write_all(&len.to_le_bytes())?;
        file.write_all(&serialized)?;
        file.flush()?;
        if self.durability_mode == DurabilityMode::Sync {
            file.get_mut().sync_all()?;
        }
        self.entries_since_checkpoint += 1;
        Ok(())
    }

    /// Read every complete frame. A torn frame at the tail (crash mid-append)
    /// ends the replay.
    pub fn read_all(&self) -> Result<Vec<WalEntry>> {
        if !self.wal_path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.wal_path)?;
        let mut reader = BufReader::new(file);
        let mut entries = Vec::new();
        loop {
            let mut len_bytes = [0u8; 4];
            match reader.read_exact(&mut len_bytes) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
            let len = u32::from_le_bytes(len_bytes) as usize;
            let mut data = vec![0u8; len];
            match reader.read_exact(&mut data) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    warn!(
                        path = %self.wal_path.display(),
                        recovered = entries.len(),
                        "truncated WAL frame ignored"
                    );
                    break;
                }
                Err(e) => return Err(e.into()),
            }
            let entry: WalEntry = rmp_serde::from_slice(&data)
                .map_err(|e| StoreError::Wal(format!("Failed to deserialize WAL entry: {e}")))?;
            entries.push(entry);
        }
        Ok(entries)
    }

    pub fn clear(&mut self) -> Result<()> {
        if self.durability_mode == DurabilityMode::None {
            // A log left by an earlier sync/async run would replay over the
            // newer snapshot.
            if self.wal_path.exists() {
                fs::remove_file(&self.wal_path)?;
            }
            self.entries_since_checkpoint = 0;
            return Ok(());
        }
        self.wal_file = None;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.wal_path)?;
        self.wal_file = Some(BufWriter::new(file));
        self.entries_since_checkpoint = 0;
        Ok(())
    }

    pub fn needs_checkpoint(&self) -> bool {
        self.durability_mode != DurabilityMode::None
            && self.entries_since_checkpoint >= self.checkpoint_threshold
    }

    pub fn entries_since_checkpoint(&self) -> usize {
        self.entries_since_checkpoint
    }

    pub fn set_checkpoint_threshold(&mut self, threshold: usize) {
        self.checkpoint_threshold = threshold.max(1);
    }
}

// ============================================================================
// Snapshot Manager
// ============================================================================

pub struct SnapshotManager {
    snapshot_path: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    pub fn save(&self, snapshot: &RecordSnapshot) -> Result<()> {
        let parent = self
            .snapshot_path
            .parent()
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;

        let serialized = rmp_serde::to_vec(snapshot)
            .map_err(|e| StoreError::Snapshot(format!("Failed to serialize snapshot: {e}")))?;
        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(&serialized)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.snapshot_path)
            .map_err(|e| StoreError::Snapshot(format!("Failed to rename snapshot: {e}")))?;
        Ok(())
    }

    pub fn load(&self) -> Result<Option<RecordSnapshot>> {
        if !self.snapshot_path.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.snapshot_path)?;
        let snapshot: RecordSnapshot = rmp_serde::from_slice(&data)
            .map_err(|e| StoreError::Snapshot(format!("Failed to deserialize snapshot: {e}")))?;
        Ok(Some(snapshot))
    }

}

// ============================================================================
// Persistence Manager
// ============================================================================

pub struct PersistenceManager {
    wal: WalManager,
    snapshot: SnapshotManager,
}

impl PersistenceManager {
    pub fn new<P: AsRef<Path>>(data_dir: P, durability_mode: DurabilityMode) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)?;
        let wal = WalManager::new(data_dir.join(WAL_FILE), durability_mode)?;
        let snapshot = SnapshotManager::new(data_dir.join(SNAPSHOT_FILE));
        Ok(Self { wal, snapshot })
    }

    pub fn log(&mut self, entry: &WalEntry) -> Result<()> {
        self.wal.append(entry)
    }

    /// Persist the full key space and truncate the log.
    pub fn checkpoint(&mut self, records: &BTreeMap<String, Value>) -> Result<()> {
        let snapshot = RecordSnapshot::new(records.clone());
        self.snapshot.save(&snapshot)?;
        self.wal.clear()?;
        debug!(records = snapshot.metadata.record_count, "checkpoint written");
        Ok(())
    }

    pub fn needs_checkpoint(&self) -> bool {
        self.wal.needs_checkpoint()
    }

    /// Snapshot first, then every logged mutation on top of it.
    pub fn recover(&self) -> Result<BTreeMap<String, Value>> {
        let mut records = match self.snapshot.load()? {
            Some(snapshot) => snapshot.records,
            None => BTreeMap::new(),
        };

        let wal_entries = self.wal.read_all()?;
        let replayed = wal_entries.len();
        for entry in wal_entries {
            entry.apply(&mut records);
        }
        debug!(records = records.len(), replayed, "record store recovered");
        Ok(records)
    }

    pub fn wal(&self) -> &WalManager {
        &self.wal
    }
    pub fn wal_mut(&mut self) -> &mut WalManager {
        &mut self.wal
    }
}
