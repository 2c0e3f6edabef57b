//! Engine Module
//!
//! The bundled ordered store: coordinates WAL, MemTable and checkpoint
//! table behind the [`OrderedStore`] contract.
//!
//! ## Responsibilities
//! - Log every batch before applying it
//! - Serve reads, snapshots and cursors from the MemTable
//! - Checkpoint the keyspace when the WAL grows too large
//! - Recover from the checkpoint plus WAL on startup

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{OrdoError, Result};
use crate::options::{ReadOptions, WriteOptions};

use super::memtable::{FrozenMap, MemTable, MemTableCursor};
use super::table::{TableBuilder, TableReader};
use super::wal::{WalRecovery, WalWriter};
use super::{OrderedStore, WriteBatch};

/// Point-in-time view of a [`LogStore`]
///
/// Cloning is cheap; the retained version is freed once the last clone
/// (and every cursor opened on it) is dropped.
#[derive(Clone)]
pub struct StoreSnapshot {
    map: FrozenMap,
}

impl StoreSnapshot {
    /// Number of keys visible in this snapshot
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// The bundled storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (write/put/delete/checkpoint): serialized by the `wal` mutex
///   - Only ONE batch at a time: WAL append → MemTable apply → checkpoint
///
/// - **Reads** (get/snapshot/cursor): never take the `wal` mutex
///   - MemTable read lock is held only long enough to clone an `Arc`
///   - Cursors and snapshots read a frozen map version
///
/// The first write after a snapshot or cursor froze the current version
/// copies the whole keyspace. Writers racing long-lived scans pay that copy
/// once per version they invalidate; drop cursors and snapshots promptly.
pub struct LogStore {
    /// Engine configuration
    config: Config,

    /// Live keyspace
    memtable: MemTable,

    /// Write-ahead log; `None` for a memory-only store. The mutex also
    /// serializes writers.
    wal: Mutex<Option<WalWriter>>,

    /// Checkpoint table path; `None` for a memory-only store
    table_path: Option<PathBuf>,

    closed: AtomicBool,
}

impl LogStore {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "wal.log";
    const TABLE_DIR: &'static str = "tables";
    const TABLE_FILENAME: &'static str = "checkpoint.tbl";
    const TABLE_TMP_FILENAME: &'static str = "checkpoint.tbl.tmp";

    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Load the checkpoint table if present
    /// 3. Replay the WAL on top of it
    /// 4. Checkpoint the replayed entries and truncate the WAL
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let data_dir = match &config.data_dir {
            Some(dir) => dir.clone(),
            None => return Ok(Self::memory_only(config)),
        };

        fs::create_dir_all(&data_dir)?;
        let table_dir = data_dir.join(Self::TABLE_DIR);
        fs::create_dir_all(&table_dir)?;

        let table_path = table_dir.join(Self::TABLE_FILENAME);
        let wal_path = data_dir.join(Self::WAL_FILENAME);
        let memtable = MemTable::new();

        if table_path.exists() {
            let reader = TableReader::open(&table_path, config.verify_checksums_on_open)?;
            memtable.load(reader.entries()?);
            tracing::info!(
                path = %table_path.display(),
                entries = reader.entry_count(),
                "loaded checkpoint"
            );
        }

        let mut replayed = 0u64;
        if wal_path.exists() {
            let (entries, result) = WalRecovery::recover(&wal_path)?;

            if result.entries_recovered > 0 || result.entries_corrupted > 0 {
                tracing::info!(
                    recovered = result.entries_recovered,
                    corrupted = result.entries_corrupted,
                    last_lsn = result.last_lsn,
                    "WAL recovery"
                );
            }

            for entry in &entries {
                memtable.apply(&entry.operations);
            }
            replayed = result.entries_recovered;
        }

        let wal = WalWriter::open(&wal_path, config.wal_sync_strategy)?;

        let store = Self {
            config,
            memtable,
            wal: Mutex::new(Some(wal)),
            table_path: Some(table_path),
            closed: AtomicBool::new(false),
        };

        // Make replayed data durable in the checkpoint before new writes
        // land in the WAL
        if replayed > 0 {
            tracing::info!(entries = store.memtable.entry_count(), "checkpointing recovered data");
            store.checkpoint()?;
        }

        Ok(store)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// A store that keeps nothing on disk
    pub fn in_memory() -> Self {
        Self::memory_only(Config::in_memory())
    }

    fn memory_only(config: Config) -> Self {
        Self {
            config,
            memtable: MemTable::new(),
            wal: Mutex::new(None),
            table_path: None,
            closed: AtomicBool::new(false),
        }
    }

    /// Write the whole keyspace to the checkpoint table and truncate the WAL
    pub fn checkpoint(&self) -> Result<()> {
        self.check_open()?;
        let mut wal = self.wal.lock();
        self.checkpoint_locked(wal.as_mut())
    }

    /// Checkpoint with the writer mutex already held
    fn checkpoint_locked(&self, wal: Option<&mut WalWriter>) -> Result<()> {
        let (wal, table_path) = match (wal, &self.table_path) {
            (Some(wal), Some(path)) => (wal, path),
            _ => return Ok(()),
        };

        let tmp_path = table_path.with_file_name(Self::TABLE_TMP_FILENAME);
        let map = self.memtable.frozen();

        let mut builder = TableBuilder::new(&tmp_path)?;
        for (key, value) in map.iter() {
            builder.add(key, value)?;
        }
        let info = builder.finish()?;
        fs::rename(&tmp_path, table_path)?;

        wal.truncate()?;

        tracing::info!(
            entries = info.entry_count,
            bytes = info.file_size,
            lsn = wal.current_lsn(),
            "checkpoint written"
        );
        Ok(())
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(OrdoError::Closed);
        }
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> Option<&Path> {
        self.config.data_dir.as_deref()
    }

    /// Number of live keys
    pub fn entry_count(&self) -> usize {
        self.memtable.entry_count()
    }

    /// Approximate size of the live keyspace in bytes
    pub fn memtable_size(&self) -> usize {
        self.memtable.size()
    }

    /// Current WAL size in bytes (0 for a memory-only store)
    pub fn wal_size(&self) -> u64 {
        self.wal.lock().as_ref().map(WalWriter::size).unwrap_or(0)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl OrderedStore for LogStore {
    type Snapshot = StoreSnapshot;
    type Cursor = MemTableCursor;

    fn get(
        &self,
        key: &[u8],
        _options: &ReadOptions,
        snapshot: Option<&StoreSnapshot>,
    ) -> Result<Option<Vec<u8>>> {
        self.check_open()?;
        Ok(match snapshot {
            Some(snapshot) => snapshot.map.get(key).cloned(),
            None => self.memtable.get(key),
        })
    }

    /// Steps:
    /// 1. Acquire the writer mutex
    /// 2. Append the batch to the WAL (durability)
    /// 3. Apply it to the MemTable
    /// 4. Checkpoint if the WAL outgrew its threshold
    ///
    /// The batch is committed once step 3 ran. A failed checkpoint is only
    /// logged: the WAL still holds every batch and the next write retries.
    fn write(&self, batch: &WriteBatch, options: &WriteOptions) -> Result<()> {
        self.check_open()?;
        if batch.is_empty() {
            return Ok(());
        }

        let mut wal = self.wal.lock();

        if let Some(writer) = wal.as_mut() {
            writer.append(batch.operations().to_vec(), options.sync)?;
        }

        self.memtable.apply(batch.operations());

        let due = wal
            .as_ref()
            .map(|w| w.size() >= self.config.checkpoint_threshold as u64)
            .unwrap_or(false);
        if due {
            if let Err(e) = self.checkpoint_locked(wal.as_mut()) {
                tracing::warn!(error = %e, "checkpoint after write failed, WAL kept");
            }
        }

        Ok(())
    }

    fn new_snapshot(&self) -> Result<StoreSnapshot> {
        self.check_open()?;
        Ok(StoreSnapshot {
            map: self.memtable.frozen(),
        })
    }

    fn new_cursor(
        &self,
        _options: &ReadOptions,
        snapshot: Option<&StoreSnapshot>,
    ) -> Result<MemTableCursor> {
        self.check_open()?;
        let map = match snapshot {
            Some(snapshot) => snapshot.map.clone(),
            None => self.memtable.frozen(),
        };
        Ok(MemTableCursor::new(map))
    }

    /// Close the store gracefully
    ///
    /// Checkpoints pending WAL entries and syncs to disk. Calling it again
    /// is a no-op.
    fn close(&self) -> Result<()> {
        let mut wal = self.wal.lock();
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        if wal.as_ref().map(|w| w.size() > 0).unwrap_or(false) {
            self.checkpoint_locked(wal.as_mut())?;
        }
        if let Some(writer) = wal.as_mut() {
            writer.sync()?;
        }

        tracing::info!(entries = self.memtable.entry_count(), "store closed");
        Ok(())
    }
}
