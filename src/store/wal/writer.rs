//! WAL Writer
//!
//! Handles appending entries to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::{OrdoError, Result};

use super::recovery::WalRecovery;
use super::{Operation, WalEntry};

/// Writes entries to the WAL file
pub struct WalWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    current_lsn: u64,
    sync_strategy: WalSyncStrategy,
    /// Entries appended since the last fsync
    unsynced: usize,
    /// Size of the file up to the last complete entry
    size: u64,
    /// Set when a failed append could not be rolled back
    poisoned: bool,
}

impl WalWriter {
    /// Open or create a WAL file
    ///
    /// An existing file is appended to; LSNs continue after the last valid
    /// entry it holds.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let current_lsn = if path.exists() {
            WalRecovery::verify(path)?.last_lsn
        } else {
            0
        };

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            current_lsn,
            sync_strategy,
            unsynced: 0,
            size,
            poisoned: false,
        })
    }

    /// Append one atomic batch as a single entry; returns its LSN
    ///
    /// The entry is handed to the OS before returning. It is fsynced when
    /// `force_sync` is set or the sync strategy says so. On error the file
    /// is cut back to the previous entry, so a failed batch never lands
    /// in the log.
    pub fn append(&mut self, operations: Vec<Operation>, force_sync: bool) -> Result<u64> {
        if self.poisoned {
            return Err(OrdoError::StoreFailure(format!(
                "WAL {} could not be restored after a failed append",
                self.path.display()
            )));
        }

        let lsn = self.current_lsn + 1;
        let frame = WalEntry::new(lsn, operations).serialize()?;

        if let Err(e) = self.write_frame(&frame, force_sync) {
            self.rollback();
            return Err(e);
        }

        self.current_lsn = lsn;
        self.size += frame.len() as u64;
        Ok(lsn)
    }

    fn write_frame(&mut self, frame: &[u8], force_sync: bool) -> Result<()> {
        self.writer.write_all(frame)?;
        self.writer.flush()?;
        self.unsynced += 1;

        let due = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        if force_sync || due {
            self.sync()?;
        }
        Ok(())
    }

    /// Drop whatever a failed append left behind, or poison the writer
    fn rollback(&mut self) {
        match self.reset_to_size() {
            Ok(()) => tracing::warn!(
                path = %self.path.display(),
                size = self.size,
                "failed WAL append rolled back"
            ),
            Err(e) => {
                self.poisoned = true;
                tracing::error!(
                    path = %self.path.display(),
                    error = %e,
                    "WAL rollback failed, refusing further appends"
                );
            }
        }
    }

    fn reset_to_size(&mut self) -> Result<()> {
        let file = OpenOptions::new().append(true).open(&self.path)?;
        // Dropping the old writer flushes its buffer; the bytes are cut below
        self.writer = BufWriter::new(file);
        let file = self.writer.get_ref();
        file.set_len(self.size)?;
        file.sync_all()?;
        Ok(())
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Drop every entry (their effects are durable elsewhere)
    ///
    /// LSNs keep increasing across truncations.
    pub fn truncate(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().set_len(0)?;
        self.size = 0;
        self.unsynced = 0;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }

    /// Get the current LSN
    pub fn current_lsn(&self) -> u64 {
        self.current_lsn
    }

    /// Current file size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
