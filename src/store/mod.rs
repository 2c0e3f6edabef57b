//! Store Module
//!
//! The ordered key-value contract the data layer is built on, and the
//! bundled engine implementing it.
//!
//! ## Contract
//! - `get` / `put` / `delete` on raw byte keys
//! - `write(batch)`: all operations of a batch land together or not at all
//! - `new_snapshot`: a consistent point-in-time read view
//! - `new_cursor`: ordered iteration; `seek_to` lands on the first key
//!   greater than or equal to the target in byte order
//!
//! Nothing here offers read-modify-write transactions; the data layer
//! builds its own on top of atomic batches.

pub mod engine;
pub mod memtable;
pub mod table;
pub mod wal;

pub use engine::{LogStore, StoreSnapshot};
pub use wal::Operation;

use crate::error::Result;
use crate::options::{ReadOptions, WriteOptions};

// =============================================================================
// Traits
// =============================================================================

/// An ordered byte-string key-value store
pub trait OrderedStore: Send + Sync {
    /// Point-in-time read view, released when dropped
    type Snapshot: Clone + Send + Sync;

    /// Ordered cursor, released when dropped
    type Cursor: StoreCursor;

    /// Read one key, from the snapshot if given, else the latest state
    fn get(
        &self,
        key: &[u8],
        options: &ReadOptions,
        snapshot: Option<&Self::Snapshot>,
    ) -> Result<Option<Vec<u8>>>;

    /// Apply a batch atomically
    fn write(&self, batch: &WriteBatch, options: &WriteOptions) -> Result<()>;

    /// Write a single key
    fn put(&self, key: &[u8], value: &[u8], options: &WriteOptions) -> Result<()> {
        let mut batch = self.new_write_batch();
        batch.put(key, value);
        self.write(&batch, options)
    }

    /// Delete a single key
    fn delete(&self, key: &[u8], options: &WriteOptions) -> Result<()> {
        let mut batch = self.new_write_batch();
        batch.delete(key);
        self.write(&batch, options)
    }

    fn new_write_batch(&self) -> WriteBatch {
        WriteBatch::new()
    }

    /// Capture the current state for later reads
    fn new_snapshot(&self) -> Result<Self::Snapshot>;

    /// Open an unpositioned cursor over the snapshot or the latest state
    fn new_cursor(
        &self,
        options: &ReadOptions,
        snapshot: Option<&Self::Snapshot>,
    ) -> Result<Self::Cursor>;

    /// Make everything durable and refuse further operations
    fn close(&self) -> Result<()>;
}

/// Ordered cursor over a store
///
/// `key`/`value` borrow from the cursor and are only valid until it moves.
pub trait StoreCursor: Send {
    fn is_valid(&self) -> bool;

    fn seek_to_first(&mut self);

    fn seek_to_last(&mut self);

    /// Position on the first key >= `target`
    fn seek_to(&mut self, target: &[u8]);

    fn next(&mut self);

    fn prev(&mut self);

    /// Current key, `None` when not valid
    fn key(&self) -> Option<&[u8]>;

    /// Current value, `None` when not valid
    fn value(&self) -> Option<&[u8]>;
}

// =============================================================================
// Write Batch
// =============================================================================

/// Operations applied atomically by [`OrderedStore::write`]
///
/// Operations apply in order, so the last one on a key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    operations: Vec<Operation>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        self.operations.push(Operation::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        });
    }

    pub fn delete(&mut self, key: &[u8]) {
        self.operations.push(Operation::Delete { key: key.to_vec() });
    }

    pub fn clear(&mut self) {
        self.operations.clear();
    }

    /// Move every operation of `other` to the end of this batch
    pub fn append(&mut self, other: &mut WriteBatch) {
        self.operations.append(&mut other.operations);
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }
}
