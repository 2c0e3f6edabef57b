//! MemTable implementation
//!
//! Copy-on-write BTreeMap with RwLock for concurrency.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::store::wal::Operation;

/// A frozen version of the keyspace, shared by snapshots and cursors
pub type FrozenMap = Arc<BTreeMap<Vec<u8>, Vec<u8>>>;

struct Inner {
    map: FrozenMap,
    /// Approximate size in bytes (keys + values)
    size: usize,
}

/// In-memory table holding the live keyspace
pub struct MemTable {
    inner: RwLock<Inner>,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                map: Arc::new(BTreeMap::new()),
                size: 0,
            }),
        }
    }

    /// Get a value by key (read lock)
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.read().map.get(key).cloned()
    }

    /// Apply a batch atomically (write lock); later operations on the same
    /// key win
    ///
    /// While a snapshot or cursor still holds the current version, the map
    /// is cloned first, so that write costs O(keyspace) under the lock.
    pub fn apply(&self, operations: &[Operation]) {
        let mut inner = self.inner.write();
        let Inner { map, size } = &mut *inner;
        let map = Arc::make_mut(map);

        for operation in operations {
            match operation {
                Operation::Put { key, value } => {
                    match map.insert(key.clone(), value.clone()) {
                        Some(old) => *size = *size - old.len() + value.len(),
                        None => *size += key.len() + value.len(),
                    }
                }
                Operation::Delete { key } => {
                    if let Some(old) = map.remove(key.as_slice()) {
                        *size -= key.len() + old.len();
                    }
                }
            }
        }
    }

    /// Replace the whole content (used when loading a checkpoint)
    pub fn load(&self, entries: Vec<(Vec<u8>, Vec<u8>)>) {
        let size = entries.iter().map(|(k, v)| k.len() + v.len()).sum();
        let map: BTreeMap<Vec<u8>, Vec<u8>> = entries.into_iter().collect();

        let mut inner = self.inner.write();
        inner.map = Arc::new(map);
        inner.size = size;
    }

    /// Current version of the map; later writes do not affect it
    pub fn frozen(&self) -> FrozenMap {
        Arc::clone(&self.inner.read().map)
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.inner.read().size
    }

    /// Get entry count
    pub fn entry_count(&self) -> usize {
        self.inner.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().map.is_empty()
    }

    /// Remove every entry
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.map = Arc::new(BTreeMap::new());
        inner.size = 0;
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}
