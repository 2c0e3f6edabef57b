//! Data database
//!
//! Entry point of the data layer: writes records through the index
//! maintainer under the indexes lock, reads through [`DataRead`].

use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::key::{self, check_name, IndexSet, Value};
use crate::options::WriteOptions;
use crate::store::{LogStore, OrderedStore};

use super::batch::DataBatch;
use super::guard::IndexesLock;
use super::maintainer::{self, StoreRefs};
use super::read::DataRead;
use super::snapshot::DataSnapshot;

/// Typed records with secondary indexes over an ordered store
///
/// ## Concurrency
///
/// `DataDb` is `Send + Sync`; share it behind an `Arc`.
/// - Reads never take the indexes lock
/// - `put`, `delete` and batch writes hold it from the reference record
///   read until their batch is written, so writers run one at a time
pub struct DataDb<S: OrderedStore = LogStore> {
    store: Arc<S>,
    indexes_lock: IndexesLock,
}

impl DataDb<LogStore> {
    /// Open a database on the bundled engine
    pub fn open(config: Config) -> Result<Self> {
        Ok(Self::new(LogStore::open(config)?))
    }

    /// Open with default config in `path`
    pub fn open_path(path: &Path) -> Result<Self> {
        Ok(Self::new(LogStore::open_path(path)?))
    }

    /// A database that keeps nothing on disk
    pub fn in_memory() -> Self {
        Self::new(LogStore::in_memory())
    }
}

impl<S: OrderedStore> DataDb<S> {
    /// Wrap an already opened store
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
            indexes_lock: IndexesLock::new(),
        }
    }

    /// Store (or replace) a record with exactly the given indexes
    ///
    /// Returns the number of body bytes written.
    pub fn put(
        &self,
        type_name: &str,
        primary_key: &Value,
        body: &[u8],
        indexes: &IndexSet,
        options: &WriteOptions,
    ) -> Result<usize> {
        self.put_and_get_key(type_name, primary_key, body, indexes, options)
            .map(|(_, len)| len)
    }

    /// Like [`put`](Self::put), also returning the record's object key
    pub fn put_and_get_key(
        &self,
        type_name: &str,
        primary_key: &Value,
        body: &[u8],
        indexes: &IndexSet,
        options: &WriteOptions,
    ) -> Result<(Vec<u8>, usize)> {
        check_name("type", type_name)?;
        let object_key = key::object_key(type_name, Some(primary_key), false);

        let guard = self.indexes_lock.acquire();
        let refs = StoreRefs::latest(self.store.as_ref());
        let mutations =
            maintainer::compute_put_mutations(&guard, &refs, &object_key, body, indexes)?;
        self.store.write(&mutations.batch, options)?;
        drop(guard);

        tracing::debug!(
            type_name,
            key_len = object_key.len(),
            body_len = body.len(),
            indexes = indexes.len(),
            "put"
        );
        Ok((object_key, body.len()))
    }

    /// Remove a record, its indexes and its reference record
    pub fn delete(&self, key: &[u8], options: &WriteOptions) -> Result<()> {
        let guard = self.indexes_lock.acquire();
        let refs = StoreRefs::latest(self.store.as_ref());
        let mutations = maintainer::compute_delete_mutations(&guard, &refs, key)?;
        self.store.write(&mutations.batch, options)?;
        drop(guard);

        tracing::debug!(key_len = key.len(), ops = mutations.batch.len(), "delete");
        Ok(())
    }

    /// Freeze the current state for consistent reads
    pub fn new_snapshot(&self) -> Result<DataSnapshot<S>> {
        let snapshot = self.store.new_snapshot()?;
        Ok(DataSnapshot::new(Arc::clone(&self.store), snapshot))
    }

    /// Start collecting puts and deletes to write together
    pub fn new_batch(&self) -> DataBatch<'_, S> {
        DataBatch::new(self)
    }

    /// Close the underlying store
    pub fn close(&self) -> Result<()> {
        self.store.close()
    }

    pub(crate) fn indexes_lock(&self) -> &IndexesLock {
        &self.indexes_lock
    }
}

impl<S: OrderedStore> DataRead for DataDb<S> {
    type Store = S;

    fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn store_snapshot(&self) -> Option<&S::Snapshot> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ReadOptions;

    fn value(segments: &[&str]) -> Value {
        Value::of_ascii(segments).unwrap()
    }

    #[test]
    fn test_put_returns_body_length_and_key() {
        let db = DataDb::in_memory();
        let (key, len) = db
            .put_and_get_key(
                "Test",
                &value(&["aaa"]),
                b"ValueA1!",
                &IndexSet::new(),
                &WriteOptions::DEFAULT,
            )
            .unwrap();

        assert_eq!(len, 8);
        assert_eq!(key, b"o\0Test\0aaa\0".to_vec());
        assert_eq!(
            db.get(&key, &ReadOptions::DEFAULT).unwrap(),
            Some(b"ValueA1!".to_vec())
        );
    }

    #[test]
    fn test_type_with_nul_is_rejected() {
        let db = DataDb::in_memory();
        let result = db.put(
            "Te\0st",
            &value(&["aaa"]),
            b"x",
            &IndexSet::new(),
            &WriteOptions::DEFAULT,
        );
        assert!(result.is_err());
        assert!(!db.indexes_lock().is_locked());
    }

    #[test]
    fn test_write_failure_releases_lock() {
        let db = DataDb::in_memory();
        db.close().unwrap();

        let result = db.put(
            "Test",
            &value(&["aaa"]),
            b"x",
            &IndexSet::new(),
            &WriteOptions::DEFAULT,
        );
        assert!(result.is_err());
        assert!(!db.indexes_lock().is_locked());
    }
}
