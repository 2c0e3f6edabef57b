//! Read surface shared by the database and its snapshots

use std::sync::Arc;

use crate::error::Result;
use crate::key::{self, check_name, Value};
use crate::options::ReadOptions;
use crate::store::OrderedStore;

use super::cursor::{IndexCursor, SimpleCursor};
use super::maintainer::{self, StoreRefs};

/// Simple cursor type of a reader's store
pub type StoreSimpleCursor<S> = SimpleCursor<<S as OrderedStore>::Cursor>;

/// Lookups and scans over stored records
///
/// Implementors only say which store, and which snapshot of it, to read;
/// every operation is provided on top. Cursors come back already seeked to
/// the first matching entry, or `Exhausted` when there is none.
pub trait DataRead {
    type Store: OrderedStore;

    fn store(&self) -> &Arc<Self::Store>;

    /// Snapshot every read goes through, `None` for the latest state
    fn store_snapshot(&self) -> Option<&<Self::Store as OrderedStore>::Snapshot>;

    /// Body stored under an object key
    fn get(&self, key: &[u8], options: &ReadOptions) -> Result<Option<Vec<u8>>> {
        self.store().get(key, options, self.store_snapshot())
    }

    /// Every record of every type
    fn find_all(&self, options: &ReadOptions) -> Result<StoreSimpleCursor<Self::Store>> {
        self.simple_cursor(key::codec::OBJECT_EMPTY_PREFIX.to_vec(), options)
    }

    /// Every record of one type, in primary key order
    fn find_by_type(
        &self,
        type_name: &str,
        options: &ReadOptions,
    ) -> Result<StoreSimpleCursor<Self::Store>> {
        check_name("type", type_name)?;
        self.simple_cursor(key::object_key(type_name, None, false), options)
    }

    /// Records matching a primary key
    ///
    /// With `is_open` the last segment matches as a byte prefix, so `["a"]`
    /// finds `["a"]`, `["ab"]` and `["a", "b"]`; otherwise the listed
    /// segments must match whole.
    fn find_by_primary_key(
        &self,
        type_name: &str,
        primary_key: &Value,
        is_open: bool,
        options: &ReadOptions,
    ) -> Result<StoreSimpleCursor<Self::Store>> {
        check_name("type", type_name)?;
        self.simple_cursor(key::object_key(type_name, Some(primary_key), is_open), options)
    }

    /// Every record indexed under `name`, in index value order
    fn find_all_by_index(
        &self,
        type_name: &str,
        name: &str,
        options: &ReadOptions,
    ) -> Result<IndexCursor<Self::Store>> {
        check_name("type", type_name)?;
        check_name("index name", name)?;
        self.index_cursor(key::index_key_start(type_name, name, None, false), options)
    }

    /// Records indexed under `name` with `value`; `is_open` as in
    /// [`find_by_primary_key`](DataRead::find_by_primary_key)
    fn find_by_index(
        &self,
        type_name: &str,
        name: &str,
        value: &Value,
        is_open: bool,
        options: &ReadOptions,
    ) -> Result<IndexCursor<Self::Store>> {
        check_name("type", type_name)?;
        check_name("index name", name)?;
        self.index_cursor(
            key::index_key_start(type_name, name, Some(value), is_open),
            options,
        )
    }

    /// Names of the indexes attached to a record, once per indexed value
    fn get_indexes_of(&self, key: &[u8], options: &ReadOptions) -> Result<Vec<String>> {
        let refs = StoreRefs::new(self.store().as_ref(), *options, self.store_snapshot());
        maintainer::list_index_names(&refs, key)
    }

    /// Encode the object key of a record without touching the store
    fn object_key(&self, type_name: &str, primary_key: &Value) -> Result<Vec<u8>> {
        check_name("type", type_name)?;
        Ok(key::object_key(type_name, Some(primary_key), false))
    }

    #[doc(hidden)]
    fn simple_cursor(
        &self,
        prefix: Vec<u8>,
        options: &ReadOptions,
    ) -> Result<StoreSimpleCursor<Self::Store>> {
        let inner = self.store().new_cursor(options, self.store_snapshot())?;
        let mut cursor = SimpleCursor::new(inner, prefix);
        cursor.seek_to_first();
        Ok(cursor)
    }

    #[doc(hidden)]
    fn index_cursor(
        &self,
        prefix: Vec<u8>,
        options: &ReadOptions,
    ) -> Result<IndexCursor<Self::Store>> {
        let inner = self.store().new_cursor(options, self.store_snapshot())?;
        let mut cursor = IndexCursor::new(
            inner,
            prefix,
            Arc::clone(self.store()),
            self.store_snapshot().cloned(),
            *options,
        );
        cursor.seek_to_first();
        Ok(cursor)
    }
}
