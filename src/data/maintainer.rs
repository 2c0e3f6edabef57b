//! Index maintenance
//!
//! Computes the store mutations that move one record to a new state while
//! keeping its index entries and reference record consistent.
//!
//! For a put of `object_key` with indexes `S`:
//! 1. read the reference record at `ref_key`
//! 2. delete every index key it lists, and the record itself
//! 3. put `index_key -> object_key` for each index in `S`
//! 4. put the new reference record if `S` is non-empty
//! 5. put `object_key -> body`
//!
//! Steps 2-5 go into one batch; the store applies it as a final
//! key -> value/tombstone map, so an index present in both the old and new
//! sets survives as a single entry. Step 1 must not race another writer,
//! hence every entry point takes an [`IndexesGuard`].

use std::collections::HashMap;

use crate::error::{OrdoError, Result};
use crate::key::{self, IndexSet};
use crate::options::ReadOptions;
use crate::store::{OrderedStore, WriteBatch};

use super::guard::IndexesGuard;

// =============================================================================
// Reference Record Lookup
// =============================================================================

/// Source of reference records
pub trait RefLookup {
    fn lookup_ref(&self, ref_key: &[u8]) -> Result<Option<Vec<u8>>>;
}

/// Reads reference records straight from a store (or one of its snapshots)
pub struct StoreRefs<'a, S: OrderedStore> {
    store: &'a S,
    options: ReadOptions,
    snapshot: Option<&'a S::Snapshot>,
}

impl<'a, S: OrderedStore> StoreRefs<'a, S> {
    /// Latest committed state, as writers need it
    pub fn latest(store: &'a S) -> Self {
        Self {
            store,
            options: ReadOptions::DEFAULT,
            snapshot: None,
        }
    }

    pub fn new(store: &'a S, options: ReadOptions, snapshot: Option<&'a S::Snapshot>) -> Self {
        Self {
            store,
            options,
            snapshot,
        }
    }
}

impl<S: OrderedStore> RefLookup for StoreRefs<'_, S> {
    fn lookup_ref(&self, ref_key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.store.get(ref_key, &self.options, self.snapshot)
    }
}

/// Reference records already rewritten by earlier steps of the same batch,
/// layered over a base source
pub struct PendingRefs<'a, L: RefLookup> {
    base: &'a L,
    pending: HashMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a, L: RefLookup> PendingRefs<'a, L> {
    pub fn new(base: &'a L) -> Self {
        Self {
            base,
            pending: HashMap::new(),
        }
    }

    /// Record the state a mutation leaves its reference record in
    pub fn record(&mut self, mutations: &Mutations) {
        self.pending
            .insert(mutations.ref_key.clone(), mutations.ref_value.clone());
    }
}

impl<L: RefLookup> RefLookup for PendingRefs<'_, L> {
    fn lookup_ref(&self, ref_key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.pending.get(ref_key) {
            Some(value) => Ok(value.clone()),
            None => self.base.lookup_ref(ref_key),
        }
    }
}

// =============================================================================
// Mutations
// =============================================================================

/// The batch moving one record to its new state
#[derive(Debug)]
pub struct Mutations {
    /// Store operations to apply atomically
    pub batch: WriteBatch,

    /// Reference record key of the record
    pub ref_key: Vec<u8>,

    /// Reference record value after the batch, `None` when absent
    pub ref_value: Option<Vec<u8>>,
}

/// Mutations for putting `body` under `object_key` with exactly `indexes`
pub fn compute_put_mutations(
    _guard: &IndexesGuard<'_>,
    refs: &impl RefLookup,
    object_key: &[u8],
    body: &[u8],
    indexes: &IndexSet,
) -> Result<Mutations> {
    let ref_key = key::ref_key_from_object_key(object_key)?;
    let mut batch = WriteBatch::new();

    delete_indexes_in_batch(&mut batch, refs, &ref_key)?;
    let ref_value = put_indexes_in_batch(&mut batch, object_key, &ref_key, indexes)?;
    batch.put(object_key, body);

    Ok(Mutations {
        batch,
        ref_key,
        ref_value,
    })
}

/// Mutations for deleting the record at `object_key` with all its indexes
pub fn compute_delete_mutations(
    _guard: &IndexesGuard<'_>,
    refs: &impl RefLookup,
    object_key: &[u8],
) -> Result<Mutations> {
    let ref_key = key::ref_key_from_object_key(object_key)?;
    let mut batch = WriteBatch::new();

    delete_indexes_in_batch(&mut batch, refs, &ref_key)?;
    batch.delete(object_key);

    Ok(Mutations {
        batch,
        ref_key,
        ref_value: None,
    })
}

/// Names of the indexes currently attached to `object_key`, in stored
/// order. A name appears once per indexed value.
pub fn list_index_names(refs: &impl RefLookup, object_key: &[u8]) -> Result<Vec<String>> {
    let ref_key = key::ref_key_from_object_key(object_key)?;
    let record = match refs.lookup_ref(&ref_key)? {
        Some(record) => record,
        None => return Ok(Vec::new()),
    };

    key::ref_entries(&record)
        .map(|entry| {
            let name = key::index_key_name(entry?)?;
            String::from_utf8(name.to_vec()).map_err(|_| {
                OrdoError::StoreFailure("index name in reference record is not UTF-8".to_string())
            })
        })
        .collect()
}

// =============================================================================
// Private Helpers
// =============================================================================

/// Schedule deletion of every index listed by the current reference
/// record, and of the record itself
fn delete_indexes_in_batch(
    batch: &mut WriteBatch,
    refs: &impl RefLookup,
    ref_key: &[u8],
) -> Result<()> {
    let record = match refs.lookup_ref(ref_key)? {
        Some(record) => record,
        None => return Ok(()),
    };

    for entry in key::ref_entries(&record) {
        batch.delete(entry?);
    }
    batch.delete(ref_key);

    Ok(())
}

/// Schedule one index entry per index plus the reference record listing
/// them; returns the new record value
fn put_indexes_in_batch(
    batch: &mut WriteBatch,
    object_key: &[u8],
    ref_key: &[u8],
    indexes: &IndexSet,
) -> Result<Option<Vec<u8>>> {
    if indexes.is_empty() {
        return Ok(None);
    }

    let mut record = Vec::new();
    for index in indexes {
        let index_key = key::index_key(object_key, index.name(), index.value())?;
        key::codec::put_ref_entry(&mut record, &index_key);
        batch.put(&index_key, object_key);
    }
    batch.put(ref_key, &record);

    Ok(Some(record))
}
