//! Data snapshot
//!
//! A frozen view of the database. Every lookup and cursor opened on it
//! reads the state at the time it was taken, whatever is written later.

use std::sync::Arc;

use crate::store::OrderedStore;

use super::read::DataRead;

/// Point-in-time read view of a [`DataDb`](super::DataDb)
///
/// The store keeps the captured version alive until the snapshot and every
/// cursor opened on it are dropped.
pub struct DataSnapshot<S: OrderedStore> {
    store: Arc<S>,
    snapshot: S::Snapshot,
}

impl<S: OrderedStore> DataSnapshot<S> {
    pub(crate) fn new(store: Arc<S>, snapshot: S::Snapshot) -> Self {
        Self { store, snapshot }
    }
}

impl<S: OrderedStore> DataRead for DataSnapshot<S> {
    type Store = S;

    fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn store_snapshot(&self) -> Option<&S::Snapshot> {
        Some(&self.snapshot)
    }
}
