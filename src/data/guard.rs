//! Indexes lock
//!
//! Serializes every read-compute-write sequence that maintains indexes.

use parking_lot::{Mutex, MutexGuard};

/// Store-wide lock around index maintenance
///
/// The store makes a batch write atomic, but not the read of the reference
/// record that decides what goes into the batch. Holding this lock from
/// that read until the batch is written keeps two writers of the same key
/// from interleaving.
#[derive(Default)]
pub struct IndexesLock {
    inner: Mutex<()>,
}

/// Proof that the indexes lock is held
///
/// Index maintenance functions take a reference to it, so they cannot be
/// called outside the critical section. Dropping it unlocks, on every exit
/// path.
pub struct IndexesGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl IndexesLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the lock is free and take it
    pub fn acquire(&self) -> IndexesGuard<'_> {
        IndexesGuard {
            _guard: self.inner.lock(),
        }
    }

    /// Whether some writer currently holds the lock
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }
}
