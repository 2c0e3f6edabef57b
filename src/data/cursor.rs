//! Data cursors
//!
//! Typed iteration over the raw ordered keyspace.
//!
//! ```text
//!   SimpleCursor                     IndexCursor
//!   ────────────                     ───────────
//!   o\0Test\0aaa\0 -> body           i\0Test\0Symbols\0alpha\0aaa\0 -> o\0Test\0aaa\0
//!                                                                         │ second get
//!                                                                         ▼
//!                                                        o\0Test\0aaa\0 -> body
//! ```
//!
//! Every cursor is bounded by a byte prefix and moves through three
//! states: `Unpositioned` until its first seek, then `Valid` while it sits
//! on a key under the prefix, `Exhausted` once it walks off the prefix.
//! Accessors fail with [`OrdoError::InvalidCursorState`] unless `Valid`.

use std::sync::Arc;

use crate::error::{OrdoError, Result};
use crate::options::ReadOptions;
use crate::store::{OrderedStore, StoreCursor};

// =============================================================================
// Cursor State
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Created, not yet seeked
    Unpositioned,
    /// On an entry under the prefix
    Valid,
    /// Walked off the prefix (or the keyspace)
    Exhausted,
}

/// A store cursor confined to the keys starting with `prefix`
struct PrefixedCursor<C: StoreCursor> {
    inner: C,
    prefix: Vec<u8>,
    state: CursorState,
}

impl<C: StoreCursor> PrefixedCursor<C> {
    fn new(inner: C, prefix: Vec<u8>) -> Self {
        Self {
            inner,
            prefix,
            state: CursorState::Unpositioned,
        }
    }

    fn settle(&mut self) {
        self.state = match self.inner.key() {
            Some(key) if key.starts_with(&self.prefix) => CursorState::Valid,
            _ => CursorState::Exhausted,
        };
    }

    fn ensure_valid(&self) -> Result<()> {
        if self.state == CursorState::Valid {
            Ok(())
        } else {
            Err(OrdoError::InvalidCursorState)
        }
    }

    fn seek_to_first(&mut self) {
        tracing::trace!(prefix_len = self.prefix.len(), "cursor seek to first");
        self.inner.seek_to(&self.prefix);
        self.settle();
    }

    fn seek_to_last(&mut self) {
        tracing::trace!(prefix_len = self.prefix.len(), "cursor seek to last");
        match prefix_successor(&self.prefix) {
            Some(successor) => {
                self.inner.seek_to(&successor);
                if self.inner.is_valid() {
                    self.inner.prev();
                } else {
                    self.inner.seek_to_last();
                }
            }
            None => self.inner.seek_to_last(),
        }
        self.settle();
    }

    fn seek_to(&mut self, target: &[u8]) {
        tracing::trace!(target_len = target.len(), "cursor seek");
        if target < self.prefix.as_slice() {
            self.inner.seek_to(&self.prefix);
        } else {
            self.inner.seek_to(target);
        }
        self.settle();
    }

    fn next(&mut self) -> Result<()> {
        self.ensure_valid()?;
        self.inner.next();
        self.settle();
        Ok(())
    }

    fn prev(&mut self) -> Result<()> {
        self.ensure_valid()?;
        self.inner.prev();
        self.settle();
        Ok(())
    }

    fn key(&self) -> Result<&[u8]> {
        self.ensure_valid()?;
        self.inner.key().ok_or(OrdoError::InvalidCursorState)
    }

    fn value(&self) -> Result<&[u8]> {
        self.ensure_valid()?;
        self.inner.value().ok_or(OrdoError::InvalidCursorState)
    }
}

/// Smallest key greater than every key starting with `prefix`, `None` when
/// no such key exists (empty or all-0xFF prefix)
fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut successor = prefix.to_vec();
    while let Some(last) = successor.pop() {
        if last < u8::MAX {
            successor.push(last + 1);
            return Some(successor);
        }
    }
    None
}

/// Whether a bulk read may take one more entry
///
/// `max_entries` is a hard cap; the byte budget always lets the first
/// entry through.
fn has_room(count: usize, bytes: usize, max_entries: usize, size_hint: usize) -> bool {
    count < max_entries && (count == 0 || bytes < size_hint)
}

// =============================================================================
// Simple Cursor
// =============================================================================

/// Direct scan over object entries
///
/// `transient_*` results borrow from the cursor and are only valid until
/// it moves.
pub struct SimpleCursor<C: StoreCursor> {
    cursor: PrefixedCursor<C>,
}

impl<C: StoreCursor> SimpleCursor<C> {
    pub(crate) fn new(inner: C, prefix: Vec<u8>) -> Self {
        Self {
            cursor: PrefixedCursor::new(inner, prefix),
        }
    }

    pub fn state(&self) -> CursorState {
        self.cursor.state
    }

    pub fn is_valid(&self) -> bool {
        self.cursor.state == CursorState::Valid
    }

    pub fn seek_to_first(&mut self) {
        self.cursor.seek_to_first();
    }

    pub fn seek_to_last(&mut self) {
        self.cursor.seek_to_last();
    }

    /// Position on the first entry at or after `key`, within the prefix
    pub fn seek_to(&mut self, key: &[u8]) {
        self.cursor.seek_to(key);
    }

    pub fn next(&mut self) -> Result<()> {
        self.cursor.next()
    }

    pub fn prev(&mut self) -> Result<()> {
        self.cursor.prev()
    }

    /// Object key of the current entry
    pub fn transient_key(&self) -> Result<&[u8]> {
        self.cursor.key()
    }

    /// Body of the current entry
    pub fn transient_value(&self) -> Result<&[u8]> {
        self.cursor.value()
    }

    /// Copy up to `max_entries` entries, starting with the current one,
    /// into owned buffers and move past them
    ///
    /// Stops early when the cursor is exhausted or once the copied bytes
    /// reach `size_hint`. Unless `max_entries` is zero, at least one entry
    /// is copied.
    pub fn next_array(&mut self, max_entries: usize, size_hint: usize) -> Result<ValuesArray> {
        self.cursor.ensure_valid()?;

        let mut array = ValuesArray::default();
        let mut bytes = 0;
        while self.is_valid() && has_room(array.len(), bytes, max_entries, size_hint) {
            let key = self.cursor.key()?.to_vec();
            let value = self.cursor.value()?.to_vec();
            bytes += key.len() + value.len();
            array.keys.push(key);
            array.values.push(value);
            self.cursor.next()?;
        }
        Ok(array)
    }
}

// =============================================================================
// Index Cursor
// =============================================================================

/// Scan over index entries, each resolved to the body of the object it
/// points at
///
/// The stored value of an index entry is an object key. `transient_value`
/// performs the second lookup and caches the body until the cursor moves.
pub struct IndexCursor<S: OrderedStore> {
    cursor: PrefixedCursor<S::Cursor>,
    store: Arc<S>,
    snapshot: Option<S::Snapshot>,
    options: ReadOptions,
    /// Second-hop result for the current entry, once looked up
    resolved: Option<Option<Vec<u8>>>,
}

impl<S: OrderedStore> IndexCursor<S> {
    pub(crate) fn new(
        inner: S::Cursor,
        prefix: Vec<u8>,
        store: Arc<S>,
        snapshot: Option<S::Snapshot>,
        options: ReadOptions,
    ) -> Self {
        Self {
            cursor: PrefixedCursor::new(inner, prefix),
            store,
            snapshot,
            options,
            resolved: None,
        }
    }

    pub fn state(&self) -> CursorState {
        self.cursor.state
    }

    pub fn is_valid(&self) -> bool {
        self.cursor.state == CursorState::Valid
    }

    pub fn seek_to_first(&mut self) {
        self.resolved = None;
        self.cursor.seek_to_first();
    }

    pub fn seek_to_last(&mut self) {
        self.resolved = None;
        self.cursor.seek_to_last();
    }

    /// Position on the first index entry at or after `key`, within the prefix
    pub fn seek_to(&mut self, key: &[u8]) {
        self.resolved = None;
        self.cursor.seek_to(key);
    }

    pub fn next(&mut self) -> Result<()> {
        self.cursor.next()?;
        self.resolved = None;
        Ok(())
    }

    pub fn prev(&mut self) -> Result<()> {
        self.cursor.prev()?;
        self.resolved = None;
        Ok(())
    }

    /// Index key of the current entry
    pub fn transient_key(&self) -> Result<&[u8]> {
        self.cursor.key()
    }

    /// Object key the current entry points at
    pub fn transient_object_key(&self) -> Result<&[u8]> {
        self.cursor.value()
    }

    /// Body of the object the current entry points at
    ///
    /// `None` when that object is missing: the entry is still surfaced so
    /// the inconsistency stays visible.
    pub fn transient_value(&mut self) -> Result<Option<&[u8]>> {
        if self.resolved.is_none() {
            let body = self.resolve_current()?;
            self.resolved = Some(body);
        }
        Ok(self.resolved.as_ref().and_then(|body| body.as_deref()))
    }

    /// Bulk variant of the two-hop read, see [`SimpleCursor::next_array`]
    pub fn next_indirect_array(
        &mut self,
        max_entries: usize,
        size_hint: usize,
    ) -> Result<IndirectValuesArray> {
        self.cursor.ensure_valid()?;

        let mut array = IndirectValuesArray::default();
        let mut bytes = 0;
        while self.is_valid() && has_room(array.len(), bytes, max_entries, size_hint) {
            let body = match self.resolved.take() {
                Some(body) => body,
                None => self.resolve_current()?,
            };
            let key = self.cursor.key()?.to_vec();
            let object_key = self.cursor.value()?.to_vec();

            bytes += key.len() + object_key.len() + body.as_ref().map_or(0, Vec::len);
            array.keys.push(key);
            array.object_keys.push(object_key);
            array.values.push(body);
            self.next()?;
        }
        Ok(array)
    }

    fn resolve_current(&self) -> Result<Option<Vec<u8>>> {
        let object_key = self.cursor.value()?;
        let body = self
            .store
            .get(object_key, &self.options, self.snapshot.as_ref())?;
        if body.is_none() {
            tracing::warn!(
                index_key = %String::from_utf8_lossy(self.cursor.key()?),
                "index entry points at a missing object"
            );
        }
        Ok(body)
    }
}

// =============================================================================
// Either Cursor
// =============================================================================

/// A simple or an index cursor behind one interface
pub enum DataCursor<S: OrderedStore> {
    Simple(SimpleCursor<S::Cursor>),
    Index(IndexCursor<S>),
}

impl<S: OrderedStore> DataCursor<S> {
    pub fn state(&self) -> CursorState {
        match self {
            DataCursor::Simple(c) => c.state(),
            DataCursor::Index(c) => c.state(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.state() == CursorState::Valid
    }

    pub fn seek_to_first(&mut self) {
        match self {
            DataCursor::Simple(c) => c.seek_to_first(),
            DataCursor::Index(c) => c.seek_to_first(),
        }
    }

    pub fn seek_to_last(&mut self) {
        match self {
            DataCursor::Simple(c) => c.seek_to_last(),
            DataCursor::Index(c) => c.seek_to_last(),
        }
    }

    pub fn seek_to(&mut self, key: &[u8]) {
        match self {
            DataCursor::Simple(c) => c.seek_to(key),
            DataCursor::Index(c) => c.seek_to(key),
        }
    }

    pub fn next(&mut self) -> Result<()> {
        match self {
            DataCursor::Simple(c) => c.next(),
            DataCursor::Index(c) => c.next(),
        }
    }

    pub fn prev(&mut self) -> Result<()> {
        match self {
            DataCursor::Simple(c) => c.prev(),
            DataCursor::Index(c) => c.prev(),
        }
    }

    pub fn transient_key(&self) -> Result<&[u8]> {
        match self {
            DataCursor::Simple(c) => c.transient_key(),
            DataCursor::Index(c) => c.transient_key(),
        }
    }

    /// Body of the current record, resolved through the index if needed
    pub fn transient_value(&mut self) -> Result<Option<&[u8]>> {
        match self {
            DataCursor::Simple(c) => c.transient_value().map(Some),
            DataCursor::Index(c) => c.transient_value(),
        }
    }

    pub fn next_array(&mut self, max_entries: usize, size_hint: usize) -> Result<CursorArray> {
        match self {
            DataCursor::Simple(c) => c.next_array(max_entries, size_hint).map(CursorArray::Simple),
            DataCursor::Index(c) => c
                .next_indirect_array(max_entries, size_hint)
                .map(CursorArray::Indirect),
        }
    }
}

impl<C: StoreCursor, S: OrderedStore<Cursor = C>> From<SimpleCursor<C>> for DataCursor<S> {
    fn from(cursor: SimpleCursor<C>) -> Self {
        DataCursor::Simple(cursor)
    }
}

impl<S: OrderedStore> From<IndexCursor<S>> for DataCursor<S> {
    fn from(cursor: IndexCursor<S>) -> Self {
        DataCursor::Index(cursor)
    }
}

// =============================================================================
// Bulk Arrays
// =============================================================================

fn check_index(index: usize, size: usize) -> Result<()> {
    if index < size {
        Ok(())
    } else {
        Err(OrdoError::OutOfRange { index, size })
    }
}

/// Owned entries copied by [`SimpleCursor::next_array`]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValuesArray {
    keys: Vec<Vec<u8>>,
    values: Vec<Vec<u8>>,
}

impl ValuesArray {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn key(&self, index: usize) -> Result<&[u8]> {
        check_index(index, self.len())?;
        Ok(&self.keys[index])
    }

    pub fn value(&self, index: usize) -> Result<&[u8]> {
        check_index(index, self.len())?;
        Ok(&self.values[index])
    }

    /// `(key, value)` pairs in cursor order
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> + '_ {
        self.keys
            .iter()
            .zip(&self.values)
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}

/// Owned entries copied by [`IndexCursor::next_indirect_array`]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndirectValuesArray {
    keys: Vec<Vec<u8>>,
    object_keys: Vec<Vec<u8>>,
    values: Vec<Option<Vec<u8>>>,
}

impl IndirectValuesArray {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Index key
    pub fn key(&self, index: usize) -> Result<&[u8]> {
        check_index(index, self.len())?;
        Ok(&self.keys[index])
    }

    /// Object key the index entry points at
    pub fn object_key(&self, index: usize) -> Result<&[u8]> {
        check_index(index, self.len())?;
        Ok(&self.object_keys[index])
    }

    /// Resolved body, `None` when the object is missing
    pub fn value(&self, index: usize) -> Result<Option<&[u8]>> {
        check_index(index, self.len())?;
        Ok(self.values[index].as_deref())
    }
}

/// Result of [`DataCursor::next_array`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorArray {
    Simple(ValuesArray),
    Indirect(IndirectValuesArray),
}

impl CursorArray {
    pub fn len(&self) -> usize {
        match self {
            CursorArray::Simple(a) => a.len(),
            CursorArray::Indirect(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Object or index key at `index`
    pub fn key(&self, index: usize) -> Result<&[u8]> {
        match self {
            CursorArray::Simple(a) => a.key(index),
            CursorArray::Indirect(a) => a.key(index),
        }
    }

    /// Body at `index`
    pub fn value(&self, index: usize) -> Result<Option<&[u8]>> {
        match self {
            CursorArray::Simple(a) => a.value(index).map(Some),
            CursorArray::Indirect(a) => a.value(index),
        }
    }
}
