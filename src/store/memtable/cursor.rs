//! MemTable cursor
//!
//! Bidirectional cursor over a frozen map version.

use std::ops::Bound;

use crate::store::StoreCursor;

use super::FrozenMap;

/// Cursor over one frozen version of the keyspace
///
/// Holds its own reference to the map, so later writes are invisible to
/// it and the version stays alive until the cursor is dropped.
pub struct MemTableCursor {
    map: FrozenMap,
    /// Key the cursor is positioned on, `None` when invalid
    current: Option<Vec<u8>>,
}

impl MemTableCursor {
    pub fn new(map: FrozenMap) -> Self {
        Self { map, current: None }
    }

    fn first_in(&self, lower: Bound<&[u8]>) -> Option<Vec<u8>> {
        self.map
            .range::<[u8], _>((lower, Bound::Unbounded))
            .next()
            .map(|(k, _)| k.clone())
    }

    fn last_before(&self, upper: Bound<&[u8]>) -> Option<Vec<u8>> {
        self.map
            .range::<[u8], _>((Bound::Unbounded, upper))
            .next_back()
            .map(|(k, _)| k.clone())
    }
}

impl StoreCursor for MemTableCursor {
    fn is_valid(&self) -> bool {
        self.current.is_some()
    }

    fn seek_to_first(&mut self) {
        self.current = self.map.keys().next().cloned();
    }

    fn seek_to_last(&mut self) {
        self.current = self.map.keys().next_back().cloned();
    }

    fn seek_to(&mut self, target: &[u8]) {
        self.current = self.first_in(Bound::Included(target));
    }

    fn next(&mut self) {
        if let Some(current) = self.current.take() {
            self.current = self.first_in(Bound::Excluded(current.as_slice()));
        }
    }

    fn prev(&mut self) {
        if let Some(current) = self.current.take() {
            self.current = self.last_before(Bound::Excluded(current.as_slice()));
        }
    }

    fn key(&self) -> Option<&[u8]> {
        self.current.as_deref()
    }

    fn value(&self) -> Option<&[u8]> {
        let key = self.current.as_deref()?;
        self.map.get(key).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn cursor_over(keys: &[&str]) -> MemTableCursor {
        let map: BTreeMap<Vec<u8>, Vec<u8>> = keys
            .iter()
            .map(|k| (k.as_bytes().to_vec(), k.to_uppercase().into_bytes()))
            .collect();
        MemTableCursor::new(Arc::new(map))
    }

    #[test]
    fn test_new_cursor_is_unpositioned() {
        let cursor = cursor_over(&["a"]);
        assert!(!cursor.is_valid());
        assert_eq!(cursor.key(), None);
    }

    #[test]
    fn test_forward_and_backward() {
        let mut cursor = cursor_over(&["a", "b", "c"]);

        cursor.seek_to_first();
        assert_eq!(cursor.key(), Some(&b"a"[..]));
        cursor.next();
        assert_eq!(cursor.value(), Some(&b"B"[..]));
        cursor.next();
        cursor.next();
        assert!(!cursor.is_valid());

        cursor.seek_to_last();
        assert_eq!(cursor.key(), Some(&b"c"[..]));
        cursor.prev();
        cursor.prev();
        assert_eq!(cursor.key(), Some(&b"a"[..]));
        cursor.prev();
        assert!(!cursor.is_valid());
    }

    #[test]
    fn test_seek_lands_on_first_key_at_or_after_target() {
        let mut cursor = cursor_over(&["apple", "banana", "cherry"]);

        cursor.seek_to(b"b");
        assert_eq!(cursor.key(), Some(&b"banana"[..]));
        cursor.seek_to(b"banana");
        assert_eq!(cursor.key(), Some(&b"banana"[..]));
        cursor.seek_to(b"d");
        assert!(!cursor.is_valid());
    }

    #[test]
    fn test_empty_map() {
        let mut cursor = cursor_over(&[]);
        cursor.seek_to_first();
        assert!(!cursor.is_valid());
        cursor.seek_to_last();
        assert!(!cursor.is_valid());
        cursor.next();
        assert!(!cursor.is_valid());
    }
}
