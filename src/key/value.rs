//! Key values
//!
//! Multi-segment values used as primary keys and index values, plus the
//! (name, value) index pairs attached to a record.

use std::fmt;

use crate::error::{OrdoError, Result};

use super::codec::SEPARATOR;

/// An ordered, non-empty sequence of byte segments.
///
/// No segment may contain the `0x00` separator; the constructors reject it
/// because the key encoding would otherwise be ambiguous.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Value {
    segments: Vec<Vec<u8>>,
}

impl Value {
    /// Build a value from raw byte segments
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<Vec<u8>>,
    {
        let segments: Vec<Vec<u8>> = segments.into_iter().map(Into::into).collect();

        if segments.is_empty() {
            return Err(OrdoError::InvalidKey(
                "a value needs at least one segment".to_string(),
            ));
        }
        if let Some(pos) = segments.iter().position(|s| s.contains(&SEPARATOR)) {
            return Err(OrdoError::InvalidKey(format!(
                "segment {} contains a NUL byte",
                pos
            )));
        }

        Ok(Self { segments })
    }

    /// Build a value from string segments
    pub fn of_ascii(segments: &[&str]) -> Result<Self> {
        Self::new(segments.iter().map(|s| s.as_bytes().to_vec()))
    }

    /// Iterate the segments in order
    pub fn segments(&self) -> impl ExactSizeIterator<Item = &[u8]> + '_ {
        self.segments.iter().map(Vec::as_slice)
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Bytes taken by the segments once encoded, terminators included
    pub fn encoded_size(&self) -> usize {
        self.segments.iter().map(|s| s.len() + 1).sum()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for segment in &self.segments {
            list.entry(&String::from_utf8_lossy(segment));
        }
        list.finish()
    }
}

/// One secondary index entry for a record: an index name and the value
/// indexed under it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Index {
    name: String,
    value: Value,
}

impl Index {
    pub fn new(name: impl Into<String>, value: Value) -> Result<Self> {
        let name = name.into();
        check_name("index name", &name)?;
        Ok(Self { name, value })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// The indexes attached to one record.
///
/// Keeps insertion order (the reference record lists entries in this
/// order) and ignores duplicate (name, value) pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSet {
    indexes: Vec<Index>,
}

impl IndexSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an index; returns false if the same pair was already present
    pub fn insert(&mut self, index: Index) -> bool {
        if self.indexes.contains(&index) {
            return false;
        }
        self.indexes.push(index);
        true
    }

    /// Builder-style insert of a `name -> value` pair
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Result<Self> {
        self.insert(Index::new(name, value)?);
        Ok(self)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Index> {
        self.indexes.iter()
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}

impl FromIterator<Index> for IndexSet {
    fn from_iter<T: IntoIterator<Item = Index>>(iter: T) -> Self {
        let mut set = IndexSet::new();
        for index in iter {
            set.insert(index);
        }
        set
    }
}

impl<'a> IntoIterator for &'a IndexSet {
    type Item = &'a Index;
    type IntoIter = std::slice::Iter<'a, Index>;

    fn into_iter(self) -> Self::IntoIter {
        self.indexes.iter()
    }
}

/// Reject type and index names the encoding cannot carry
pub fn check_name(kind: &str, name: &str) -> Result<()> {
    if name.as_bytes().contains(&SEPARATOR) {
        return Err(OrdoError::InvalidKey(format!("{} contains a NUL byte", kind)));
    }
    Ok(())
}
