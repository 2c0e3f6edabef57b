//! Table Iterator
//!
//! Sequential iteration over the data block of a loaded table.

use crate::error::{OrdoError, Result};

use super::ENTRY_HEADER_SIZE;

/// Iterator over table entries in sorted key order
pub struct TableIterator<'a> {
    /// Remaining bytes of the data block
    data: &'a [u8],
    /// Offset of `data` inside the file, for error messages
    offset: usize,
}

impl<'a> TableIterator<'a> {
    pub(super) fn new(data: &'a [u8], offset: usize) -> Self {
        Self { data, offset }
    }

    fn truncated(&mut self) -> OrdoError {
        self.data = &[];
        OrdoError::StoreFailure(format!("table entry truncated at offset {}", self.offset))
    }
}

impl<'a> Iterator for TableIterator<'a> {
    /// (key, value) borrowed from the loaded file
    type Item = Result<(&'a [u8], &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.is_empty() {
            return None;
        }
        if self.data.len() < ENTRY_HEADER_SIZE {
            return Some(Err(self.truncated()));
        }

        let mut len = [0u8; 4];
        len.copy_from_slice(&self.data[0..4]);
        let key_len = u32::from_le_bytes(len) as usize;
        len.copy_from_slice(&self.data[4..8]);
        let val_len = u32::from_le_bytes(len) as usize;

        let entry_size = ENTRY_HEADER_SIZE + key_len + val_len;
        if self.data.len() < entry_size {
            return Some(Err(self.truncated()));
        }

        let data: &'a [u8] = self.data;
        let key = &data[ENTRY_HEADER_SIZE..ENTRY_HEADER_SIZE + key_len];
        let value = &data[ENTRY_HEADER_SIZE + key_len..entry_size];

        self.data = &data[entry_size..];
        self.offset += entry_size;

        Some(Ok((key, value)))
    }
}
