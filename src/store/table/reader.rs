//! Table Reader
//!
//! Loads a checkpoint table into memory and validates it.

use std::fs;
use std::path::Path;

use crate::error::{OrdoError, Result};

use super::iterator::TableIterator;
use super::{FOOTER_SIZE, HEADER_SIZE, MAGIC, VERSION};

/// A checkpoint table loaded in memory
pub struct TableReader {
    /// Whole file contents
    bytes: Vec<u8>,
    /// Entry count recorded in the header
    entry_count: u64,
}

impl TableReader {
    /// Open a table, validating header and (optionally) the data CRC
    pub fn open(path: &Path, verify_checksums: bool) -> Result<Self> {
        let bytes = fs::read(path)?;

        if bytes.len() < HEADER_SIZE + FOOTER_SIZE {
            return Err(OrdoError::StoreFailure(format!(
                "table {} is too short ({} bytes)",
                path.display(),
                bytes.len()
            )));
        }

        if &bytes[0..4] != MAGIC {
            return Err(OrdoError::StoreFailure(format!(
                "Invalid table magic: expected ODBT, got {:?}",
                &bytes[0..4]
            )));
        }

        let mut version = [0u8; 2];
        version.copy_from_slice(&bytes[4..6]);
        let version = u16::from_le_bytes(version);
        if version != VERSION {
            return Err(OrdoError::StoreFailure(format!(
                "Unsupported table version: {}",
                version
            )));
        }

        let mut count = [0u8; 8];
        count.copy_from_slice(&bytes[6..14]);
        let entry_count = u64::from_le_bytes(count);

        let reader = Self { bytes, entry_count };

        if verify_checksums {
            let footer = reader.footer_offset();
            let mut crc = [0u8; 4];
            crc.copy_from_slice(&reader.bytes[footer..footer + 4]);
            let expected = u32::from_le_bytes(crc);
            let actual = crc32fast::hash(reader.data_block());
            if expected != actual {
                return Err(OrdoError::StoreFailure(format!(
                    "table {} CRC mismatch: expected {:#010x}, got {:#010x}",
                    path.display(),
                    expected,
                    actual
                )));
            }
        }

        Ok(reader)
    }

    /// Entry count recorded in the header
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Iterate all entries in key order
    pub fn iter(&self) -> TableIterator<'_> {
        TableIterator::new(self.data_block(), HEADER_SIZE)
    }

    /// Copy every entry out, checking the count against the header
    pub fn entries(&self) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let entries = self
            .iter()
            .map(|entry| entry.map(|(k, v)| (k.to_vec(), v.to_vec())))
            .collect::<Result<Vec<_>>>()?;

        if entries.len() as u64 != self.entry_count {
            return Err(OrdoError::StoreFailure(format!(
                "table header announces {} entries, data holds {}",
                self.entry_count,
                entries.len()
            )));
        }

        Ok(entries)
    }

    fn footer_offset(&self) -> usize {
        self.bytes.len() - FOOTER_SIZE
    }

    fn data_block(&self) -> &[u8] {
        &self.bytes[HEADER_SIZE..self.footer_offset()]
    }
}
