//! Checkpoint Table Module
//!
//! Immutable on-disk sorted dump of the whole keyspace, written when the
//! WAL grows past its threshold and on close.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (14 bytes)                                       │
//! │   Magic: "ODBT" (4) | Version: u16 (2) | Count: u64 (8) │
//! ├─────────────────────────────────────────────────────────┤
//! │ Data Block (variable)                                   │
//! │   [KeyLen: u32][ValLen: u32][Key][Value]                │
//! │   ... repeated for each entry, sorted by key ...        │
//! ├─────────────────────────────────────────────────────────┤
//! │ Footer (8 bytes)                                        │
//! │   DataCRC: u32 (4) | Padding (4)                        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//! Integers are little-endian. The table holds live values only: deleted
//! keys are simply absent.

mod builder;
mod iterator;
mod reader;

use std::path::PathBuf;

pub use builder::TableBuilder;
pub use iterator::TableIterator;
pub use reader::TableReader;

// =============================================================================
// Shared Constants (used by builder, reader, iterator)
// =============================================================================

/// Magic bytes identifying a checkpoint table
pub(crate) const MAGIC: &[u8; 4] = b"ODBT";

/// Current table format version
pub(crate) const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + EntryCount (8) = 14 bytes
pub(crate) const HEADER_SIZE: usize = 14;

/// Footer size: DataCRC (4) + Padding (4) = 8 bytes
pub(crate) const FOOTER_SIZE: usize = 8;

/// Entry header size: KeyLen (4) + ValLen (4)
pub(crate) const ENTRY_HEADER_SIZE: usize = 8;

/// Metadata of a finished table
#[derive(Debug, Clone)]
pub struct TableInfo {
    /// Path to the table file
    pub path: PathBuf,
    /// Number of entries in the table
    pub entry_count: u64,
    /// File size in bytes
    pub file_size: u64,
}
