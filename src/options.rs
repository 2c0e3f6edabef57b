//! Per-call read and write options
//!
//! Passed explicitly to every store and data operation.

/// Options for read operations (point lookups and cursors)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Ask the engine to verify checksums of the data it reads.
    /// Advisory: the bundled engine verifies on load and keeps its
    /// working set resident.
    pub verify_checksums: bool,

    /// Ask the engine to keep data read by this call cached.
    /// Advisory for the bundled engine.
    pub fill_cache: bool,
}

impl ReadOptions {
    pub const DEFAULT: ReadOptions = ReadOptions {
        verify_checksums: false,
        fill_cache: true,
    };
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Options for write operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// fsync the WAL before the write returns, regardless of the
    /// configured sync strategy
    pub sync: bool,
}

impl WriteOptions {
    pub const DEFAULT: WriteOptions = WriteOptions { sync: false };

    pub const SYNC: WriteOptions = WriteOptions { sync: true };
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}
