//! # OrdoDB
//!
//! A document store of typed records over an ordered key-value engine:
//! - Composite primary keys encoded into ordered byte keys
//! - Secondary indexes kept consistent through atomic batch writes
//! - Prefix cursors with direct and indirect (two-hop) reads
//! - A bundled WAL + checkpoint engine with crash recovery
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │           DataDb / DataSnapshot / DataBatch                  │
//! │        put · delete · get · find* · get_indexes_of           │
//! └───────────┬─────────────────────────────────┬───────────────┘
//!             │ writes                          │ reads
//! ┌───────────▼───────────┐         ┌───────────▼───────────────┐
//! │   Index Maintainer    │         │       Data Cursors        │
//! │ (under indexes lock)  │         │  SimpleCursor/IndexCursor │
//! └───────────┬───────────┘         └───────────┬───────────────┘
//!             │          Key Codec              │
//!             └───────────────┬─────────────────┘
//!                             ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  OrderedStore (LogStore)                     │
//! │        WAL (append) · MemTable (RwLock) · Checkpoint         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use ordodb::{DataDb, DataRead, IndexSet, ReadOptions, Value, WriteOptions};
//!
//! let db = DataDb::in_memory();
//! let indexes = IndexSet::new()
//!     .with("Symbols", Value::of_ascii(&["alpha"])?)?;
//! db.put("Test", &Value::of_ascii(&["aaa"])?, b"ValueA1!", &indexes, &WriteOptions::DEFAULT)?;
//!
//! let mut cursor = db.find_by_index(
//!     "Test",
//!     "Symbols",
//!     &Value::of_ascii(&["alpha"])?,
//!     false,
//!     &ReadOptions::DEFAULT,
//! )?;
//! assert_eq!(cursor.transient_value()?, Some(&b"ValueA1!"[..]));
//! # Ok::<(), ordodb::OrdoError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod options;

pub mod data;
pub mod key;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{Config, WalSyncStrategy};
pub use data::{
    CursorArray, CursorState, DataBatch, DataCursor, DataDb, DataRead, DataSnapshot,
    IndexCursor, SimpleCursor,
};
pub use error::{OrdoError, Result};
pub use key::{Index, IndexSet, Value};
pub use options::{ReadOptions, WriteOptions};
pub use store::{LogStore, OrderedStore, StoreCursor, WriteBatch};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of OrdoDB
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
