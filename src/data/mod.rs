//! Data Module
//!
//! Typed records, secondary indexes and their cursors, built on any
//! [`OrderedStore`](crate::store::OrderedStore).
//!
//! ## Responsibilities
//! - `put` / `delete` keep object, index and reference entries consistent
//! - `find*` turn prefix scans into typed cursors
//! - Snapshots and batches share the same read and write paths
//!
//! ## What one indexed put stores
//!
//! ```text
//! put("Test", ["aaa"], "ValueA1!", {Symbols: ["alpha", "beta"]})
//!
//!   i\0Test\0Symbols\0alpha\0beta\0aaa\0  ->  o\0Test\0aaa\0
//!   o\0Test\0aaa\0                        ->  ValueA1!
//!   r\0Test\0aaa\0                        ->  [00 00 00 1e] i\0Test\0Symbols\0alpha\0beta\0aaa\0
//! ```

pub mod batch;
pub mod cursor;
pub mod db;
pub mod guard;
pub mod maintainer;
pub mod read;
pub mod snapshot;

pub use batch::DataBatch;
pub use cursor::{
    CursorArray, CursorState, DataCursor, IndexCursor, IndirectValuesArray, SimpleCursor,
    ValuesArray,
};
pub use db::DataDb;
pub use read::DataRead;
pub use snapshot::DataSnapshot;
