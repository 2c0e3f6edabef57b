//! MemTable Module
//!
//! In-memory sorted view of the whole keyspace.
//!
//! ## Responsibilities
//! - Fast point reads and atomic batch application
//! - Point-in-time snapshots without copying on read
//! - Ordered cursors for range scans
//! - Track size for diagnostics
//!
//! ## Data Structure Choice
//! A `BTreeMap` behind an `Arc`, swapped under a `RwLock`:
//! - Ordered keys (required for prefix scans and checkpoints)
//! - Readers clone the `Arc` and never block writers for long
//! - Writers copy the map only while a snapshot or cursor still holds the
//!   previous version (`Arc::make_mut`)

mod cursor;
mod table;

pub use cursor::MemTableCursor;
pub use table::{FrozenMap, MemTable};
