//! Key Module
//!
//! Byte-level encoding of everything the data layer stores.
//!
//! ## Responsibilities
//! - Primary key and index values (`Value`, `Index`, `IndexSet`)
//! - Object, index and reference key layouts (`codec`)
//! - Borrowed extraction of key components without copying
//!
//! ## Ordering
//! Keys compare as raw bytes. Tagging each key family with a distinct
//! leading byte keeps the families apart; within a family the separator
//! after each component groups entries by type, then index name, then
//! value, then primary key.

pub mod codec;
mod value;

pub use codec::{
    decode_object_key, index_key, index_key_name, index_key_size, index_key_start,
    index_key_start_size, object_key, object_key_id, object_key_size, object_key_type,
    ref_entries, ref_key_from_object_key, write_index_key, write_index_key_start,
    write_object_key, RefEntries,
};
pub use value::{check_name, Index, IndexSet, Value};
