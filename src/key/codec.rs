//! Key codec
//!
//! Pure functions computing the byte layout of object keys, index keys and
//! reference keys. Every writer has a matching `*_size` function; the
//! writer must emit exactly that many bytes so callers can allocate once.
//!
//! ## Layout
//! ```text
//! object key  := 'o' 0x00 <type> 0x00 (<pk_seg> 0x00)+
//! index key   := 'i' 0x00 <type> 0x00 <name> 0x00 (<val_seg> 0x00)+ (<pk_seg> 0x00)+
//! ref key     := 'r' 0x00 <type> 0x00 (<pk_seg> 0x00)+
//! ref value   := (<u32 BE length> <index key bytes>)*
//! ```
//!
//! An "open tail" key omits the final separator, which turns it into a
//! byte prefix of every full key that extends its last segment.

use bytes::{Buf, BufMut};

use crate::error::{OrdoError, Result};

use super::value::Value;

// =============================================================================
// Constants
// =============================================================================

/// Tag byte of object keys
pub const OBJECT_TAG: u8 = b'o';

/// Tag byte of index keys
pub const INDEX_TAG: u8 = b'i';

/// Tag byte of reference keys
pub const REF_TAG: u8 = b'r';

/// Separator terminating every key component
pub const SEPARATOR: u8 = 0x00;

/// Prefix shared by every object key
pub const OBJECT_EMPTY_PREFIX: &[u8] = &[OBJECT_TAG, SEPARATOR];

/// Length prefix of each reference record entry
pub const REF_ENTRY_HEADER_SIZE: usize = 4;

// =============================================================================
// Object Keys
// =============================================================================

/// Size of an object key (or of a type prefix when `primary_key` is None)
pub fn object_key_size(type_name: &str, primary_key: Option<&Value>, open_tail: bool) -> usize {
    let mut size = 2 + type_name.len() + 1;
    if let Some(pk) = primary_key {
        size += pk.encoded_size();
    }
    if open_tail {
        size -= 1;
    }
    size
}

/// Write an object key; see [`object_key_size`]
pub fn write_object_key<B: BufMut>(
    buf: &mut B,
    type_name: &str,
    primary_key: Option<&Value>,
    open_tail: bool,
) {
    buf.put_u8(OBJECT_TAG);
    buf.put_u8(SEPARATOR);
    match primary_key {
        None => {
            buf.put_slice(type_name.as_bytes());
            if !open_tail {
                buf.put_u8(SEPARATOR);
            }
        }
        Some(pk) => {
            buf.put_slice(type_name.as_bytes());
            buf.put_u8(SEPARATOR);
            put_segments(buf, pk, open_tail);
        }
    }
}

/// Allocate and write an object key
pub fn object_key(type_name: &str, primary_key: Option<&Value>, open_tail: bool) -> Vec<u8> {
    let size = object_key_size(type_name, primary_key, open_tail);
    build(size, |buf| write_object_key(buf, type_name, primary_key, open_tail))
}

/// The type name of an object key (borrowed, no copy)
pub fn object_key_type(key: &[u8]) -> Result<&[u8]> {
    split_object_key(key).map(|(type_name, _)| type_name)
}

/// The encoded primary key of an object key, terminators included
pub fn object_key_id(key: &[u8]) -> Result<&[u8]> {
    split_object_key(key).map(|(_, id)| id)
}

/// Split an object key back into its type and primary key
pub fn decode_object_key(key: &[u8]) -> Result<(&str, Value)> {
    let (type_name, id) = split_object_key(key)?;
    let type_name = std::str::from_utf8(type_name)
        .map_err(|_| OrdoError::InvalidKey("object key type is not UTF-8".to_string()))?;

    // Every segment is terminated, so the last split piece is empty
    let segments: Vec<&[u8]> = id[..id.len() - 1].split(|&b| b == SEPARATOR).collect();
    let value = Value::new(segments.into_iter().map(<[u8]>::to_vec))?;

    Ok((type_name, value))
}

fn split_object_key(key: &[u8]) -> Result<(&[u8], &[u8])> {
    let rest = strip_tag(key, OBJECT_TAG)?;
    let (type_name, id) = split_component(rest)
        .ok_or_else(|| malformed("object key", "no type terminator"))?;

    if id.last() != Some(&SEPARATOR) {
        return Err(malformed("object key", "missing primary key"));
    }

    Ok((type_name, id))
}

// =============================================================================
// Index Keys
// =============================================================================

/// Size of the scan-start key of an index, optionally narrowed to a value
pub fn index_key_start_size(
    type_name: &str,
    name: &str,
    value: Option<&Value>,
    open_tail: bool,
) -> usize {
    let mut size = 2 + type_name.len() + 1 + name.len() + 1;
    if let Some(value) = value {
        size += value.encoded_size();
    }
    if open_tail {
        size -= 1;
    }
    size
}

/// Write the scan-start key of an index; see [`index_key_start_size`]
pub fn write_index_key_start<B: BufMut>(
    buf: &mut B,
    type_name: &str,
    name: &str,
    value: Option<&Value>,
    open_tail: bool,
) {
    buf.put_u8(INDEX_TAG);
    buf.put_u8(SEPARATOR);
    buf.put_slice(type_name.as_bytes());
    buf.put_u8(SEPARATOR);
    buf.put_slice(name.as_bytes());
    match value {
        None => {
            if !open_tail {
                buf.put_u8(SEPARATOR);
            }
        }
        Some(value) => {
            buf.put_u8(SEPARATOR);
            put_segments(buf, value, open_tail);
        }
    }
}

/// Allocate and write an index scan-start key
pub fn index_key_start(
    type_name: &str,
    name: &str,
    value: Option<&Value>,
    open_tail: bool,
) -> Vec<u8> {
    let size = index_key_start_size(type_name, name, value, open_tail);
    build(size, |buf| {
        write_index_key_start(buf, type_name, name, value, open_tail)
    })
}

/// Size of the index key deriving from an encoded object key
pub fn index_key_size(object_key: &[u8], name: &str, value: &Value) -> usize {
    object_key.len() + name.len() + 1 + value.encoded_size()
}

/// Write an index key, borrowing type and primary key from `object_key`
pub fn write_index_key<B: BufMut>(
    buf: &mut B,
    object_key: &[u8],
    name: &str,
    value: &Value,
) -> Result<()> {
    let (type_name, id) = split_object_key(object_key)?;

    buf.put_u8(INDEX_TAG);
    buf.put_u8(SEPARATOR);
    buf.put_slice(type_name);
    buf.put_u8(SEPARATOR);
    buf.put_slice(name.as_bytes());
    buf.put_u8(SEPARATOR);
    put_segments(buf, value, false);
    buf.put_slice(id);

    Ok(())
}

/// Allocate and write an index key
pub fn index_key(object_key: &[u8], name: &str, value: &Value) -> Result<Vec<u8>> {
    let size = index_key_size(object_key, name, value);
    let mut buf = Vec::with_capacity(size);
    write_index_key(&mut buf, object_key, name, value)?;
    debug_assert_eq!(buf.len(), size, "index key writer disagreed with its size");
    Ok(buf)
}

/// The index name of an index key (borrowed, no copy)
pub fn index_key_name(key: &[u8]) -> Result<&[u8]> {
    let rest = strip_tag(key, INDEX_TAG)?;
    let (_, rest) = split_component(rest)
        .ok_or_else(|| malformed("index key", "no type terminator"))?;
    let (name, _) = split_component(rest)
        .ok_or_else(|| malformed("index key", "no name terminator"))?;
    Ok(name)
}

// =============================================================================
// Reference Keys & Values
// =============================================================================

/// Rewrite an object key into the key of its reference record
pub fn ref_key_from_object_key(object_key: &[u8]) -> Result<Vec<u8>> {
    let rest = strip_tag(object_key, OBJECT_TAG)?;
    Ok(build(object_key.len(), |buf| {
        buf.put_u8(REF_TAG);
        buf.put_u8(SEPARATOR);
        buf.put_slice(rest);
    }))
}

/// Append one length-prefixed index key to a reference record value
pub fn put_ref_entry<B: BufMut>(buf: &mut B, index_key: &[u8]) {
    buf.put_u32(index_key.len() as u32);
    buf.put_slice(index_key);
}

/// Iterate the index keys listed by a reference record value
pub fn ref_entries(value: &[u8]) -> RefEntries<'_> {
    RefEntries { remaining: value }
}

/// Iterator over the entries of a reference record value
pub struct RefEntries<'a> {
    remaining: &'a [u8],
}

impl<'a> Iterator for RefEntries<'a> {
    type Item = Result<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.remaining.has_remaining() {
            return None;
        }

        if self.remaining.len() < REF_ENTRY_HEADER_SIZE {
            self.remaining = &[];
            return Some(Err(OrdoError::StoreFailure(
                "truncated reference record entry header".to_string(),
            )));
        }

        let len = self.remaining.get_u32() as usize;
        if self.remaining.len() < len {
            self.remaining = &[];
            return Some(Err(OrdoError::StoreFailure(format!(
                "reference record entry of {} bytes overruns the record",
                len
            ))));
        }

        let (entry, rest) = self.remaining.split_at(len);
        self.remaining = rest;
        Some(Ok(entry))
    }
}

// =============================================================================
// Private Helpers
// =============================================================================

/// Write each segment followed by a separator; the last separator is
/// skipped for an open tail
fn put_segments<B: BufMut>(buf: &mut B, value: &Value, open_tail: bool) {
    let count = value.len();
    for (i, segment) in value.segments().enumerate() {
        buf.put_slice(segment);
        if !(open_tail && i + 1 == count) {
            buf.put_u8(SEPARATOR);
        }
    }
}

fn build(size: usize, write: impl FnOnce(&mut Vec<u8>)) -> Vec<u8> {
    let mut buf = Vec::with_capacity(size);
    write(&mut buf);
    debug_assert_eq!(buf.len(), size, "key writer disagreed with its size");
    buf
}

fn strip_tag(key: &[u8], tag: u8) -> Result<&[u8]> {
    match key {
        [t, SEPARATOR, rest @ ..] if *t == tag => Ok(rest),
        _ => Err(OrdoError::InvalidKey(format!(
            "expected a key tagged '{}'",
            tag as char
        ))),
    }
}

/// Split at the first separator: (component, rest after the separator)
fn split_component(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
    let end = bytes.iter().position(|&b| b == SEPARATOR)?;
    Some((&bytes[..end], &bytes[end + 1..]))
}

fn malformed(kind: &str, what: &str) -> OrdoError {
    OrdoError::InvalidKey(format!("malformed {}: {}", kind, what))
}
