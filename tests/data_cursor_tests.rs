//! Tests for DataDb cursors
//!
//! These tests verify:
//! - find_all / find_by_type / find_by_primary_key prefix scans
//! - find_all_by_index / find_by_index two-hop resolution
//! - Cursor state transitions and accessor errors
//! - Bulk reads into owned arrays

use ordodb::{
    CursorArray, CursorState, DataCursor, DataDb, DataRead, IndexSet, LogStore, OrderedStore,
    OrdoError, ReadOptions, Value, WriteOptions,
};

// =============================================================================
// Helper Functions
// =============================================================================

const RO: ReadOptions = ReadOptions::DEFAULT;

fn value(segments: &[&str]) -> Value {
    Value::of_ascii(segments).unwrap()
}

/// Put a record whose indexes each hold a single-segment value
fn put(db: &DataDb, type_name: &str, pk: &[&str], body: &str, indexes: &[(&str, &str)]) {
    let mut set = IndexSet::new();
    for (name, segment) in indexes {
        set = set.with(*name, value(&[*segment])).unwrap();
    }
    db.put(type_name, &value(pk), body.as_bytes(), &set, &WriteOptions::DEFAULT)
        .unwrap();
}

/// Bodies seen walking a cursor forward to exhaustion
fn bodies(mut cursor: DataCursor<LogStore>) -> Vec<String> {
    let mut out = Vec::new();
    while cursor.is_valid() {
        let body = cursor.transient_value().unwrap().unwrap_or(&b"<missing>"[..]);
        out.push(String::from_utf8(body.to_vec()).unwrap());
        cursor.next().unwrap();
    }
    out
}

/// A small catalogue of people and cities
fn setup_people_db() -> DataDb {
    let db = DataDb::in_memory();
    put(&db, "Person", &["doe", "jane"], "Jane Doe", &[("City", "paris"), ("Age", "34")]);
    put(&db, "Person", &["doe", "john"], "John Doe", &[("City", "lyon"), ("Age", "34")]);
    put(&db, "Person", &["smith", "anna"], "Anna Smith", &[("City", "paris")]);
    put(&db, "Personal", &["x"], "Not a person", &[]);
    put(&db, "City", &["lyon"], "Lyon", &[]);
    put(&db, "City", &["paris"], "Paris", &[]);
    db
}

// =============================================================================
// Simple Cursor Tests
// =============================================================================

#[test]
fn test_find_all_walks_every_record_in_key_order() {
    let db = setup_people_db();
    let cursor = db.find_all(&RO).unwrap();

    assert_eq!(
        bodies(cursor.into()),
        vec!["Lyon", "Paris", "Jane Doe", "John Doe", "Anna Smith", "Not a person"]
    );
}

#[test]
fn test_find_by_type_excludes_longer_type_names() {
    let db = setup_people_db();
    let cursor = db.find_by_type("Person", &RO).unwrap();

    assert_eq!(
        bodies(cursor.into()),
        vec!["Jane Doe", "John Doe", "Anna Smith"]
    );
}

#[test]
fn test_find_by_primary_key_closed_and_open() {
    let db = setup_people_db();

    let exact = db
        .find_by_primary_key("Person", &value(&["doe", "jane"]), false, &RO)
        .unwrap();
    assert_eq!(bodies(exact.into()), vec!["Jane Doe"]);

    let family = db
        .find_by_primary_key("Person", &value(&["doe"]), false, &RO)
        .unwrap();
    assert_eq!(bodies(family.into()), vec!["Jane Doe", "John Doe"]);

    let partial = db
        .find_by_primary_key("Person", &value(&["doe", "j"]), true, &RO)
        .unwrap();
    assert_eq!(bodies(partial.into()), vec!["Jane Doe", "John Doe"]);

    let none = db
        .find_by_primary_key("Person", &value(&["do"]), false, &RO)
        .unwrap();
    assert_eq!(none.state(), CursorState::Exhausted);
}

#[test]
fn test_simple_cursor_exposes_object_keys() {
    let db = setup_people_db();
    let cursor = db.find_by_type("City", &RO).unwrap();

    assert_eq!(cursor.transient_key().unwrap(), b"o\0City\0lyon\0");
    assert_eq!(cursor.transient_value().unwrap(), b"Lyon");
}

#[test]
fn test_empty_scan_starts_exhausted() {
    let db = setup_people_db();
    let cursor = db.find_by_type("Planet", &RO).unwrap();

    assert!(!cursor.is_valid());
    assert_eq!(cursor.state(), CursorState::Exhausted);
    assert!(matches!(
        cursor.transient_key(),
        Err(OrdoError::InvalidCursorState)
    ));
    assert!(matches!(
        cursor.transient_value(),
        Err(OrdoError::InvalidCursorState)
    ));
}

#[test]
fn test_seek_to_last_then_walk_back() {
    let db = setup_people_db();
    let mut cursor = db.find_by_type("Person", &RO).unwrap();

    cursor.seek_to_last();
    assert_eq!(cursor.transient_value().unwrap(), b"Anna Smith");
    cursor.prev().unwrap();
    assert_eq!(cursor.transient_value().unwrap(), b"John Doe");
    cursor.prev().unwrap();
    cursor.prev().unwrap();
    assert_eq!(cursor.state(), CursorState::Exhausted);
    assert!(matches!(cursor.prev(), Err(OrdoError::InvalidCursorState)));

    cursor.seek_to_first();
    assert_eq!(cursor.transient_value().unwrap(), b"Jane Doe");
}

#[test]
fn test_seek_to_key_inside_prefix() {
    let db = setup_people_db();
    let mut cursor = db.find_by_type("Person", &RO).unwrap();
    let john = db.object_key("Person", &value(&["doe", "john"])).unwrap();

    cursor.seek_to(&john);
    assert_eq!(cursor.transient_value().unwrap(), b"John Doe");

    cursor.seek_to(b"o\0Person\0zzz");
    assert_eq!(cursor.state(), CursorState::Exhausted);
}

// =============================================================================
// Index Cursor Tests
// =============================================================================

#[test]
fn test_find_by_index_resolves_bodies() {
    let db = setup_people_db();
    let cursor = db
        .find_by_index("Person", "City", &value(&["paris"]), false, &RO)
        .unwrap();

    // Duplicates of one value are ordered by primary key
    assert_eq!(bodies(cursor.into()), vec!["Jane Doe", "Anna Smith"]);
}

#[test]
fn test_find_all_by_index_orders_by_value() {
    let db = setup_people_db();
    let cursor = db.find_all_by_index("Person", "City", &RO).unwrap();

    assert_eq!(
        bodies(cursor.into()),
        vec!["John Doe", "Jane Doe", "Anna Smith"]
    );
}

#[test]
fn test_find_by_index_open_value() {
    let db = setup_people_db();
    let cursor = db
        .find_by_index("Person", "City", &value(&["pa"]), true, &RO)
        .unwrap();
    assert_eq!(bodies(cursor.into()), vec!["Jane Doe", "Anna Smith"]);

    let closed = db
        .find_by_index("Person", "City", &value(&["pa"]), false, &RO)
        .unwrap();
    assert!(!closed.is_valid());
}

#[test]
fn test_index_cursor_exposes_index_and_object_keys() {
    let db = setup_people_db();
    let mut cursor = db
        .find_by_index("Person", "Age", &value(&["34"]), false, &RO)
        .unwrap();

    assert_eq!(
        cursor.transient_key().unwrap(),
        b"i\0Person\0Age\x0034\0doe\0jane\0"
    );
    assert_eq!(
        cursor.transient_object_key().unwrap(),
        b"o\0Person\0doe\0jane\0"
    );
    assert_eq!(cursor.transient_value().unwrap(), Some(&b"Jane Doe"[..]));

    cursor.next().unwrap();
    assert_eq!(cursor.transient_value().unwrap(), Some(&b"John Doe"[..]));
    cursor.next().unwrap();
    assert!(matches!(
        cursor.transient_value(),
        Err(OrdoError::InvalidCursorState)
    ));
}

#[test]
fn test_index_entry_to_missing_object_is_surfaced() {
    let db = setup_people_db();

    // Remove the body behind the index's back
    let jane = db.object_key("Person", &value(&["doe", "jane"])).unwrap();
    db.store().delete(&jane, &WriteOptions::DEFAULT).unwrap();

    let mut cursor = db
        .find_by_index("Person", "City", &value(&["paris"]), false, &RO)
        .unwrap();
    assert_eq!(cursor.transient_object_key().unwrap(), &jane[..]);
    assert_eq!(cursor.transient_value().unwrap(), None);

    cursor.next().unwrap();
    assert_eq!(cursor.transient_value().unwrap(), Some(&b"Anna Smith"[..]));
}

#[test]
fn test_index_scan_sees_replaced_indexes() {
    let db = setup_people_db();
    put(&db, "Person", &["doe", "jane"], "Jane Doe", &[("City", "lyon")]);

    let paris = db
        .find_by_index("Person", "City", &value(&["paris"]), false, &RO)
        .unwrap();
    assert_eq!(bodies(paris.into()), vec!["Anna Smith"]);

    let lyon = db
        .find_by_index("Person", "City", &value(&["lyon"]), false, &RO)
        .unwrap();
    assert_eq!(bodies(lyon.into()), vec!["Jane Doe", "John Doe"]);

    let age = db
        .find_by_index("Person", "Age", &value(&["34"]), false, &RO)
        .unwrap();
    assert_eq!(bodies(age.into()), vec!["John Doe"]);
}

// =============================================================================
// Bulk Read Tests
// =============================================================================

#[test]
fn test_next_array_copies_and_advances() {
    let db = setup_people_db();
    let mut cursor = db.find_by_type("Person", &RO).unwrap();

    let array = cursor.next_array(2, usize::MAX).unwrap();
    assert_eq!(array.len(), 2);
    assert_eq!(array.value(0).unwrap(), b"Jane Doe");
    assert_eq!(array.key(1).unwrap(), b"o\0Person\0doe\0john\0");
    assert!(matches!(
        array.value(2),
        Err(OrdoError::OutOfRange { index: 2, size: 2 })
    ));

    assert_eq!(cursor.transient_value().unwrap(), b"Anna Smith");
    let rest = cursor.next_array(10, usize::MAX).unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(cursor.state(), CursorState::Exhausted);
    assert!(matches!(
        cursor.next_array(10, usize::MAX),
        Err(OrdoError::InvalidCursorState)
    ));
}

#[test]
fn test_next_array_respects_size_hint() {
    let db = setup_people_db();
    let mut cursor = db.find_by_type("Person", &RO).unwrap();

    // Each entry is well over 16 bytes, so only one fits
    let array = cursor.next_array(10, 16).unwrap();
    assert_eq!(array.len(), 1);
}

#[test]
fn test_next_indirect_array() {
    let db = setup_people_db();
    let mut cursor = db.find_all_by_index("Person", "City", &RO).unwrap();

    let array = cursor.next_indirect_array(10, usize::MAX).unwrap();
    assert_eq!(array.len(), 3);
    assert_eq!(array.key(0).unwrap(), b"i\0Person\0City\0lyon\0doe\0john\0");
    assert_eq!(array.object_key(0).unwrap(), b"o\0Person\0doe\0john\0");
    assert_eq!(array.value(0).unwrap(), Some(&b"John Doe"[..]));
    assert_eq!(array.value(2).unwrap(), Some(&b"Anna Smith"[..]));
    assert!(matches!(
        array.object_key(3),
        Err(OrdoError::OutOfRange { index: 3, size: 3 })
    ));
    assert!(!cursor.is_valid());
}

#[test]
fn test_next_indirect_array_zero_entries() {
    let db = setup_people_db();
    let mut cursor = db.find_all_by_index("Person", "City", &RO).unwrap();

    let array = cursor.next_indirect_array(0, usize::MAX).unwrap();
    assert!(array.is_empty());
    assert_eq!(cursor.transient_object_key().unwrap(), b"o\0Person\0doe\0john\0");
    assert_eq!(cursor.transient_value().unwrap(), Some(&b"John Doe"[..]));
}

#[test]
fn test_data_cursor_arrays() {
    let db = setup_people_db();

    let mut simple: DataCursor<LogStore> = db.find_by_type("City", &RO).unwrap().into();
    match simple.next_array(10, usize::MAX).unwrap() {
        CursorArray::Simple(array) => assert_eq!(array.len(), 2),
        other => panic!("expected a simple array, got {:?}", other),
    }

    let mut index: DataCursor<LogStore> = db
        .find_all_by_index("Person", "Age", &RO)
        .unwrap()
        .into();
    let array = index.next_array(10, usize::MAX).unwrap();
    assert!(matches!(array, CursorArray::Indirect(_)));
    assert_eq!(array.value(1).unwrap(), Some(&b"John Doe"[..]));
}
