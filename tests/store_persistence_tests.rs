//! Tests for durability of the bundled store
//!
//! These tests verify:
//! - Records and indexes survive close and reopen
//! - Unclosed stores are rebuilt from the WAL
//! - Torn or corrupted WAL tails are discarded, earlier batches kept
//! - Checkpoints truncate the WAL and are checksummed on load

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use ordodb::config::WalSyncStrategy;
use ordodb::store::wal::WalRecovery;
use ordodb::{
    Config, DataCursor, DataDb, DataRead, IndexSet, LogStore, OrdoError, ReadOptions, Value,
    WriteOptions,
};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

const RO: ReadOptions = ReadOptions::DEFAULT;
const WO: WriteOptions = WriteOptions::DEFAULT;

fn value(segment: &str) -> Value {
    Value::of_ascii(&[segment]).unwrap()
}

fn config_for(dir: &Path) -> Config {
    Config::builder()
        .data_dir(dir)
        .wal_sync_strategy(WalSyncStrategy::EveryWrite)
        .build()
}

fn setup_temp_db() -> (TempDir, DataDb) {
    let temp_dir = TempDir::new().unwrap();
    let db = DataDb::open(config_for(temp_dir.path())).unwrap();
    (temp_dir, db)
}

fn reopen(dir: &TempDir) -> DataDb {
    DataDb::open(config_for(dir.path())).unwrap()
}

fn put(db: &DataDb, pk: &str, body: &str, color: &str) {
    let indexes = IndexSet::new().with("Color", value(color)).unwrap();
    db.put("Item", &value(pk), body.as_bytes(), &indexes, &WO).unwrap();
}

fn body_of(db: &DataDb, pk: &str) -> Option<String> {
    let key = db.object_key("Item", &value(pk)).unwrap();
    db.get(&key, &RO)
        .unwrap()
        .map(|body| String::from_utf8(body).unwrap())
}

fn colored(db: &DataDb, color: &str) -> Vec<String> {
    let mut cursor: DataCursor<LogStore> = db
        .find_by_index("Item", "Color", &value(color), false, &RO)
        .unwrap()
        .into();
    let mut out = Vec::new();
    while cursor.is_valid() {
        let body = cursor.transient_value().unwrap().unwrap();
        out.push(String::from_utf8(body.to_vec()).unwrap());
        cursor.next().unwrap();
    }
    out
}

// =============================================================================
// Reopen Tests
// =============================================================================

#[test]
fn test_open_creates_layout() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("mydb");

    let _db = DataDb::open(config_for(&data_dir)).unwrap();

    assert!(data_dir.exists());
    assert!(data_dir.join("tables").exists());
    assert!(data_dir.join("wal.log").exists());
}

#[test]
fn test_records_survive_close_and_reopen() {
    let (temp_dir, db) = setup_temp_db();
    put(&db, "a", "apple", "red");
    put(&db, "b", "banana", "yellow");
    put(&db, "c", "cherry", "red");
    let b = db.object_key("Item", &value("b")).unwrap();
    db.delete(&b, &WO).unwrap();
    db.close().unwrap();

    assert!(temp_dir.path().join("tables/checkpoint.tbl").exists());
    assert_eq!(fs::metadata(temp_dir.path().join("wal.log")).unwrap().len(), 0);

    let db = reopen(&temp_dir);
    assert_eq!(body_of(&db, "a").as_deref(), Some("apple"));
    assert_eq!(body_of(&db, "b"), None);
    assert_eq!(colored(&db, "red"), vec!["apple", "cherry"]);
    assert!(colored(&db, "yellow").is_empty());
}

#[test]
fn test_unclosed_store_is_replayed_from_wal() {
    let (temp_dir, db) = setup_temp_db();
    put(&db, "a", "apple", "red");
    put(&db, "a", "apricot", "orange");
    drop(db);

    let db = reopen(&temp_dir);
    assert_eq!(body_of(&db, "a").as_deref(), Some("apricot"));
    assert!(colored(&db, "red").is_empty());
    assert_eq!(colored(&db, "orange"), vec!["apricot"]);

    // Replayed data is checkpointed on open
    assert_eq!(fs::metadata(temp_dir.path().join("wal.log")).unwrap().len(), 0);
}

#[test]
fn test_operations_after_close_fail() {
    let (_temp_dir, db) = setup_temp_db();
    db.close().unwrap();
    db.close().unwrap();

    let result = db.put("Item", &value("a"), b"x", &IndexSet::new(), &WO);
    assert!(matches!(result, Err(OrdoError::Closed)));
    assert!(matches!(db.find_all(&RO), Err(OrdoError::Closed)));
}

// =============================================================================
// WAL Recovery Tests
// =============================================================================

#[test]
fn test_torn_wal_tail_is_discarded() {
    let (temp_dir, db) = setup_temp_db();
    put(&db, "a", "apple", "red");
    put(&db, "b", "banana", "yellow");
    drop(db);

    let wal_path = temp_dir.path().join("wal.log");
    {
        let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
        file.write_all(&[0x07, 0x00, 0x00]).unwrap();
    }

    let db = reopen(&temp_dir);
    assert_eq!(body_of(&db, "a").as_deref(), Some("apple"));
    assert_eq!(body_of(&db, "b").as_deref(), Some("banana"));
    assert_eq!(colored(&db, "yellow"), vec!["banana"]);
}

#[test]
fn test_corrupted_last_batch_is_dropped_whole() {
    let (temp_dir, db) = setup_temp_db();
    put(&db, "a", "apple", "red");
    put(&db, "b", "banana", "yellow");
    drop(db);

    // Flip the last byte, inside the second batch's payload
    let wal_path = temp_dir.path().join("wal.log");
    let mut bytes = fs::read(&wal_path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    fs::write(&wal_path, &bytes).unwrap();

    let result = WalRecovery::verify(&wal_path).unwrap();
    assert_eq!(result.entries_recovered, 1);
    assert_eq!(result.entries_corrupted, 1);

    let db = reopen(&temp_dir);
    assert_eq!(body_of(&db, "a").as_deref(), Some("apple"));
    assert_eq!(body_of(&db, "b"), None);
    assert!(colored(&db, "yellow").is_empty());
}

// =============================================================================
// Checkpoint Tests
// =============================================================================

#[test]
fn test_small_threshold_checkpoints_during_writes() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .checkpoint_threshold(256)
        .build();
    let store = LogStore::open(config).unwrap();
    let db = DataDb::new(store);

    for i in 0..20 {
        put(&db, &format!("k{:02}", i), "some body text", "blue");
    }

    assert!(temp_dir.path().join("tables/checkpoint.tbl").exists());
    assert!(fs::metadata(temp_dir.path().join("wal.log")).unwrap().len() < 256);
    drop(db);

    let db = DataDb::open(
        Config::builder()
            .data_dir(temp_dir.path())
            .checkpoint_threshold(256)
            .build(),
    )
    .unwrap();
    assert_eq!(colored(&db, "blue").len(), 20);
}

/// Put a plain file where the table directory belongs, so checkpoints fail
fn break_table_dir(dir: &Path) {
    let tables = dir.join("tables");
    fs::remove_dir_all(&tables).unwrap();
    fs::write(&tables, b"not a directory").unwrap();
}

fn restore_table_dir(dir: &Path) {
    let tables = dir.join("tables");
    fs::remove_file(&tables).unwrap();
    fs::create_dir(&tables).unwrap();
}

fn eager_checkpoint_config(dir: &Path) -> Config {
    Config::builder()
        .data_dir(dir)
        .wal_sync_strategy(WalSyncStrategy::EveryWrite)
        .checkpoint_threshold(1)
        .build()
}

#[test]
fn test_failed_checkpoint_does_not_fail_write() {
    let temp_dir = TempDir::new().unwrap();
    let db = DataDb::open(eager_checkpoint_config(temp_dir.path())).unwrap();
    let wal_path = temp_dir.path().join("wal.log");

    break_table_dir(temp_dir.path());
    let indexes = IndexSet::new().with("Color", value("red")).unwrap();
    let written = db.put("Item", &value("a"), b"apple", &indexes, &WO);
    assert!(matches!(written, Ok(5)));

    assert_eq!(body_of(&db, "a").as_deref(), Some("apple"));
    assert_eq!(colored(&db, "red"), vec!["apple"]);
    assert!(fs::metadata(&wal_path).unwrap().len() > 0);

    // The next write checkpoints both batches
    restore_table_dir(temp_dir.path());
    put(&db, "b", "banana", "red");
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), 0);
    assert!(temp_dir.path().join("tables/checkpoint.tbl").exists());
    drop(db);

    let db = DataDb::open(eager_checkpoint_config(temp_dir.path())).unwrap();
    assert_eq!(colored(&db, "red"), vec!["apple", "banana"]);
}

#[test]
fn test_batch_kept_in_wal_when_checkpoint_fails() {
    let temp_dir = TempDir::new().unwrap();
    let db = DataDb::open(eager_checkpoint_config(temp_dir.path())).unwrap();

    break_table_dir(temp_dir.path());
    let mut batch = db.new_batch();
    batch.put("Item", &value("a"), b"apple", &IndexSet::new()).unwrap();
    batch.put("Item", &value("b"), b"banana", &IndexSet::new()).unwrap();
    batch.write(&WO).unwrap();
    drop(batch);
    drop(db);

    restore_table_dir(temp_dir.path());
    let db = reopen(&temp_dir);
    assert_eq!(body_of(&db, "a").as_deref(), Some("apple"));
    assert_eq!(body_of(&db, "b").as_deref(), Some("banana"));
}

#[test]
fn test_corrupted_checkpoint_is_rejected() {
    let (temp_dir, db) = setup_temp_db();
    put(&db, "a", "apple", "red");
    db.close().unwrap();

    let table_path = temp_dir.path().join("tables/checkpoint.tbl");
    let mut bytes = fs::read(&table_path).unwrap();
    // Past the 14-byte header, inside the first entry
    bytes[20] ^= 0xFF;
    fs::write(&table_path, &bytes).unwrap();

    let result = DataDb::open(config_for(temp_dir.path()));
    assert!(matches!(result, Err(OrdoError::StoreFailure(_))));
}
