//! Tests for write batches
//!
//! These tests verify:
//! - Insertion-order application with later ops overriding earlier ones
//! - Atomic visibility of a batch
//! - Batch reuse across clears and across handles

use stratakv::{Database, Error, WriteBatch};
use tempfile::TempDir;

fn setup_temp_db() -> (TempDir, Database) {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open_path(temp_dir.path().join("db")).unwrap();
    (temp_dir, db)
}

#[test]
fn test_batch_applies_in_insertion_order() {
    let (_temp, db) = setup_temp_db();

    let mut batch = WriteBatch::new();
    batch.put(b"k", b"a");
    batch.delete(b"k");
    batch.put(b"k", b"b");

    db.write(&batch).unwrap();
    assert_eq!(db.get(b"k").unwrap(), &b"b"[..]);
}

#[test]
fn test_batch_ending_in_delete_removes_key() {
    let (_temp, db) = setup_temp_db();

    db.put(b"k", b"old").unwrap();

    let mut batch = WriteBatch::new();
    batch.put(b"k", b"new");
    batch.delete(b"k");

    db.write(&batch).unwrap();
    assert!(matches!(db.get(b"k"), Err(Error::NotFound)));
}

#[test]
fn test_batch_is_applied_as_a_unit() {
    let (_temp, db) = setup_temp_db();

    let mut batch = WriteBatch::new();
    for i in 0..100u32 {
        batch.put(format!("key-{i:03}").as_bytes(), b"value");
    }
    db.write(&batch).unwrap();

    for i in 0..100u32 {
        assert!(db.get(format!("key-{i:03}").as_bytes()).is_ok());
    }
}

#[test]
fn test_batch_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db");

    {
        let db = Database::open_path(&path).unwrap();
        let mut batch = WriteBatch::new();
        batch.put(b"a", b"1");
        batch.put(b"b", b"2");
        batch.delete(b"a");
        db.write(&batch).unwrap();
    }

    let db = Database::open_path(&path).unwrap();
    assert!(matches!(db.get(b"a"), Err(Error::NotFound)));
    assert_eq!(db.get(b"b").unwrap(), &b"2"[..]);
}

#[test]
fn test_batch_has_no_database_affinity() {
    let temp_a = TempDir::new().unwrap();
    let temp_b = TempDir::new().unwrap();
    let db_a = Database::open_path(temp_a.path().join("db")).unwrap();
    let db_b = Database::open_path(temp_b.path().join("db")).unwrap();

    let mut batch = WriteBatch::new();
    batch.put(b"shared", b"payload");

    db_a.write(&batch).unwrap();
    db_b.write(&batch).unwrap();

    assert_eq!(db_a.get(b"shared").unwrap(), &b"payload"[..]);
    assert_eq!(db_b.get(b"shared").unwrap(), &b"payload"[..]);
}

#[test]
fn test_cleared_batch_can_be_refilled() {
    let (_temp, db) = setup_temp_db();

    let mut batch = WriteBatch::new();
    batch.put(b"a", b"1");
    db.write(&batch).unwrap();

    batch.clear();
    assert!(batch.is_empty());

    batch.put(b"b", b"2");
    db.write(&batch).unwrap();

    assert_eq!(db.get(b"a").unwrap(), &b"1"[..]);
    assert_eq!(db.get(b"b").unwrap(), &b"2"[..]);
}

#[test]
fn test_empty_batch_write_is_ok() {
    let (_temp, db) = setup_temp_db();

    db.write(&WriteBatch::new()).unwrap();
}
