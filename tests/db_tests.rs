//! Tests for the database handle
//!
//! These tests verify:
//! - Basic get/put/delete operations
//! - Open-time option validation and behavior
//! - Durable writes and log replay across reopen
//! - Repair and destroy of on-disk state
//! - Handle close semantics

use stratakv::{destroy_db, repair_db, Database, Error, Options, WriteOptions};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_db() -> (TempDir, Database) {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open_path(temp_dir.path().join("db")).unwrap();
    (temp_dir, db)
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_put_get() {
    let (_temp, db) = setup_temp_db();

    db.put(b"hello", b"world").unwrap();
    assert_eq!(db.get(b"hello").unwrap(), &b"world"[..]);
}

#[test]
fn test_get_nonexistent_key_is_not_found() {
    let (_temp, db) = setup_temp_db();

    assert!(matches!(db.get(b"nonexistent"), Err(Error::NotFound)));
}

#[test]
fn test_put_overwrite() {
    let (_temp, db) = setup_temp_db();

    db.put(b"key", b"value1").unwrap();
    db.put(b"key", b"value2").unwrap();

    assert_eq!(db.get(b"key").unwrap(), &b"value2"[..]);
}

#[test]
fn test_delete() {
    let (_temp, db) = setup_temp_db();

    db.put(b"key", b"value").unwrap();
    db.delete(b"key").unwrap();

    assert!(matches!(db.get(b"key"), Err(Error::NotFound)));
}

#[test]
fn test_delete_nonexistent_key_is_ok() {
    let (_temp, db) = setup_temp_db();

    db.delete(b"nonexistent").unwrap();
}

#[test]
fn test_sync_put_is_durable_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db");

    {
        let db = Database::open_path(&path).unwrap();
        db.put_opt(b"key", b"value", &WriteOptions::durable()).unwrap();
        // dropped without close: replay must still see the record
    }

    let db = Database::open_path(&path).unwrap();
    assert_eq!(db.get(b"key").unwrap(), &b"value"[..]);
}

#[test]
fn test_stats_returns_text() {
    let (_temp, db) = setup_temp_db();

    db.put(b"a", b"1").unwrap();
    let stats = db.stats().unwrap();
    assert!(stats.contains("entries"));
    assert!(stats.contains("open snapshots"));
}

// =============================================================================
// Open Options Tests
// =============================================================================

#[test]
fn test_open_missing_without_create_fails() {
    let temp_dir = TempDir::new().unwrap();
    let opts = Options::builder().create_if_missing(false).build();

    let result = Database::open(temp_dir.path().join("absent"), opts);
    assert!(matches!(result, Err(Error::Open(_))));
}

#[test]
fn test_open_existing_with_error_if_exists_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db");

    let db = Database::open_path(&path).unwrap();
    db.put(b"k", b"v").unwrap();
    drop(db);

    let opts = Options::builder().error_if_exists(true).build();
    let result = Database::open(&path, opts);
    assert!(matches!(result, Err(Error::Open(_))));
}

#[test]
fn test_invalid_options_fail_before_engine_is_touched() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db");

    let opts = Options::builder().block_size(0).build();
    assert!(matches!(Database::open(&path, opts), Err(Error::Config(_))));

    // nothing was created on disk
    assert!(!path.exists());
}

#[test]
fn test_open_without_compression() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db");

    let opts = Options::builder().compression(false).build();
    let db = Database::open(&path, opts).unwrap();
    db.put_opt(b"key", b"value", &WriteOptions::durable()).unwrap();
    drop(db);

    // records written raw are replayed the same way
    let opts = Options::builder().compression(false).build();
    let db = Database::open(&path, opts).unwrap();
    assert_eq!(db.get(b"key").unwrap(), &b"value"[..]);
}

// =============================================================================
// Compaction Tests
// =============================================================================

#[test]
fn test_log_compaction_preserves_contents() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db");

    // tiny max_file_size so overwrites force log rewrites
    let opts = Options::builder().max_file_size(512).build();
    let db = Database::open(&path, opts).unwrap();

    for round in 0..20u32 {
        for key in 0..10u32 {
            db.put(
                format!("key-{key:02}").as_bytes(),
                format!("value-{round}").as_bytes(),
            )
            .unwrap();
        }
    }

    for key in 0..10u32 {
        assert_eq!(
            db.get(format!("key-{key:02}").as_bytes()).unwrap(),
            &b"value-19"[..]
        );
    }
    drop(db);

    // the compacted log replays to the same state
    let db = Database::open_path(&path).unwrap();
    assert_eq!(db.get(b"key-00").unwrap(), &b"value-19"[..]);
}

#[test]
fn test_compact_range_preserves_contents() {
    let (_temp, db) = setup_temp_db();

    db.put(b"a", b"1").unwrap();
    db.put(b"b", b"2").unwrap();

    db.compact_range(None, None).unwrap();
    db.compact_range(Some(b"a"), Some(b"b")).unwrap();

    assert_eq!(db.get(b"a").unwrap(), &b"1"[..]);
    assert_eq!(db.get(b"b").unwrap(), &b"2"[..]);
}

// =============================================================================
// Repair / Destroy Tests
// =============================================================================

#[test]
fn test_repair_drops_corrupt_tail() {
    use std::io::Write;

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db");

    {
        let db = Database::open_path(&path).unwrap();
        db.put_opt(b"a", b"1", &WriteOptions::durable()).unwrap();
        db.put_opt(b"b", b"2", &WriteOptions::durable()).unwrap();
    }

    // garbage after the last complete record
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(path.join("wal.log"))
        .unwrap();
    file.write_all(b"\xde\xad\xbe\xef torn frame").unwrap();
    drop(file);

    // paranoid open refuses the corrupt log
    let paranoid = Options::builder().paranoid_checks(true).build();
    assert!(matches!(
        Database::open(&path, paranoid),
        Err(Error::Open(_))
    ));

    repair_db(&path).unwrap();

    let paranoid = Options::builder().paranoid_checks(true).build();
    let db = Database::open(&path, paranoid).unwrap();
    assert_eq!(db.get(b"a").unwrap(), &b"1"[..]);
    assert_eq!(db.get(b"b").unwrap(), &b"2"[..]);
}

#[test]
fn test_repair_missing_database_fails() {
    let temp_dir = TempDir::new().unwrap();
    assert!(repair_db(temp_dir.path().join("absent")).is_err());
}

#[test]
fn test_destroy_removes_all_artifacts() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db");

    {
        let db = Database::open_path(&path).unwrap();
        db.put(b"k", b"v").unwrap();
    }

    destroy_db(&path).unwrap();
    assert!(!path.exists());

    let opts = Options::builder().create_if_missing(false).build();
    assert!(matches!(Database::open(&path, opts), Err(Error::Open(_))));
}

#[test]
fn test_destroy_missing_database_is_ok() {
    let temp_dir = TempDir::new().unwrap();
    destroy_db(temp_dir.path().join("never-existed")).unwrap();
}

// =============================================================================
// Close Tests
// =============================================================================

#[test]
fn test_close_is_idempotent() {
    let (_temp, db) = setup_temp_db();

    db.close().unwrap();
    db.close().unwrap();
    assert!(db.is_closed());
}

#[test]
fn test_operations_after_close_fail() {
    let (_temp, db) = setup_temp_db();

    db.put(b"k", b"v").unwrap();
    db.close().unwrap();

    assert!(matches!(db.get(b"k"), Err(Error::Closed(_))));
    assert!(matches!(db.put(b"k", b"v"), Err(Error::Closed(_))));
    assert!(matches!(db.delete(b"k"), Err(Error::Closed(_))));
    assert!(matches!(db.create_snapshot(), Err(Error::Closed(_))));
    assert!(matches!(db.stats(), Err(Error::Closed(_))));
}

#[test]
fn test_close_flushes_pending_writes() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db");

    {
        let db = Database::open_path(&path).unwrap();
        db.put(b"key", b"value").unwrap();
        db.close().unwrap();
    }

    let db = Database::open_path(&path).unwrap();
    assert_eq!(db.get(b"key").unwrap(), &b"value"[..]);
}
