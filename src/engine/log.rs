//! Bundled log-structured engine
//!
//! A comparator-ordered in-memory table made durable by an operation log.
//! Mutations append to the log first, then apply to the table; open replays
//! the log. Snapshots and cursors take a shallow copy of the table, so they
//! are immune to later mutation without any coordination.
//!
//! ## Concurrency Model: Single-Writer / Multiple-Reader
//!
//! - **Writes** (put/delete/write/compact): serialized by the WAL lock,
//!   which doubles as the single-writer lock. Lock order: WAL, then table.
//! - **Reads** (get/snapshot/cursor): take the table read lock only, for the
//!   duration of one map probe or one shallow copy.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::batch::{BatchOp, WriteBatch};
use crate::comparator::ComparatorRef;
use crate::config::{Options, ReadOptions, WriteOptions};

use super::table::{OrdKey, Table, TableCursor, TableView};
use super::wal::{read_log, LogRecord, Operation, WalWriter};
use super::{EngineCursor, EngineResult, EngineSnapshot, Status, StorageEngine};

const LOG_FILENAME: &str = "wal.log";

/// The bundled storage engine.
pub struct LogEngine {
    cmp: ComparatorRef,
    compression: bool,
    write_buffer_size: usize,
    /// Log size that triggers a compacting rewrite.
    max_file_size: u64,

    log_path: PathBuf,

    /// Live state. Readers hold this briefly; the writer holds it only while
    /// applying an already-logged record.
    table: RwLock<Table>,

    /// Append side of the log; also the single-writer lock.
    wal: Mutex<WalWriter>,

    /// Sequence number of the last committed record.
    seq: AtomicU64,
}

impl LogEngine {
    /// Open or create the engine at `path`.
    ///
    /// Replays the operation log into the table. A corrupt log tail is
    /// truncated away unless `paranoid_checks` is set, in which case it is
    /// fatal.
    pub fn open(path: &Path, options: &Options) -> EngineResult<Self> {
        let log_path = path.join(LOG_FILENAME);
        let exists = log_path.exists();

        if exists && options.error_if_exists {
            return Err(Status::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("database already exists: {}", path.display()),
            )));
        }
        if !exists && !options.create_if_missing {
            return Err(Status::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!(
                    "database does not exist: {} (create_if_missing is false)",
                    path.display()
                ),
            )));
        }

        fs::create_dir_all(path)?;

        let mut table = Table::new();
        let mut last_seq = 0;

        if exists {
            let contents = read_log(&log_path)?;
            if contents.corrupted {
                if options.paranoid_checks {
                    return Err(Status::Corruption(format!(
                        "log has a corrupt tail past byte {}",
                        contents.valid_len
                    )));
                }
                warn!(
                    path = %log_path.display(),
                    valid_len = contents.valid_len,
                    "truncating corrupt log tail"
                );
                let file = OpenOptions::new().write(true).open(&log_path)?;
                file.set_len(contents.valid_len)?;
                file.sync_data()?;
            }

            for record in &contents.records {
                last_seq = record.seq;
                for op in &record.ops {
                    Self::apply(&mut table, &options.comparator, op);
                }
            }
            debug!(
                records = contents.records.len(),
                entries = table.len(),
                "replayed operation log"
            );
        }

        let wal = WalWriter::open(&log_path, options.write_buffer_size, options.compression)?;
        info!(path = %path.display(), entries = table.len(), "opened log engine");

        Ok(Self {
            cmp: options.comparator.clone(),
            compression: options.compression,
            write_buffer_size: options.write_buffer_size,
            max_file_size: options.max_file_size as u64,
            log_path,
            table: RwLock::new(table),
            wal: Mutex::new(wal),
            seq: AtomicU64::new(last_seq),
        })
    }

    /// Best-effort recovery: keep the longest valid log prefix, drop the rest.
    pub fn repair(path: &Path) -> EngineResult<()> {
        let log_path = path.join(LOG_FILENAME);
        if !log_path.exists() {
            return Err(Status::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no database at {}", path.display()),
            )));
        }

        let contents = read_log(&log_path)?;
        if contents.corrupted {
            warn!(
                path = %log_path.display(),
                kept = contents.records.len(),
                valid_len = contents.valid_len,
                "repair: dropping corrupt log tail"
            );
            let file = OpenOptions::new().write(true).open(&log_path)?;
            file.set_len(contents.valid_len)?;
            file.sync_data()?;
        } else {
            info!(path = %log_path.display(), "repair: log is intact");
        }
        Ok(())
    }

    /// Irreversibly delete every on-disk artifact at `path`.
    ///
    /// Destroying a path with no database is a no-op.
    pub fn destroy(path: &Path) -> EngineResult<()> {
        if !path.exists() {
            return Ok(());
        }
        fs::remove_dir_all(path)?;
        info!(path = %path.display(), "destroyed database");
        Ok(())
    }

    fn apply(table: &mut Table, cmp: &ComparatorRef, op: &Operation) {
        match op {
            Operation::Put { key, value } => {
                table.insert(
                    OrdKey::new(Bytes::from(key.clone()), cmp.clone()),
                    Bytes::from(value.clone()),
                );
            }
            Operation::Delete { key } => {
                let probe = OrdKey::new(Bytes::copy_from_slice(key), cmp.clone());
                table.remove(&probe);
            }
        }
    }

    /// Log one atomic group of operations, then apply it to the table.
    fn commit(&self, ops: Vec<Operation>, sync: bool) -> EngineResult<()> {
        if ops.is_empty() {
            return Ok(());
        }

        let mut wal = self.wal.lock();
        let seq = self.seq.load(AtomicOrdering::Acquire) + 1;
        let record = LogRecord { seq, ops };
        wal.append(&record, sync)?;
        self.seq.store(seq, AtomicOrdering::Release);

        {
            let mut table = self.table.write();
            for op in &record.ops {
                Self::apply(&mut table, &self.cmp, op);
            }
        }

        if wal.len() > self.max_file_size {
            self.rewrite_log(&mut wal)?;
        }
        Ok(())
    }

    /// Rewrite the log as a single record holding the current table.
    ///
    /// Called with the WAL lock held. The rewrite goes to a sibling file that
    /// is renamed over the log, so a crash mid-rewrite leaves the old log.
    fn rewrite_log(&self, wal: &mut WalWriter) -> EngineResult<()> {
        let before = wal.len();
        let ops: Vec<Operation> = {
            let table = self.table.read();
            table
                .iter()
                .map(|(k, v)| Operation::Put {
                    key: k.bytes().to_vec(),
                    value: v.to_vec(),
                })
                .collect()
        };
        let record = LogRecord {
            seq: self.seq.load(AtomicOrdering::Acquire),
            ops,
        };

        let tmp_path = self.log_path.with_extension("log.rewrite");
        if tmp_path.exists() {
            fs::remove_file(&tmp_path)?;
        }
        {
            let mut writer = WalWriter::open(&tmp_path, self.write_buffer_size, self.compression)?;
            if !record.ops.is_empty() {
                writer.append(&record, true)?;
            } else {
                writer.sync()?;
            }
        }
        fs::rename(&tmp_path, &self.log_path)?;

        *wal = WalWriter::open(&self.log_path, self.write_buffer_size, self.compression)?;
        info!(before, after = wal.len(), "compacted operation log");
        Ok(())
    }

    /// Shallow copy of the current table.
    fn version(&self) -> Arc<Table> {
        Arc::new(self.table.read().clone())
    }
}

impl StorageEngine for LogEngine {
    fn get(&self, _opts: &ReadOptions, key: &[u8]) -> EngineResult<Option<Bytes>> {
        let probe = OrdKey::new(Bytes::copy_from_slice(key), self.cmp.clone());
        Ok(self.table.read().get(&probe).cloned())
    }

    fn put(&self, opts: &WriteOptions, key: &[u8], value: &[u8]) -> EngineResult<()> {
        self.commit(
            vec![Operation::Put {
                key: key.to_vec(),
                value: value.to_vec(),
            }],
            opts.sync,
        )
    }

    fn delete(&self, opts: &WriteOptions, key: &[u8]) -> EngineResult<()> {
        self.commit(vec![Operation::Delete { key: key.to_vec() }], opts.sync)
    }

    fn write(&self, opts: &WriteOptions, batch: &WriteBatch) -> EngineResult<()> {
        let ops = batch
            .ops()
            .iter()
            .map(|op| match op {
                BatchOp::Put { key, value } => Operation::Put {
                    key: key.to_vec(),
                    value: value.to_vec(),
                },
                BatchOp::Delete { key } => Operation::Delete { key: key.to_vec() },
            })
            .collect();
        self.commit(ops, opts.sync)
    }

    fn snapshot(&self) -> EngineResult<Box<dyn EngineSnapshot>> {
        Ok(Box::new(TableView::new(self.version(), self.cmp.clone())))
    }

    fn cursor(&self, _opts: &ReadOptions) -> EngineResult<Box<dyn EngineCursor>> {
        Ok(Box::new(TableCursor::new(self.version(), self.cmp.clone())))
    }

    fn compact_range(&self, _start: Option<&[u8]>, _end: Option<&[u8]>) -> EngineResult<()> {
        // The log holds no per-range structure; any compaction rewrites the
        // whole file.
        let mut wal = self.wal.lock();
        self.rewrite_log(&mut wal)
    }

    fn property(&self, name: &str) -> Option<String> {
        match name {
            "stats" => {
                let entries = self.table.read().len();
                let log_bytes = self.wal.lock().len();
                let seq = self.seq.load(AtomicOrdering::Acquire);
                Some(format!(
                    "log engine: {entries} entries, last seq {seq}, log {log_bytes} bytes\n\
                     comparator: {}, compression: {}",
                    self.cmp.name(),
                    self.compression
                ))
            }
            _ => None,
        }
    }

    fn flush(&self) -> EngineResult<()> {
        self.wal.lock().sync()
    }
}
