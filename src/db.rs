//! Database handle
//!
//! The root of all lifetimes. A `Database` owns its engine, configuration,
//! and comparator, and hands out children — snapshots and iterators — that
//! hold a strong reference back to it for their entire life. The handle
//! tracks live children with plain atomic counters; there are no back
//! pointers from the handle to its children, so the ownership graph is
//! acyclic.
//!
//! ## Concurrency Model
//!
//! - The facade holds no global lock: every blocking call goes straight to
//!   the engine, which arbitrates concurrent mutation and reads internally.
//! - The snapshot/iterator counters are atomics; concurrent child
//!   construction and destruction never loses or double-applies a count.
//! - `close` is a state flip, not a teardown: engine resources are freed
//!   when the last strong reference (handle or child) drops.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::batch::WriteBatch;
use crate::comparator::ComparatorRef;
use crate::config::{Options, ReadOptions, WriteOptions};
use crate::engine::{LogEngine, StorageEngine};
use crate::error::{Error, Result};
use crate::iterator::{DbIterator, RangeOptions};
use crate::snapshot::Snapshot;

/// Shared state behind a database handle and all of its children.
pub(crate) struct DbInner {
    pub(crate) engine: Box<dyn StorageEngine>,
    pub(crate) options: Options,
    closed: AtomicBool,
    pub(crate) open_snapshots: AtomicUsize,
    pub(crate) open_iterators: AtomicUsize,
}

impl DbInner {
    /// Fail with `Error::Closed` once the handle has been closed.
    pub(crate) fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(Error::Closed("database handle is closed".into()))
        } else {
            Ok(())
        }
    }

    pub(crate) fn comparator(&self) -> &ComparatorRef {
        &self.options.comparator
    }
}

/// An open database.
pub struct Database {
    inner: Arc<DbInner>,
}

impl Database {
    /// Open or create a database at `path` with the given options.
    ///
    /// Options are validated before any engine resource is created; a failed
    /// open holds nothing.
    pub fn open(path: impl AsRef<Path>, options: Options) -> Result<Self> {
        options.validate()?;

        let engine =
            LogEngine::open(path.as_ref(), &options).map_err(|s| Error::Open(s.to_string()))?;

        Ok(Self {
            inner: Arc::new(DbInner {
                engine: Box::new(engine),
                options,
                closed: AtomicBool::new(false),
                open_snapshots: AtomicUsize::new(0),
                open_iterators: AtomicUsize::new(0),
            }),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default options.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(path, Options::default())
    }

    // =========================================================================
    // Point Operations
    // =========================================================================

    /// Get the value for `key`. An absent key is `Err(Error::NotFound)`.
    pub fn get(&self, key: &[u8]) -> Result<Bytes> {
        self.get_opt(key, &ReadOptions::default())
    }

    /// `get` with explicit read options.
    pub fn get_opt(&self, key: &[u8], opts: &ReadOptions) -> Result<Bytes> {
        self.inner.check_open()?;
        match self.inner.engine.get(opts, key)? {
            Some(value) => Ok(value),
            None => Err(Error::NotFound),
        }
    }

    /// Put a key-value pair.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.put_opt(key, value, &WriteOptions::default())
    }

    /// `put` with explicit write options; `sync` makes the write durable
    /// before this returns.
    pub fn put_opt(&self, key: &[u8], value: &[u8], opts: &WriteOptions) -> Result<()> {
        self.inner.check_open()?;
        self.inner.engine.put(opts, key, value)?;
        Ok(())
    }

    /// Delete a key. Deleting an absent key is not an error.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.delete_opt(key, &WriteOptions::default())
    }

    /// `delete` with explicit write options.
    pub fn delete_opt(&self, key: &[u8], opts: &WriteOptions) -> Result<()> {
        self.inner.check_open()?;
        self.inner.engine.delete(opts, key)?;
        Ok(())
    }

    /// Apply every operation in `batch` as one atomic unit: all become
    /// visible together or none do.
    pub fn write(&self, batch: &WriteBatch) -> Result<()> {
        self.write_opt(batch, &WriteOptions::default())
    }

    /// `write` with explicit write options.
    pub fn write_opt(&self, batch: &WriteBatch, opts: &WriteOptions) -> Result<()> {
        self.inner.check_open()?;
        self.inner.engine.write(opts, batch)?;
        Ok(())
    }

    // =========================================================================
    // Children
    // =========================================================================

    /// Capture the database state as of this call. Later mutations on the
    /// handle are invisible through the snapshot.
    pub fn create_snapshot(&self) -> Result<Snapshot> {
        self.inner.check_open()?;
        let view = self.inner.engine.snapshot()?;
        Ok(Snapshot::new(self.inner.clone(), view))
    }

    /// Create a bounded, directional iterator over the live database.
    ///
    /// An empty range is not an error: the iterator starts exhausted.
    pub fn range_iter(&self, opts: RangeOptions) -> Result<DbIterator> {
        self.inner.check_open()?;
        let cursor = self.inner.engine.cursor(&opts.read_options())?;
        Ok(DbIterator::new(self.inner.clone(), None, cursor, opts))
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Free-form diagnostic text. Not a stable machine format.
    pub fn stats(&self) -> Result<String> {
        self.inner.check_open()?;
        let engine = self
            .inner
            .engine
            .property("stats")
            .unwrap_or_else(|| "no engine stats".to_string());
        Ok(format!(
            "{engine}\nopen snapshots: {}, open iterators: {}",
            self.open_snapshot_count(),
            self.open_iterator_count()
        ))
    }

    /// Compact the given key range. `None` bounds extend to the ends.
    pub fn compact_range(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Result<()> {
        self.inner.check_open()?;
        self.inner.engine.compact_range(start, end)?;
        Ok(())
    }

    /// Close the handle.
    ///
    /// Flushes the engine and flips the handle to Closed: subsequent
    /// operations through this handle, its snapshots, or its iterators fail
    /// with `Error::Closed`. Engine resources are released once the last
    /// child drops. Closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        debug!(
            snapshots = self.open_snapshot_count(),
            iterators = self.open_iterator_count(),
            "closing database handle"
        );
        self.inner.engine.flush()?;
        Ok(())
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Number of live snapshots created from this handle.
    pub fn open_snapshot_count(&self) -> usize {
        self.inner.open_snapshots.load(Ordering::Acquire)
    }

    /// Number of live iterators created from this handle or its snapshots.
    pub fn open_iterator_count(&self) -> usize {
        self.inner.open_iterators.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.check_open().is_err()
    }
}

// =============================================================================
// Free Functions
// =============================================================================

/// Best-effort recovery of a corrupted database directory.
pub fn repair_db(path: impl AsRef<Path>) -> Result<()> {
    LogEngine::repair(path.as_ref()).map_err(Error::from)
}

/// Irreversibly delete all on-disk artifacts for the database at `path`.
pub fn destroy_db(path: impl AsRef<Path>) -> Result<()> {
    LogEngine::destroy(path.as_ref()).map_err(Error::from)
}
