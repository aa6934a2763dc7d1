//! Snapshots
//!
//! A refcounted, immutable read view pinned to its database handle. The
//! snapshot holds the handle strongly, so engine resources stay alive as
//! long as the snapshot does; the handle only keeps a counter, never a back
//! pointer. Release is idempotent: the engine view is taken out of an
//! `Option` exactly once, whether by `release` or by drop.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::config::ReadOptions;
use crate::db::DbInner;
use crate::engine::EngineSnapshot;
use crate::error::{Error, Result};
use crate::iterator::{DbIterator, RangeOptions};

pub(crate) struct SnapshotInner {
    pub(crate) db: Arc<DbInner>,
    /// `None` once released.
    view: Mutex<Option<Box<dyn EngineSnapshot>>>,
}

impl SnapshotInner {
    /// Release the engine view and decrement the handle's snapshot counter.
    /// Safe to call any number of times.
    pub(crate) fn release(&self) {
        if self.view.lock().take().is_some() {
            self.db
                .open_snapshots
                .fetch_sub(1, std::sync::atomic::Ordering::AcqRel);
        }
    }
}

impl Drop for SnapshotInner {
    fn drop(&mut self) {
        self.release();
    }
}

/// A point-in-time read view of a database.
pub struct Snapshot {
    inner: Arc<SnapshotInner>,
}

impl Snapshot {
    pub(crate) fn new(db: Arc<DbInner>, view: Box<dyn EngineSnapshot>) -> Self {
        db.open_snapshots
            .fetch_add(1, std::sync::atomic::Ordering::AcqRel);
        Self {
            inner: Arc::new(SnapshotInner {
                db,
                view: Mutex::new(Some(view)),
            }),
        }
    }

    /// Get the value for `key` as of the captured state.
    pub fn get(&self, key: &[u8]) -> Result<Bytes> {
        self.get_opt(key, &ReadOptions::default())
    }

    /// `get` with explicit read options.
    pub fn get_opt(&self, key: &[u8], opts: &ReadOptions) -> Result<Bytes> {
        self.inner.db.check_open()?;
        let guard = self.inner.view.lock();
        let view = guard
            .as_ref()
            .ok_or_else(|| Error::Closed("snapshot has been released".into()))?;
        match view.get(opts, key)? {
            Some(value) => Ok(value),
            None => Err(Error::NotFound),
        }
    }

    /// Create a bounded, directional iterator pinned to the captured state.
    ///
    /// The iterator holds this snapshot alive for its entire life.
    pub fn range_iter(&self, opts: RangeOptions) -> Result<DbIterator> {
        self.inner.db.check_open()?;
        let cursor = {
            let guard = self.inner.view.lock();
            let view = guard
                .as_ref()
                .ok_or_else(|| Error::Closed("snapshot has been released".into()))?;
            view.cursor(&opts.read_options())?
        };
        Ok(DbIterator::new(
            self.inner.db.clone(),
            Some(self.inner.clone()),
            cursor,
            opts,
        ))
    }

    /// Release the snapshot. Releasing twice is a no-op.
    pub fn release(&self) {
        self.inner.release();
    }

    /// Whether this snapshot has been released.
    pub fn is_released(&self) -> bool {
        self.inner.view.lock().is_none()
    }
}
