//! Engine seam
//!
//! The facade treats the storage engine as a collaborator behind these
//! traits: primitive reads and writes, point-in-time views, and positioned
//! cursors. Everything above the seam (handle lifecycle, snapshot and
//! iterator accounting, batch semantics, error translation) belongs to the
//! facade; everything below it (storage layout, durability mechanics,
//! internal concurrency control) belongs to the engine.
//!
//! The bundled implementation is [`LogEngine`]: a comparator-ordered
//! in-memory table made durable by a checksummed operation log.

mod log;
mod table;
mod wal;

pub use log::LogEngine;

use bytes::Bytes;
use thiserror::Error;

use crate::batch::WriteBatch;
use crate::config::{ReadOptions, WriteOptions};

/// Result type for engine-level operations
pub type EngineResult<T> = std::result::Result<T, Status>;

/// Engine-level status values, translated into the facade taxonomy at the
/// seam (`From<Status> for Error`).
#[derive(Debug, Error)]
pub enum Status {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Corruption(String),

    #[error("{0}")]
    OutOfMemory(String),
}

/// Primitive operations an ordered key-value engine must provide.
///
/// All methods take `&self`: the engine supplies its own internal
/// concurrency control, and the facade never wraps engine calls in a lock of
/// its own.
pub trait StorageEngine: Send + Sync {
    /// Point lookup against the live state. `Ok(None)` means absent.
    fn get(&self, opts: &ReadOptions, key: &[u8]) -> EngineResult<Option<Bytes>>;

    /// Insert or overwrite a single key.
    fn put(&self, opts: &WriteOptions, key: &[u8], value: &[u8]) -> EngineResult<()>;

    /// Remove a single key. Removing an absent key is not an error.
    fn delete(&self, opts: &WriteOptions, key: &[u8]) -> EngineResult<()>;

    /// Apply every operation in the batch as one atomic unit.
    fn write(&self, opts: &WriteOptions, batch: &WriteBatch) -> EngineResult<()>;

    /// Capture a point-in-time view. Dropping the returned view releases it.
    fn snapshot(&self) -> EngineResult<Box<dyn EngineSnapshot>>;

    /// Positioned cursor over the live state as of this call.
    fn cursor(&self, opts: &ReadOptions) -> EngineResult<Box<dyn EngineCursor>>;

    /// Rewrite storage for the given key range into its most compact form.
    /// `None` bounds extend the range to the respective end.
    fn compact_range(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> EngineResult<()>;

    /// Free-form diagnostic text for a named property, if the engine knows it.
    fn property(&self, name: &str) -> Option<String>;

    /// Flush buffered writes to stable storage.
    fn flush(&self) -> EngineResult<()>;
}

/// A point-in-time read view, pinned until dropped.
pub trait EngineSnapshot: Send + Sync {
    fn get(&self, opts: &ReadOptions, key: &[u8]) -> EngineResult<Option<Bytes>>;

    fn cursor(&self, opts: &ReadOptions) -> EngineResult<Box<dyn EngineCursor>>;
}

/// A positioned cursor over an ordered view of the keyspace.
///
/// Mirrors the classic seek/next/prev cursor shape: after any positioning
/// call the cursor is either valid (sitting on an entry) or invalid (off the
/// end). `key`/`value` may only be called while valid.
pub trait EngineCursor: Send {
    /// Position at the first entry overall.
    fn seek_to_first(&mut self);

    /// Position at the last entry overall.
    fn seek_to_last(&mut self);

    /// Position at the first entry with key >= `target`.
    fn seek(&mut self, target: &[u8]);

    /// Step to the next entry in ascending order.
    fn next(&mut self);

    /// Step to the previous entry in ascending order.
    fn prev(&mut self);

    /// Whether the cursor currently sits on an entry.
    fn valid(&self) -> bool;

    /// Key at the current position. Panics if invalid.
    fn key(&self) -> &[u8];

    /// Value at the current position. Panics if invalid.
    fn value(&self) -> &Bytes;
}
