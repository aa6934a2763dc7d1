//! Error types for stratakv
//!
//! Provides a unified error type for all facade operations, plus the
//! translation from engine-level status values.

use thiserror::Error;

use crate::engine::Status;

/// Result type alias using Error
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for stratakv operations
#[derive(Debug, Error)]
pub enum Error {
    // -------------------------------------------------------------------------
    // Construction Errors
    // -------------------------------------------------------------------------
    /// Invalid construction parameters, detected before the engine is touched.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The engine failed to open or create the database; the handle is left
    /// fully unconstructed.
    #[error("open failed: {0}")]
    Open(String),

    // -------------------------------------------------------------------------
    // Operation Errors
    // -------------------------------------------------------------------------
    /// `get` on an absent key. An expected signal, not a fault.
    #[error("key not found")]
    NotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Corruption surfaced verbatim from the engine's status.
    #[error("corruption: {0}")]
    Corruption(String),

    /// Allocation failure reported by an engine while building helper
    /// objects. The bundled engine never reports this; the variant exists for
    /// engines that do.
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    /// Use of a handle, snapshot, or iterator after the handle was closed or
    /// the snapshot released.
    #[error("used after close: {0}")]
    Closed(String),
}

impl From<Status> for Error {
    fn from(status: Status) -> Self {
        match status {
            Status::Io(e) => Error::Io(e),
            Status::Corruption(msg) => Error::Corruption(msg),
            Status::OutOfMemory(msg) => Error::OutOfMemory(msg),
        }
    }
}
