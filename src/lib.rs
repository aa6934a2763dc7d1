//! # stratakv
//!
//! A resource-lifecycle and range-scan facade over an embedded, ordered
//! key-value engine:
//! - A database handle as the root of all lifetimes
//! - Refcounted point-in-time snapshots
//! - Bounded, directional range iterators
//! - Atomic write batches
//! - A bundled log-structured engine behind the engine seam
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Database Handle                          │
//! │        (options, comparator, child counters, close)          │
//! └────────┬──────────────────┬──────────────────┬──────────────┘
//!          │                  │                  │
//!          ▼                  ▼                  ▼
//!   ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//!   │  Snapshot   │    │  Iterator   │    │ WriteBatch  │
//!   │ (pinned     │    │ (bounded,   │    │ (ordered    │
//!   │  view)      │    │  directional│    │  put/delete │
//!   └──────┬──────┘    │  cursor)    │    │  ops)       │
//!          │           └──────┬──────┘    └──────┬──────┘
//!          └─────────┬────────┘                  │
//!                    ▼                           ▼
//!          ┌──────────────────────────────────────────┐
//!          │            Engine seam (traits)          │
//!          │   get/put/delete/write/snapshot/cursor   │
//!          └────────────────────┬─────────────────────┘
//!                               ▼
//!                    ┌──────────────────┐
//!                    │    LogEngine     │
//!                    │ (ordered table + │
//!                    │  operation log)  │
//!                    └──────────────────┘
//! ```
//!
//! Children hold their source strongly; sources count children with plain
//! atomics. The graph is acyclic, and engine resources live exactly as long
//! as the longest-lived holder.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod comparator;

pub mod batch;
pub mod engine;
pub mod db;
pub mod snapshot;
pub mod iterator;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use batch::{BatchOp, WriteBatch};
pub use comparator::{BytewiseComparator, Comparator};
pub use config::{Options, ReadOptions, WriteOptions};
pub use db::{destroy_db, repair_db, Database};
pub use error::{Error, Result};
pub use iterator::{DbIterator, Direction, RangeOptions, ScanEntry};
pub use snapshot::Snapshot;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of stratakv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
