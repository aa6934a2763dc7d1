//! Key comparators
//!
//! The total order over keys. Every range-scan bound check and every ordered
//! structure in the bundled engine goes through the database's configured
//! comparator, never through a fixed byte comparison.

use std::cmp::Ordering;
use std::sync::Arc;

/// A total order over keys.
///
/// Implementations must be consistent (a genuine total order) and cheap:
/// the engine calls `compare` on every ordered insert, seek, and bound check.
pub trait Comparator: Send + Sync {
    /// Name of the comparator, for diagnostics.
    fn name(&self) -> &str;

    /// Compare two keys.
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;
}

/// Default comparator: lexicographic byte order.
#[derive(Debug, Default, Clone, Copy)]
pub struct BytewiseComparator;

impl Comparator for BytewiseComparator {
    fn name(&self) -> &str {
        "bytewise"
    }

    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }
}

/// Shared comparator handle, cloned into every child that needs the order.
pub type ComparatorRef = Arc<dyn Comparator>;
