//! Range iterators
//!
//! A directional, optionally-bounded cursor over a database or a snapshot.
//! The iterator is a small state machine over the engine cursor:
//!
//! - `Empty`: no keys in range at construction. Terminal.
//! - `Positioned`: sitting on the entry the next call will yield.
//! - `Exhausted`: past the end or past the bound. Terminal and idempotent —
//!   further calls keep signaling end-of-sequence.
//!
//! Bound checks always go through the owning database's configured
//! comparator. The produced sequence is lazy, finite, and not restartable.

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use bytes::Bytes;

use crate::config::ReadOptions;
use crate::db::DbInner;
use crate::engine::EngineCursor;
use crate::error::{Error, Result};
use crate::snapshot::SnapshotInner;

/// Scan direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

/// Options for one range scan. Both bounds are inclusive.
#[derive(Debug, Clone)]
pub struct RangeOptions {
    pub key_from: Option<Bytes>,
    pub key_to: Option<Bytes>,
    pub direction: Direction,
    /// Yield values alongside keys. When false, entries carry keys only.
    pub include_value: bool,
    pub verify_checksums: bool,
    pub fill_cache: bool,
}

impl Default for RangeOptions {
    fn default() -> Self {
        Self {
            key_from: None,
            key_to: None,
            direction: Direction::Forward,
            include_value: true,
            verify_checksums: false,
            fill_cache: true,
        }
    }
}

impl RangeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inclusive lower bound.
    pub fn key_from(mut self, key: &[u8]) -> Self {
        self.key_from = Some(Bytes::copy_from_slice(key));
        self
    }

    /// Inclusive upper bound.
    pub fn key_to(mut self, key: &[u8]) -> Self {
        self.key_to = Some(Bytes::copy_from_slice(key));
        self
    }

    /// Scan from the upper end of the range toward the lower.
    pub fn reverse(mut self) -> Self {
        self.direction = Direction::Reverse;
        self
    }

    /// Yield keys without values.
    pub fn keys_only(mut self) -> Self {
        self.include_value = false;
        self
    }

    pub fn verify_checksums(mut self, yes: bool) -> Self {
        self.verify_checksums = yes;
        self
    }

    pub fn fill_cache(mut self, yes: bool) -> Self {
        self.fill_cache = yes;
        self
    }

    pub(crate) fn read_options(&self) -> ReadOptions {
        ReadOptions {
            verify_checksums: self.verify_checksums,
            fill_cache: self.fill_cache,
        }
    }
}

/// One scanned entry. `value` is `None` for keys-only scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    pub key: Bytes,
    pub value: Option<Bytes>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IterState {
    Positioned,
    Empty,
    Exhausted,
}

/// A bounded, directional iterator over a database or snapshot.
pub struct DbIterator {
    db: Arc<DbInner>,
    /// Keeps the source snapshot alive for the iterator's whole life.
    snapshot: Option<Arc<SnapshotInner>>,
    cursor: Option<Box<dyn EngineCursor>>,
    /// The bound checked on each advance: `key_to` going forward, `key_from`
    /// going backward.
    bound: Option<Bytes>,
    direction: Direction,
    include_value: bool,
    state: IterState,
    /// Whether this iterator still counts toward the handle's live total.
    counted: bool,
}

impl DbIterator {
    pub(crate) fn new(
        db: Arc<DbInner>,
        snapshot: Option<Arc<SnapshotInner>>,
        mut cursor: Box<dyn EngineCursor>,
        opts: RangeOptions,
    ) -> Self {
        db.open_iterators.fetch_add(1, Ordering::AcqRel);

        // Initial positioning. Forward starts at the first key >= key_from.
        // Reverse starts at the last key <= key_to: seek lands at the first
        // key >= key_to, so a landing that compares greater steps back once,
        // and a failed seek means every key is smaller than key_to.
        match opts.direction {
            Direction::Forward => match &opts.key_from {
                Some(from) => cursor.seek(from),
                None => cursor.seek_to_first(),
            },
            Direction::Reverse => match &opts.key_to {
                Some(to) => {
                    cursor.seek(to);
                    if !cursor.valid() {
                        cursor.seek_to_last();
                    } else if db.comparator().compare(cursor.key(), to) == CmpOrdering::Greater {
                        cursor.prev();
                    }
                }
                None => cursor.seek_to_last(),
            },
        }

        let bound = match opts.direction {
            Direction::Forward => opts.key_to,
            Direction::Reverse => opts.key_from,
        };

        let (state, cursor) = if cursor.valid() {
            (IterState::Positioned, Some(cursor))
        } else {
            // No keys in range at construction. Not an error.
            (IterState::Empty, None)
        };

        Self {
            db,
            snapshot,
            cursor,
            bound,
            direction: opts.direction,
            include_value: opts.include_value,
            state,
            counted: true,
        }
    }

    /// Drop the engine cursor and stop yielding. Terminal.
    fn exhaust(&mut self) {
        self.state = IterState::Exhausted;
        self.cursor = None;
    }

    fn release(&mut self) {
        if self.counted {
            self.counted = false;
            self.db.open_iterators.fetch_sub(1, Ordering::AcqRel);
        }
    }

    /// Close the iterator early, releasing its cursor, its source pin, and
    /// its slot in the handle's live count. Closing twice is a no-op.
    pub fn close(&mut self) {
        self.exhaust();
        self.snapshot = None;
        self.release();
    }
}

impl Iterator for DbIterator {
    type Item = Result<ScanEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state != IterState::Positioned {
            return None;
        }

        if self.db.check_open().is_err() {
            self.exhaust();
            return Some(Err(Error::Closed("database handle is closed".into())));
        }

        let Some(cursor) = self.cursor.as_mut() else {
            self.exhaust();
            return None;
        };
        if !cursor.valid() {
            self.exhaust();
            return None;
        }

        // Bound check first, through the configured comparator.
        if let Some(bound) = &self.bound {
            let ord = self.db.comparator().compare(cursor.key(), bound);
            let violated = match self.direction {
                Direction::Forward => ord == CmpOrdering::Greater,
                Direction::Reverse => ord == CmpOrdering::Less,
            };
            if violated {
                self.exhaust();
                return None;
            }
        }

        let key = Bytes::copy_from_slice(cursor.key());
        let value = self.include_value.then(|| cursor.value().clone());

        // Step in preparation for the next call.
        match self.direction {
            Direction::Forward => cursor.next(),
            Direction::Reverse => cursor.prev(),
        }
        if !cursor.valid() {
            self.exhaust();
        }

        Some(Ok(ScanEntry { key, value }))
    }
}

impl Drop for DbIterator {
    fn drop(&mut self) {
        self.close();
    }
}
