//! Comparator-ordered in-memory table
//!
//! The live state of the bundled engine: a `BTreeMap` whose keys sort by the
//! database's configured comparator rather than by fixed byte order. Versions
//! of the table are shared as `Arc`s; a snapshot or cursor takes a shallow
//! copy (the `Bytes` payloads are refcounted) and is independent of later
//! mutation.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound::{Excluded, Unbounded};
use std::sync::Arc;

use bytes::Bytes;

use crate::comparator::ComparatorRef;
use crate::config::ReadOptions;

use super::{EngineCursor, EngineResult, EngineSnapshot};

/// A key ordered by the configured comparator.
#[derive(Clone)]
pub(crate) struct OrdKey {
    bytes: Bytes,
    cmp: ComparatorRef,
}

impl OrdKey {
    pub(crate) fn new(bytes: Bytes, cmp: ComparatorRef) -> Self {
        Self { bytes, cmp }
    }

    pub(crate) fn bytes(&self) -> &Bytes {
        &self.bytes
    }
}

impl fmt::Debug for OrdKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OrdKey({:?})", self.bytes)
    }
}

impl PartialEq for OrdKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp.compare(&self.bytes, &other.bytes) == Ordering::Equal
    }
}

impl Eq for OrdKey {}

impl PartialOrd for OrdKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp.compare(&self.bytes, &other.bytes))
    }
}

impl Ord for OrdKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp.compare(&self.bytes, &other.bytes)
    }
}

/// The mutable live table.
pub(crate) type Table = BTreeMap<OrdKey, Bytes>;

/// An immutable, shared version of the table.
pub(crate) type Version = Arc<Table>;

/// A point-in-time view over one table version.
pub(crate) struct TableView {
    data: Version,
    cmp: ComparatorRef,
}

impl TableView {
    pub(crate) fn new(data: Version, cmp: ComparatorRef) -> Self {
        Self { data, cmp }
    }
}

impl EngineSnapshot for TableView {
    fn get(&self, _opts: &ReadOptions, key: &[u8]) -> EngineResult<Option<Bytes>> {
        let probe = OrdKey::new(Bytes::copy_from_slice(key), self.cmp.clone());
        Ok(self.data.get(&probe).cloned())
    }

    fn cursor(&self, _opts: &ReadOptions) -> EngineResult<Box<dyn EngineCursor>> {
        Ok(Box::new(TableCursor::new(
            self.data.clone(),
            self.cmp.clone(),
        )))
    }
}

/// Positioned cursor over one table version.
///
/// Navigation is expressed as range queries around the current key, so every
/// step is a fresh O(log n) probe and the cursor never borrows the map.
pub(crate) struct TableCursor {
    data: Version,
    cmp: ComparatorRef,
    current: Option<(OrdKey, Bytes)>,
}

impl TableCursor {
    pub(crate) fn new(data: Version, cmp: ComparatorRef) -> Self {
        Self {
            data,
            cmp,
            current: None,
        }
    }
}

impl EngineCursor for TableCursor {
    fn seek_to_first(&mut self) {
        self.current = self
            .data
            .iter()
            .next()
            .map(|(k, v)| (k.clone(), v.clone()));
    }

    fn seek_to_last(&mut self) {
        self.current = self
            .data
            .iter()
            .next_back()
            .map(|(k, v)| (k.clone(), v.clone()));
    }

    fn seek(&mut self, target: &[u8]) {
        let probe = OrdKey::new(Bytes::copy_from_slice(target), self.cmp.clone());
        self.current = self
            .data
            .range(probe..)
            .next()
            .map(|(k, v)| (k.clone(), v.clone()));
    }

    fn next(&mut self) {
        let advanced = match &self.current {
            Some((key, _)) => self
                .data
                .range((Excluded(key), Unbounded))
                .next()
                .map(|(k, v)| (k.clone(), v.clone())),
            None => None,
        };
        self.current = advanced;
    }

    fn prev(&mut self) {
        let stepped = match &self.current {
            Some((key, _)) => self
                .data
                .range((Unbounded, Excluded(key)))
                .next_back()
                .map(|(k, v)| (k.clone(), v.clone())),
            None => None,
        };
        self.current = stepped;
    }

    fn valid(&self) -> bool {
        self.current.is_some()
    }

    fn key(&self) -> &[u8] {
        let (key, _) = self.current.as_ref().expect("cursor is not valid");
        key.bytes()
    }

    fn value(&self) -> &Bytes {
        let (_, value) = self.current.as_ref().expect("cursor is not valid");
        value
    }
}
