//! Write batches
//!
//! An ordered, self-contained buffer of put/delete operations, applied to a
//! database as one atomic unit. A batch carries no relationship to any
//! particular database: it can be applied to any open handle, cleared, and
//! reused.

use bytes::Bytes;

/// A single buffered operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Put a key-value pair
    Put { key: Bytes, value: Bytes },

    /// Delete a key
    Delete { key: Bytes },
}

impl BatchOp {
    /// The key this operation targets.
    pub fn key(&self) -> &[u8] {
        match self {
            BatchOp::Put { key, .. } => key,
            BatchOp::Delete { key } => key,
        }
    }
}

/// An insertion-ordered sequence of put/delete operations.
///
/// `put` and `delete` copy their payloads into batch-owned storage
/// immediately, so caller buffers may be reused right after the call returns.
/// When the batch is applied, a later operation on a key overrides an earlier
/// one.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a put operation.
    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        self.ops.push(BatchOp::Put {
            key: Bytes::copy_from_slice(key),
            value: Bytes::copy_from_slice(value),
        });
    }

    /// Buffer a delete operation.
    pub fn delete(&mut self, key: &[u8]) {
        self.ops.push(BatchOp::Delete {
            key: Bytes::copy_from_slice(key),
        });
    }

    /// Drop all buffered operations, keeping the batch reusable.
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Number of buffered operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Buffered operations in insertion order.
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }
}
