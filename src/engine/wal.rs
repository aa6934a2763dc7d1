//! Operation log for the bundled engine
//!
//! Every mutation is appended here before it touches the table, so an open
//! after a crash replays the log and loses at most an unsynced tail. Records
//! are framed as `[len][crc32][body]` where the body is a flag byte followed
//! by the bincode-encoded record, LZ4-compressed when the flag says so.
//! A torn or corrupt frame ends recovery: everything before it is kept,
//! everything after it is unreachable by construction.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{EngineResult, Status};

/// Frame header: payload length + crc32 of the body.
const FRAME_HEADER_LEN: usize = 8;

const FLAG_RAW: u8 = 0;
const FLAG_LZ4: u8 = 1;

/// Operations that can be logged
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Operation {
    /// Put a key-value pair
    Put { key: Vec<u8>, value: Vec<u8> },

    /// Delete a key
    Delete { key: Vec<u8> },
}

/// A single log record: one atomic group of operations.
///
/// A plain put or delete is a one-operation record; an applied write batch is
/// one record holding the whole batch, which is what makes batch application
/// atomic across a crash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct LogRecord {
    /// Sequence number, monotonically increasing per committed record.
    pub seq: u64,

    /// The operations, in insertion order.
    pub ops: Vec<Operation>,
}

/// Encode one record into a complete frame.
fn encode_frame(record: &LogRecord, compression: bool) -> EngineResult<Vec<u8>> {
    let payload =
        bincode::serialize(record).map_err(|e| Status::Corruption(format!("encode: {e}")))?;

    let mut body = Vec::with_capacity(payload.len() + 1);
    if compression {
        body.push(FLAG_LZ4);
        body.extend_from_slice(&lz4_flex::compress_prepend_size(&payload));
    } else {
        body.push(FLAG_RAW);
        body.extend_from_slice(&payload);
    }

    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_le_bytes());
    frame.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Decode the frame starting at `buf[offset..]`.
///
/// Returns the record and the offset just past it, or `None` when the bytes
/// from `offset` on do not form a complete, checksum-valid frame.
fn decode_frame(buf: &[u8], offset: usize) -> Option<(LogRecord, usize)> {
    let rest = &buf[offset..];
    if rest.len() < FRAME_HEADER_LEN {
        return None;
    }

    let body_len = u32::from_le_bytes(rest[0..4].try_into().unwrap()) as usize;
    let stored_crc = u32::from_le_bytes(rest[4..8].try_into().unwrap());

    if body_len == 0 || rest.len() < FRAME_HEADER_LEN + body_len {
        return None;
    }

    let body = &rest[FRAME_HEADER_LEN..FRAME_HEADER_LEN + body_len];
    if crc32fast::hash(body) != stored_crc {
        return None;
    }

    let payload = match body[0] {
        FLAG_RAW => body[1..].to_vec(),
        FLAG_LZ4 => lz4_flex::decompress_size_prepended(&body[1..]).ok()?,
        _ => return None,
    };

    let record = bincode::deserialize(&payload).ok()?;
    Some((record, offset + FRAME_HEADER_LEN + body_len))
}

/// Outcome of reading a log file back.
pub(crate) struct LogContents {
    /// Every record in the valid prefix, in commit order.
    pub records: Vec<LogRecord>,

    /// Byte length of the valid prefix.
    pub valid_len: u64,

    /// Whether bytes past the valid prefix were found.
    pub corrupted: bool,
}

/// Read the longest valid prefix of the log at `path`.
pub(crate) fn read_log(path: &Path) -> EngineResult<LogContents> {
    let mut buf = Vec::new();
    File::open(path)?.read_to_end(&mut buf)?;

    let mut records = Vec::new();
    let mut offset = 0usize;

    while let Some((record, next)) = decode_frame(&buf, offset) {
        records.push(record);
        offset = next;
    }

    Ok(LogContents {
        records,
        valid_len: offset as u64,
        corrupted: offset < buf.len(),
    })
}

/// Append-side of the log.
pub(crate) struct WalWriter {
    file: BufWriter<File>,
    compression: bool,
    /// Current file length, including buffered bytes.
    len: u64,
}

impl WalWriter {
    /// Open the log for appending, creating it if absent.
    pub(crate) fn open(
        path: &Path,
        write_buffer_size: usize,
        compression: bool,
    ) -> EngineResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            file: BufWriter::with_capacity(write_buffer_size, file),
            compression,
            len,
        })
    }

    /// Append one record. With `sync`, the record is on stable storage before
    /// this returns; without it, the record is handed to the OS.
    pub(crate) fn append(&mut self, record: &LogRecord, sync: bool) -> EngineResult<()> {
        let frame = encode_frame(record, self.compression)?;
        self.file.write_all(&frame)?;
        self.file.flush()?;
        if sync {
            self.file.get_ref().sync_data()?;
        }
        self.len += frame.len() as u64;
        Ok(())
    }

    /// Flush and sync everything written so far.
    pub(crate) fn sync(&mut self) -> EngineResult<()> {
        self.file.flush()?;
        self.file.get_ref().sync_data()?;
        Ok(())
    }

    /// Current log length in bytes.
    pub(crate) fn len(&self) -> u64 {
        self.len
    }
}
