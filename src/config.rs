//! Configuration for stratakv
//!
//! Open-time options with sensible defaults, plus the per-call read and write
//! options. Validation happens before any engine resource is created.

use std::fmt;
use std::sync::Arc;

use crate::comparator::{BytewiseComparator, Comparator, ComparatorRef};
use crate::error::{Error, Result};

/// Open-time options for a database handle.
///
/// Numeric tuning fields mirror the engine seam: the bundled log engine
/// consumes `write_buffer_size`, `compression`, `paranoid_checks` and
/// `max_file_size`; block-geometry fields are validated here and handed to
/// engines that page data in blocks.
#[derive(Clone)]
pub struct Options {
    // -------------------------------------------------------------------------
    // Open Behavior
    // -------------------------------------------------------------------------
    /// Create the database if none exists at the path.
    pub create_if_missing: bool,

    /// Fail `open` if a database already exists at the path.
    pub error_if_exists: bool,

    /// Treat any detected corruption as fatal instead of best-effort.
    pub paranoid_checks: bool,

    // -------------------------------------------------------------------------
    // Engine Tuning
    // -------------------------------------------------------------------------
    /// Buffer size for the engine's write path (bytes).
    pub write_buffer_size: usize,

    /// Unit of transfer for block-structured engines (bytes).
    pub block_size: usize,

    /// Maximum number of files the engine may hold open.
    pub max_open_files: usize,

    /// Keys between restart points in a block.
    pub block_restart_interval: usize,

    /// Maximum block cache size (bytes). Zero disables the cache.
    pub block_cache_size: usize,

    /// Maximum size of one storage file before the engine rolls it over
    /// (the bundled engine compacts its log past this size).
    pub max_file_size: usize,

    /// Compress stored records.
    pub compression: bool,

    // -------------------------------------------------------------------------
    // Ordering
    // -------------------------------------------------------------------------
    /// Total order over keys, used for sorting and range-scan bound checks.
    pub comparator: ComparatorRef,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            error_if_exists: false,
            paranoid_checks: false,
            write_buffer_size: 4 * 1024 * 1024,
            block_size: 4096,
            max_open_files: 1000,
            block_restart_interval: 16,
            block_cache_size: 16 * 1024 * 1024,
            max_file_size: 2 * 1024 * 1024,
            compression: true,
            comparator: Arc::new(BytewiseComparator),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("create_if_missing", &self.create_if_missing)
            .field("error_if_exists", &self.error_if_exists)
            .field("paranoid_checks", &self.paranoid_checks)
            .field("write_buffer_size", &self.write_buffer_size)
            .field("block_size", &self.block_size)
            .field("max_open_files", &self.max_open_files)
            .field("block_restart_interval", &self.block_restart_interval)
            .field("block_cache_size", &self.block_cache_size)
            .field("max_file_size", &self.max_file_size)
            .field("compression", &self.compression)
            .field("comparator", &self.comparator.name())
            .finish()
    }
}

impl Options {
    /// Create a new options builder
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::default()
    }

    /// Reject nonsensical tuning values before the engine is touched.
    ///
    /// Sizes are unsigned here, so the out-of-range check is for zero where
    /// zero cannot mean anything (a zero-byte write buffer, a zero-byte
    /// block). `block_cache_size == 0` is allowed: it disables the cache.
    pub fn validate(&self) -> Result<()> {
        if self.write_buffer_size == 0 {
            return Err(Error::Config("write_buffer_size must be non-zero".into()));
        }
        if self.block_size == 0 {
            return Err(Error::Config("block_size must be non-zero".into()));
        }
        if self.max_open_files == 0 {
            return Err(Error::Config("max_open_files must be non-zero".into()));
        }
        if self.block_restart_interval == 0 {
            return Err(Error::Config(
                "block_restart_interval must be non-zero".into(),
            ));
        }
        if self.max_file_size == 0 {
            return Err(Error::Config("max_file_size must be non-zero".into()));
        }
        Ok(())
    }
}

/// Builder for Options
#[derive(Default)]
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    pub fn create_if_missing(mut self, yes: bool) -> Self {
        self.options.create_if_missing = yes;
        self
    }

    pub fn error_if_exists(mut self, yes: bool) -> Self {
        self.options.error_if_exists = yes;
        self
    }

    pub fn paranoid_checks(mut self, yes: bool) -> Self {
        self.options.paranoid_checks = yes;
        self
    }

    pub fn write_buffer_size(mut self, bytes: usize) -> Self {
        self.options.write_buffer_size = bytes;
        self
    }

    pub fn block_size(mut self, bytes: usize) -> Self {
        self.options.block_size = bytes;
        self
    }

    pub fn max_open_files(mut self, count: usize) -> Self {
        self.options.max_open_files = count;
        self
    }

    pub fn block_restart_interval(mut self, count: usize) -> Self {
        self.options.block_restart_interval = count;
        self
    }

    pub fn block_cache_size(mut self, bytes: usize) -> Self {
        self.options.block_cache_size = bytes;
        self
    }

    pub fn max_file_size(mut self, bytes: usize) -> Self {
        self.options.max_file_size = bytes;
        self
    }

    pub fn compression(mut self, yes: bool) -> Self {
        self.options.compression = yes;
        self
    }

    pub fn comparator(mut self, comparator: Arc<dyn Comparator>) -> Self {
        self.options.comparator = comparator;
        self
    }

    pub fn build(self) -> Options {
        self.options
    }
}

/// Per-call read options.
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    /// Check stored checksums on everything read for this call.
    pub verify_checksums: bool,

    /// Let data read by this call populate the block cache.
    pub fill_cache: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            verify_checksums: false,
            fill_cache: true,
        }
    }
}

/// Per-call write options.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Guarantee the mutation is flushed to stable storage before returning.
    pub sync: bool,
}

impl WriteOptions {
    /// Durable-write options (`sync = true`).
    pub fn durable() -> Self {
        Self { sync: true }
    }
}
