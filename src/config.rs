//! Configuration for StowKV
//!
//! Open options with sensible defaults, plus the open modes a store file can
//! be opened in.

use std::fmt;
use std::str::FromStr;

use crate::error::StowError;

/// Options applied to a store handle when it is opened
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Integrity Configuration
    // -------------------------------------------------------------------------
    /// Verify record checksums while scanning the log on open and on every
    /// value read. Corrupted records are skipped on open; a corrupted value
    /// read later fails with `ChecksumMismatch`.
    pub verify_checksums: bool,

    /// Compact a writable store whose scan reported damage right after open,
    /// so new appends never sit behind an unreadable region.
    pub repair_on_open: bool,

    // -------------------------------------------------------------------------
    // Lifecycle Configuration
    // -------------------------------------------------------------------------
    /// Compact a writable store before it is closed
    pub compact_on_close: bool,

    /// When appended records are forced to disk
    pub sync_strategy: SyncStrategy,
}

/// Sync strategy for appended records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync only on explicit `sync()` and on close
    OnClose,

    /// fsync after every append (safest, slowest)
    EveryWrite,

    /// fsync after N appends
    EveryNWrites { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verify_checksums: false,
            repair_on_open: false,
            compact_on_close: false,
            sync_strategy: SyncStrategy::OnClose,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Verify checksums on open and on every read
    pub fn verify_checksums(mut self, enabled: bool) -> Self {
        self.config.verify_checksums = enabled;
        self
    }

    /// Compact writable stores whose log was found damaged on open
    pub fn repair_on_open(mut self, enabled: bool) -> Self {
        self.config.repair_on_open = enabled;
        self
    }

    /// Compact writable stores when they are closed
    pub fn compact_on_close(mut self, enabled: bool) -> Self {
        self.config.compact_on_close = enabled;
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

// =============================================================================
// Open Modes
// =============================================================================

/// How a store file is opened, using the classic dbm flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// `r`: existing file, reads only
    ReadOnly,
    /// `w`: existing file, reads and writes
    ReadWrite,
    /// `c`: reads and writes, file created if missing
    Create,
    /// `n`: reads and writes, always starting from an empty file
    New,
}

/// The open modes that yield a writable store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Fail with `NotFound` if the file is absent
    Existing,
    /// Write a fresh header if the file is absent, otherwise scan it
    Create,
    /// Remove any existing file first
    New,
}

impl OpenMode {
    /// The writable variant of this mode, `None` for read-only
    pub fn write_mode(self) -> Option<WriteMode> {
        match self {
            OpenMode::ReadOnly => None,
            OpenMode::ReadWrite => Some(WriteMode::Existing),
            OpenMode::Create => Some(WriteMode::Create),
            OpenMode::New => Some(WriteMode::New),
        }
    }

    pub fn as_flag(self) -> &'static str {
        match self {
            OpenMode::ReadOnly => "r",
            OpenMode::ReadWrite => "w",
            OpenMode::Create => "c",
            OpenMode::New => "n",
        }
    }
}

impl From<WriteMode> for OpenMode {
    fn from(mode: WriteMode) -> Self {
        match mode {
            WriteMode::Existing => OpenMode::ReadWrite,
            WriteMode::Create => OpenMode::Create,
            WriteMode::New => OpenMode::New,
        }
    }
}

impl FromStr for OpenMode {
    type Err = StowError;

    fn from_str(flag: &str) -> Result<Self, Self::Err> {
        match flag {
            "r" => Ok(OpenMode::ReadOnly),
            "w" => Ok(OpenMode::ReadWrite),
            "c" => Ok(OpenMode::Create),
            "n" => Ok(OpenMode::New),
            other => Err(StowError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_flag())
    }
}
