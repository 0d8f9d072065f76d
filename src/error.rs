//! Error types for StowKV
//!
//! Provides a unified error type for all operations. Recoverable damage found
//! while scanning a log is not an error; see [`crate::log::ScanWarning`].

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using StowError
pub type Result<T> = std::result::Result<T, StowError>;

/// Unified error type for StowKV operations
#[derive(Debug, Error)]
pub enum StowError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Compaction could not swap the rewritten file in; the original is untouched.
    #[error("could not replace {path:?} with its compacted copy: {source}")]
    AtomicReplace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Load Errors (no handle is produced)
    // -------------------------------------------------------------------------
    #[error("store file not found: {0:?}")]
    NotFound(PathBuf),

    #[error("not a StowKV store file (header starts with {found:?})")]
    BadMagic { found: Vec<u8> },

    #[error("incompatible file format version (got: v{found}, can handle: v{supported})")]
    IncompatibleFormat { found: u16, supported: u16 },

    #[error("incompatible codec version (got: v{found}, requires: v{required})")]
    IncompatibleCodec { found: u16, required: u16 },

    // -------------------------------------------------------------------------
    // Per-call Errors
    // -------------------------------------------------------------------------
    #[error("Key not found")]
    KeyNotFound,

    #[error("store is empty")]
    Empty,

    #[error("checksum mismatch for value at offset {offset}")]
    ChecksumMismatch { offset: u64 },

    #[error("keys must not be empty")]
    EmptyKey,

    #[error("{what} of {len} bytes exceeds the record format limit")]
    TooLarge { what: &'static str, len: usize },

    #[error("store handle is closed")]
    Closed,

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Codec error: {0}")]
    Codec(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("invalid open mode {0:?}, expected one of 'r', 'w', 'c' or 'n'")]
    InvalidMode(String),

    #[error("cannot copy a store onto its own file {0:?}")]
    CopyOntoSelf(PathBuf),
}

impl From<bincode::Error> for StowError {
    fn from(e: bincode::Error) -> Self {
        StowError::Codec(e.to_string())
    }
}
