//! # StowKV
//!
//! An embedded, single-file, append-only key-value store with:
//! - Persistent dictionary semantics (get / set / delete / iterate)
//! - CRC32-checked records that tolerate partial writes and corruption
//! - Insertion-ordered iteration, including newest-first
//! - Compaction into a sibling file with an atomic swap
//! - Pluggable serialization of structured values
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │          Store (w/c/n)        │     ReadOnlyStore (r)        │
//! │       writes + ReadAccess     │        ReadAccess            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Engine                                │
//! │           (open modes, compaction, shutdown)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │    Index    │◄─ scan ──│  AppendLog  │
//!   │ (IndexMap)  │          │ (one file)  │
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use stowkv::{Config, ReadAccess, Store, WriteMode};
//!
//! # fn main() -> stowkv::Result<()> {
//! let mut store = Store::open("scores.stow", WriteMode::Create, Config::default())?;
//! store.set("alice", &42u32)?;
//! let score: u32 = store.get("alice")?;
//! assert_eq!(score, 42);
//! store.close()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod log;
pub mod index;
pub mod compaction;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use codec::{BincodeCodec, Codec, Decode, Encode, Object};
pub use compaction::CompactionStats;
pub use config::{Config, OpenMode, SyncStrategy, WriteMode};
pub use error::{Result, StowError};
pub use index::Keys;
pub use log::{ScanReport, ScanWarning};
pub use store::{
    open, open_with_codec, with_extension, Handle, ReadAccess, ReadOnlyStore, Store,
    FILE_EXTENSION,
};

/// Scan the store file at `path` and report damage without opening it
pub fn check(path: impl AsRef<std::path::Path>, verify_checksums: bool) -> Result<ScanReport> {
    log::check(path.as_ref(), &BincodeCodec, verify_checksums)
}

// =============================================================================
// Version Info
// =============================================================================

/// Current version of StowKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
