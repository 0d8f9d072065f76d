//! Append Log Module
//!
//! The single data file behind a store: a versioned header followed by an
//! append-only sequence of records.
//!
//! ## Responsibilities
//! - Encode data and tombstone records with CRC32 checksums
//! - Append records at the end of the file and report where values land
//! - Rebuild the in-memory index by scanning the file on open
//! - Tolerate partial writes and corrupted records while scanning
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Header (8 bytes)                                             │
//! │   Magic: "STOW" (4) | FormatVersion: u16 | CodecVersion: u16 │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Record 1                                                     │
//! │ ┌──────────┬──────────┬───────┬─────────┬─────────────┐      │
//! │ │KeySize(4)│ValSize(4)│  Key  │  Value  │ Checksum(4) │      │
//! │ └──────────┴──────────┴───────┴─────────┴─────────────┘      │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Record 2 ...                                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are big-endian. A tombstone has `ValSize = u32::MAX` and no
//! value bytes; its checksum covers the key alone.

mod header;
mod record;
mod scanner;
mod writer;

pub use header::{Header, FORMAT_VERSION, HEADER_SIZE, MAGIC};
pub use record::{
    checksum, verify_checksum, Record, RecordError, RecordHeader, CHECKSUM_SIZE,
    MAX_VALUE_SIZE, SIZE_FIELDS_LEN, TOMBSTONE,
};
pub use scanner::{check, scan, scan_file, ScanReport, ScanWarning};
pub use writer::AppendLog;
