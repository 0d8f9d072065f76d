//! Index scanner
//!
//! Rebuilds the in-memory index by reading the log front to back.
//!
//! ## Recovery Policy
//! Damage found while scanning degrades the index instead of failing the open:
//!
//! | Condition                                  | Action                       |
//! |--------------------------------------------|------------------------------|
//! | size fields, key or value cut off at EOF   | stop, keep what was indexed  |
//! | key size of zero                           | stop, keep what was indexed  |
//! | checksum mismatch (verification enabled)   | skip this record and drop    |
//! |                                            | the key, continue scanning   |
//!
//! Every condition becomes a [`ScanWarning`]. Compacting the store afterwards
//! physically removes the unreadable bytes. Only a bad header or an
//! incompatible version fails the load.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::codec::Codec;
use crate::error::{Result, StowError};
use crate::index::{Index, Location};

use super::{verify_checksum, Header, RecordError, RecordHeader, HEADER_SIZE, SIZE_FIELDS_LEN};

/// Recoverable damage found while scanning
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanWarning {
    /// A record runs past the end of the file (e.g. a write cut short by a crash)
    #[error("data missing at end of file at position {position}/{file_size}, compaction necessary")]
    MissingTail { position: u64, file_size: u64 },

    #[error("zero key size at position {position}/{file_size}, could not continue to read data")]
    ZeroKeySize { position: u64, file_size: u64 },

    /// A record failed checksum verification and was skipped
    #[error("data corrupted at position {position}/{file_size}, compaction necessary")]
    Corrupted { position: u64, file_size: u64 },
}

impl ScanWarning {
    /// Offset of the record the warning refers to
    pub fn position(&self) -> u64 {
        match self {
            ScanWarning::MissingTail { position, .. }
            | ScanWarning::ZeroKeySize { position, .. }
            | ScanWarning::Corrupted { position, .. } => *position,
        }
    }
}

/// Outcome of scanning a log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Data records applied to the index
    pub records_read: u64,

    /// Tombstones applied to the index
    pub tombstones: u64,

    /// Records skipped because their checksum did not match
    pub records_corrupted: u64,

    /// Offset where scanning ended; equals `file_size` unless it stopped early
    pub scanned_bytes: u64,

    /// Total file size including the header
    pub file_size: u64,

    /// Everything that went wrong, in file order
    pub warnings: Vec<ScanWarning>,
}

impl ScanReport {
    /// Report for a file that holds nothing but its header
    pub fn empty() -> Self {
        Self {
            scanned_bytes: HEADER_SIZE as u64,
            file_size: HEADER_SIZE as u64,
            ..Self::default()
        }
    }

    /// No damage found
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Scanning stopped before the end of the file
    pub fn was_truncated(&self) -> bool {
        self.scanned_bytes < self.file_size
    }

    fn record(&mut self, warning: ScanWarning) {
        warn!(%warning, "damaged record in store file");
        self.warnings.push(warning);
    }
}

/// Scan a complete file image (header included) and build its index.
///
/// The header is assumed valid; positions in the report are absolute file
/// offsets.
pub fn scan(data: &[u8], verify_checksums: bool) -> (Index, ScanReport) {
    let file_size = data.len() as u64;
    let mut index = Index::new();
    let mut report = ScanReport {
        file_size,
        ..ScanReport::default()
    };

    let mut cursor = HEADER_SIZE.min(data.len());
    while cursor < data.len() {
        let region = &data[cursor..];
        let position = cursor as u64;

        let header = match RecordHeader::decode(region) {
            Ok(header) => header,
            Err(RecordError::ZeroKeySize) => {
                report.record(ScanWarning::ZeroKeySize { position, file_size });
                break;
            }
            Err(RecordError::Truncated) | Err(RecordError::Overrun { .. }) => {
                report.record(ScanWarning::MissingTail { position, file_size });
                break;
            }
        };

        // decode() guarantees the whole record lies within `region`
        let key_end = header.value_offset() as usize;
        let value_end = key_end + header.payload_len() as usize;
        let record_len = header.record_len() as usize;

        let key = &region[SIZE_FIELDS_LEN..key_end];
        let payload = &region[key_end..value_end];

        if verify_checksums {
            let stored = u32::from_be_bytes([
                region[value_end],
                region[value_end + 1],
                region[value_end + 2],
                region[value_end + 3],
            ]);

            if !verify_checksum(key, payload, stored) {
                // The newest write for this key is unusable, so the key goes too
                index.remove(key);
                report.records_corrupted += 1;
                report.record(ScanWarning::Corrupted { position, file_size });
                cursor += record_len;
                continue;
            }
        }

        if header.is_tombstone() {
            index.remove(key);
            report.tombstones += 1;
        } else {
            index.insert(
                key.to_vec(),
                Location {
                    offset: position + header.value_offset(),
                    size: header.value_size,
                },
            );
            report.records_read += 1;
        }

        cursor += record_len;
    }

    report.scanned_bytes = cursor as u64;
    (index, report)
}

/// Validate the header of the file at `path` and scan it.
///
/// The file is memory-mapped for the duration of the scan only.
pub fn scan_file<C: Codec>(
    path: &Path,
    codec: &C,
    verify_checksums: bool,
) -> Result<(Header, Index, ScanReport)> {
    let file = File::open(path)?;
    let size = file.metadata()?.len();

    if size == 0 {
        return Err(StowError::BadMagic { found: Vec::new() });
    }

    // The store assumes a single writer, so the file does not change under the map
    let mmap = unsafe { Mmap::map(&file)? };

    let header = Header::decode(&mmap)?;
    header.check_codec(codec)?;

    let (index, report) = scan(&mmap, verify_checksums);

    debug!(
        path = %path.display(),
        live = index.len(),
        records = report.records_read,
        tombstones = report.tombstones,
        corrupted = report.records_corrupted,
        scanned = report.scanned_bytes,
        size = report.file_size,
        "scanned store file"
    );

    Ok((header, index, report))
}

/// Scan the file at `path` and report its condition without opening a store
pub fn check<C: Codec>(path: &Path, codec: &C, verify_checksums: bool) -> Result<ScanReport> {
    if !path.is_file() {
        return Err(StowError::NotFound(path.to_path_buf()));
    }

    let (_, _, report) = scan_file(path, codec, verify_checksums)?;
    Ok(report)
}
