//! Append log
//!
//! Owns the open data file and the offset of its end. Records are only ever
//! appended; values are read back with positioned reads.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::SyncStrategy;
use crate::error::{Result, StowError};
use crate::index::Location;

use super::{verify_checksum, Header, Record, CHECKSUM_SIZE, HEADER_SIZE};

/// The open data file of a store
///
/// Writable logs are opened in append mode, so every write lands at the end
/// of the file no matter where reads left the cursor.
#[derive(Debug)]
pub struct AppendLog {
    file: File,
    path: PathBuf,
    /// Offset one past the last byte written
    end_offset: u64,
    sync_strategy: SyncStrategy,
    /// Appends since the last fsync
    unsynced: usize,
}

impl AppendLog {
    /// Create a new file holding only `header`. Fails if the file exists.
    pub fn create(path: &Path, header: &Header, sync_strategy: SyncStrategy) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create_new(true)
            .open(path)?;

        file.write_all(&header.encode())?;
        file.sync_all()?;

        debug!(path = %path.display(), "created store file");

        Ok(Self {
            file,
            path: path.to_path_buf(),
            end_offset: HEADER_SIZE as u64,
            sync_strategy,
            unsynced: 0,
        })
    }

    /// Open an existing file for reading and appending
    pub fn open(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let file = OpenOptions::new().read(true).append(true).open(path)?;
        Self::from_file(file, path, sync_strategy)
    }

    /// Open an existing file for appending, cutting it back to `valid_len`.
    ///
    /// Bytes past `valid_len` are an unreadable tail left by an interrupted
    /// write. Appending after them would hide every new record behind the
    /// fragment on the next scan.
    pub fn open_truncated(
        path: &Path,
        sync_strategy: SyncStrategy,
        valid_len: u64,
    ) -> Result<Self> {
        let file = OpenOptions::new().read(true).append(true).open(path)?;
        let len = file.metadata()?.len();

        if valid_len < len {
            file.set_len(valid_len)?;
            file.sync_all()?;
            warn!(
                path = %path.display(),
                discarded = len - valid_len,
                "discarded unreadable tail of store file"
            );
        }

        Self::from_file(file, path, sync_strategy)
    }

    /// Open an existing file for reading only
    pub fn open_read_only(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_file(file, path, SyncStrategy::OnClose)
    }

    fn from_file(file: File, path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let end_offset = file.metadata()?.len();
        Ok(Self {
            file,
            path: path.to_path_buf(),
            end_offset,
            sync_strategy,
            unsynced: 0,
        })
    }

    /// Append a record, returning the absolute offset of its value bytes
    pub fn append(&mut self, record: &Record<'_>) -> Result<u64> {
        let bytes = record.encode();
        let value_offset = self.end_offset + record.value_offset() as u64;

        if let Err(e) = self.file.write_all(&bytes) {
            self.discard_partial_write();
            return Err(e.into());
        }
        self.end_offset += bytes.len() as u64;
        self.unsynced += 1;

        let strategy = self.sync_strategy;
        match strategy {
            SyncStrategy::EveryWrite => self.sync()?,
            SyncStrategy::EveryNWrites { count } if self.unsynced >= count => self.sync()?,
            _ => {}
        }

        Ok(value_offset)
    }

    /// Drop whatever part of a failed append reached the file, so the next
    /// append starts at `end_offset` again
    fn discard_partial_write(&mut self) {
        if let Err(e) = self.file.set_len(self.end_offset) {
            warn!(path = %self.path.display(), error = %e, "could not discard partial record");
            if let Ok(metadata) = self.file.metadata() {
                self.end_offset = metadata.len();
            }
        }
    }

    /// Read the value at `location`.
    ///
    /// With `verify` set, the trailing checksum is read as well and checked
    /// against `key` and the value.
    pub fn read_value(&self, key: &[u8], location: Location, verify: bool) -> Result<Vec<u8>> {
        let size = location.size as usize;
        let len = if verify { size + CHECKSUM_SIZE } else { size };

        let mut buf = vec![0u8; len];
        let mut file = &self.file;
        file.seek(SeekFrom::Start(location.offset))?;
        file.read_exact(&mut buf)?;

        if verify {
            let stored = u32::from_be_bytes([buf[size], buf[size + 1], buf[size + 2], buf[size + 3]]);
            buf.truncate(size);

            if !verify_checksum(key, &buf, stored) {
                return Err(StowError::ChecksumMismatch {
                    offset: location.offset,
                });
            }
        }

        Ok(buf)
    }

    /// Force everything written so far to durable storage
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        self.unsynced = 0;
        Ok(())
    }

    pub fn end_offset(&self) -> u64 {
        self.end_offset
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
