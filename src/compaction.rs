//! Compaction
//!
//! Rewrites the live entries of a store into a sibling file and atomically
//! swaps it in for the original.
//!
//! ## Steps
//! 1. Create `<name>.compact` next to the store with a fresh header
//! 2. Re-append every live value in index order (tombstones, superseded and
//!    skipped records are never carried over)
//! 3. fsync and close the sibling
//! 4. Rename the sibling over the original; the rename is atomic, so a crash
//!    leaves either the old file or the complete new one

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::SyncStrategy;
use crate::error::{Result, StowError};
use crate::index::{Index, Location};
use crate::log::{AppendLog, Header, Record};

/// Sizes observed around one compaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionStats {
    pub bytes_before: u64,
    pub bytes_after: u64,
    pub live_entries: usize,
}

impl CompactionStats {
    pub fn bytes_reclaimed(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }
}

/// Path of the temporary file a compaction writes before the swap
pub fn sibling_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(OsString::new);
    name.push(".compact");
    path.with_file_name(name)
}

/// Write every entry of `index`, read from `source`, into a new file at `dest`.
///
/// Any file already at `dest` is replaced. Returns the index of the new file.
pub fn rewrite(
    source: &AppendLog,
    index: &Index,
    dest: &Path,
    codec_version: u16,
    verify_checksums: bool,
) -> Result<Index> {
    remove_if_exists(dest)?;

    let mut out = AppendLog::create(dest, &Header::new(codec_version), SyncStrategy::OnClose)?;
    let mut rewritten = Index::new();

    for (key, location) in index.iter() {
        let value = source.read_value(key, location, verify_checksums)?;
        let offset = out.append(&Record::data(key, &value))?;
        rewritten.insert(
            key.to_vec(),
            Location {
                offset,
                size: location.size,
            },
        );
    }

    out.sync()?;
    Ok(rewritten)
}

/// Atomically replace `path` with `sibling`
pub fn replace(sibling: &Path, path: &Path) -> Result<()> {
    fs::rename(sibling, path).map_err(|source| StowError::AtomicReplace {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
