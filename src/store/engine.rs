//! Store engine
//!
//! The state behind every store handle: the open log, the index rebuilt from
//! it, and the codec values are encoded with.
//!
//! ## Responsibilities
//! - Apply the open mode (existence checks, truncation, fresh headers)
//! - Keep the index in step with every append
//! - Compact into a sibling file and swap it in
//! - Release the file exactly once, on close or drop

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::codec::Codec;
use crate::compaction::{self, CompactionStats};
use crate::config::{Config, OpenMode};
use crate::error::{Result, StowError};
use crate::index::{Index, Location};
use crate::log::{scan_file, AppendLog, Header, Record, ScanReport, MAX_VALUE_SIZE};

/// Shared core of `Store` and `ReadOnlyStore`
///
/// `log` is `None` once the engine has been shut down, or if reopening the
/// file after a failed compaction swap also failed. Every operation that
/// touches the file then reports `Closed`.
#[derive(Debug)]
pub struct Engine<C> {
    path: PathBuf,
    log: Option<AppendLog>,
    index: Index,
    codec: C,
    config: Config,
    report: ScanReport,
    writable: bool,
}

impl<C: Codec> Engine<C> {
    /// Open the file at `path` according to `mode`
    ///
    /// 1. `r`/`w` require the file to exist; `n` removes it
    /// 2. A missing file gets a fresh header
    /// 3. An existing file has its header validated and is scanned; a
    ///    writable handle cuts off any unreadable tail the scan stopped at
    /// 4. With `repair_on_open`, a damaged writable file is compacted at once
    pub(crate) fn open(path: &Path, mode: OpenMode, config: Config, codec: C) -> Result<Self> {
        let path = path.to_path_buf();

        match mode {
            OpenMode::ReadOnly | OpenMode::ReadWrite if !path.is_file() => {
                return Err(StowError::NotFound(path));
            }
            OpenMode::New => compaction::remove_if_exists(&path)?,
            _ => {}
        }

        let writable = mode != OpenMode::ReadOnly;

        let (log, index, report) = if path.exists() {
            let (_, index, report) = scan_file(&path, &codec, config.verify_checksums)?;
            // New records must start where the readable data ends
            let log = if writable {
                AppendLog::open_truncated(&path, config.sync_strategy, report.scanned_bytes)?
            } else {
                AppendLog::open_read_only(&path)?
            };
            (log, index, report)
        } else {
            let header = Header::new(codec.version());
            let log = AppendLog::create(&path, &header, config.sync_strategy)?;
            (log, Index::new(), ScanReport::empty())
        };

        debug!(
            path = %path.display(),
            mode = %mode,
            entries = index.len(),
            "opened store"
        );

        let mut engine = Self {
            path,
            log: Some(log),
            index,
            codec,
            config,
            report,
            writable,
        };

        if writable && engine.config.repair_on_open && !engine.report.is_clean() {
            info!(
                path = %engine.path.display(),
                warnings = engine.report.warnings.len(),
                "repairing damaged store file"
            );
            engine.compact()?;
        }

        Ok(engine)
    }

    fn log(&self) -> Result<&AppendLog> {
        self.log.as_ref().ok_or(StowError::Closed)
    }

    fn log_mut(&mut self) -> Result<&mut AppendLog> {
        self.log.as_mut().ok_or(StowError::Closed)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub(crate) fn get_raw(&self, key: &[u8]) -> Result<Vec<u8>> {
        let location = self.index.get(key).ok_or(StowError::KeyNotFound)?;
        self.read_at(key, location)
    }

    pub(crate) fn read_at(&self, key: &[u8], location: Location) -> Result<Vec<u8>> {
        self.log()?
            .read_value(key, location, self.config.verify_checksums)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    pub(crate) fn set_raw(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        check_key(key)?;
        if value.len() > MAX_VALUE_SIZE {
            return Err(StowError::TooLarge {
                what: "value",
                len: value.len(),
            });
        }

        let offset = self.log_mut()?.append(&Record::data(key, value))?;
        self.index.insert(
            key.to_vec(),
            Location {
                offset,
                size: value.len() as u32,
            },
        );
        Ok(())
    }

    pub(crate) fn delete_raw(&mut self, key: &[u8]) -> Result<()> {
        if !self.index.contains(key) {
            return Err(StowError::KeyNotFound);
        }

        self.log_mut()?.append(&Record::tombstone(key))?;
        self.index.remove(key);
        Ok(())
    }

    pub(crate) fn sync(&mut self) -> Result<()> {
        self.log_mut()?.sync()
    }

    // =========================================================================
    // Compaction
    // =========================================================================

    /// Rewrite live entries into a sibling file and swap it in
    pub(crate) fn compact(&mut self) -> Result<CompactionStats> {
        let sibling = compaction::sibling_path(&self.path);
        let bytes_before = self.log()?.end_offset();

        let rewritten = match compaction::rewrite(
            self.log()?,
            &self.index,
            &sibling,
            self.codec.version(),
            self.config.verify_checksums,
        ) {
            Ok(index) => index,
            Err(e) => {
                // The original file was never touched
                let _ = compaction::remove_if_exists(&sibling);
                return Err(e);
            }
        };

        // The handle on the original must be gone before the rename
        self.log = None;

        if let Err(e) = compaction::replace(&sibling, &self.path) {
            let _ = compaction::remove_if_exists(&sibling);
            match AppendLog::open(&self.path, self.config.sync_strategy) {
                Ok(log) => self.log = Some(log),
                Err(reopen) => warn!(
                    path = %self.path.display(),
                    error = %reopen,
                    "could not reopen store after failed compaction"
                ),
            }
            return Err(e);
        }

        let log = AppendLog::open(&self.path, self.config.sync_strategy)?;
        let stats = CompactionStats {
            bytes_before,
            bytes_after: log.end_offset(),
            live_entries: rewritten.len(),
        };

        self.index = rewritten;
        self.log = Some(log);
        self.report = ScanReport {
            records_read: stats.live_entries as u64,
            scanned_bytes: stats.bytes_after,
            file_size: stats.bytes_after,
            ..ScanReport::default()
        };

        info!(
            path = %self.path.display(),
            before = stats.bytes_before,
            after = stats.bytes_after,
            live = stats.live_entries,
            "compacted store"
        );

        Ok(stats)
    }

    /// Write the live entries to a new store file at `dest` and open it.
    ///
    /// Any file already at `dest` is replaced.
    pub(crate) fn copy_to(&self, dest: &Path) -> Result<Self>
    where
        C: Clone,
    {
        if same_file(&self.path, dest) {
            return Err(StowError::CopyOntoSelf(dest.to_path_buf()));
        }

        let index = compaction::rewrite(
            self.log()?,
            &self.index,
            dest,
            self.codec.version(),
            self.config.verify_checksums,
        )?;

        let log = AppendLog::open(dest, self.config.sync_strategy)?;
        let size = log.end_offset();

        debug!(from = %self.path.display(), to = %dest.display(), entries = index.len(), "copied store");

        Ok(Self {
            path: dest.to_path_buf(),
            log: Some(log),
            report: ScanReport {
                records_read: index.len() as u64,
                scanned_bytes: size,
                file_size: size,
                ..ScanReport::default()
            },
            index,
            codec: self.codec.clone(),
            config: self.config.clone(),
            writable: true,
        })
    }

    /// Release the file, compacting and syncing first when writable.
    ///
    /// Calling this again after it succeeded is a no-op.
    pub(crate) fn shutdown(&mut self, compact: bool) -> Result<()> {
        if self.log.is_none() {
            return Ok(());
        }

        if self.writable {
            if compact || self.config.compact_on_close {
                self.compact()?;
            }
            self.sync()?;
        }

        self.log = None;
        debug!(path = %self.path.display(), "closed store");
        Ok(())
    }

    /// `shutdown` for drop paths, where errors can only be logged
    pub(crate) fn shutdown_quietly(&mut self) {
        if let Err(e) = self.shutdown(false) {
            warn!(path = %self.path.display(), error = %e, "failed to close store cleanly");
            self.log = None;
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub(crate) fn index(&self) -> &Index {
        &self.index
    }

    pub(crate) fn codec(&self) -> &C {
        &self.codec
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn report(&self) -> &ScanReport {
        &self.report
    }

    pub(crate) fn file_size(&self) -> Result<u64> {
        Ok(self.log()?.end_offset())
    }

    pub(crate) fn is_open(&self) -> bool {
        self.log.is_some()
    }
}

fn check_key(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(StowError::EmptyKey);
    }
    if u32::try_from(key.len()).is_err() {
        return Err(StowError::TooLarge {
            what: "key",
            len: key.len(),
        });
    }
    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
