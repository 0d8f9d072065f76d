//! Tests for recovery from damaged store files
//!
//! These tests verify:
//! - Truncated tails are dropped and reported, earlier records survive
//! - Writes made after reopening a damaged file are not lost
//! - Corrupted records are skipped on open when verification is enabled
//! - Corruption after open surfaces as ChecksumMismatch on read
//! - Disabling verification returns the stored bytes as they are
//! - repair_on_open compacts the damage away

use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;

use stowkv::{Config, ReadAccess, ReadOnlyStore, ScanWarning, Store, StowError, WriteMode};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_three_records() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.stow");

    let mut store = Store::open(&path, WriteMode::New, Config::default()).unwrap();
    store.update([("one", "1"), ("two", "2"), ("three", "3")]).unwrap();
    store.close().unwrap();

    (temp_dir, path)
}

fn truncate_by(path: &PathBuf, bytes: u64) {
    let file = OpenOptions::new().write(true).open(path).unwrap();
    let len = file.metadata().unwrap().len();
    file.set_len(len - bytes).unwrap();
}

fn flip_byte(path: &PathBuf, offset: u64) {
    let mut data = fs::read(path).unwrap();
    data[offset as usize] ^= 0x01;
    let mut file = OpenOptions::new().write(true).open(path).unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();
    file.write_all(&data).unwrap();
    file.sync_all().unwrap();
}

fn verified() -> Config {
    Config::builder().verify_checksums(true).build()
}

/// Offset of the value of the second record ("two" -> "2")
fn second_value_offset() -> u64 {
    let first_record = 8 + 3 + 1 + 4;
    (8 + first_record + 8 + 3) as u64
}

// =============================================================================
// Truncation Tests
// =============================================================================

#[test]
fn test_truncated_tail_recovers_prefix() {
    let (_temp, path) = setup_three_records();
    truncate_by(&path, 8);

    let store = ReadOnlyStore::open(&path, Config::default()).unwrap();

    assert_eq!(store.keys::<String>().unwrap(), vec!["one", "two"]);
    assert!(store.report().was_truncated());
    assert!(matches!(
        store.report().warnings.as_slice(),
        [ScanWarning::MissingTail { .. }]
    ));
}

#[test]
fn test_writes_after_truncated_tail_survive_reopen() {
    let (_temp, path) = setup_three_records();
    truncate_by(&path, 8);

    let mut store = Store::open(&path, WriteMode::Existing, Config::default()).unwrap();
    store.set("four", "4").unwrap();
    store.set("five", "5").unwrap();
    store.close().unwrap();

    let store = ReadOnlyStore::open(&path, Config::default()).unwrap();
    assert!(store.report().is_clean());
    assert_eq!(
        store.keys::<String>().unwrap(),
        vec!["one", "two", "four", "five"]
    );
    assert_eq!(store.get::<_, String>("four").unwrap(), "4");
    assert_eq!(store.get::<_, String>("five").unwrap(), "5");
}

#[test]
fn test_writable_open_cuts_unreadable_tail() {
    let (_temp, path) = setup_three_records();
    let size = fs::metadata(&path).unwrap().len();
    truncate_by(&path, 8);

    let store = Store::open(&path, WriteMode::Existing, Config::default()).unwrap();

    assert!(store.report().was_truncated());
    assert_eq!(store.file_size().unwrap(), size - 18);
    assert_eq!(fs::metadata(&path).unwrap().len(), size - 18);
}

#[test]
fn test_writes_after_zero_key_region_survive_reopen() {
    let (_temp, path) = setup_three_records();
    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&[0u8; 12]).unwrap();
    drop(file);

    let mut store = Store::open(&path, WriteMode::Existing, Config::default()).unwrap();
    assert!(matches!(
        store.report().warnings.as_slice(),
        [ScanWarning::ZeroKeySize { .. }]
    ));
    store.set("four", "4").unwrap();
    store.close().unwrap();

    let store = ReadOnlyStore::open(&path, Config::default()).unwrap();
    assert!(store.report().is_clean());
    assert_eq!(store.len(), 4);
    assert_eq!(store.get::<_, String>("four").unwrap(), "4");
}

#[test]
fn test_read_only_open_leaves_damaged_file_alone() {
    let (_temp, path) = setup_three_records();
    truncate_by(&path, 8);
    let size = fs::metadata(&path).unwrap().len();

    let store = ReadOnlyStore::open(&path, Config::default()).unwrap();
    store.close().unwrap();

    assert_eq!(fs::metadata(&path).unwrap().len(), size);
}

#[test]
fn test_truncated_header_fails_open() {
    let (_temp, path) = setup_three_records();
    let data = fs::read(&path).unwrap();
    fs::write(&path, &data[..5]).unwrap();

    let result = ReadOnlyStore::open(&path, Config::default());
    assert!(matches!(result, Err(StowError::BadMagic { .. })));
}

// =============================================================================
// Corruption On Disk Tests
// =============================================================================

#[test]
fn test_corrupted_record_skipped_on_open() {
    let (_temp, path) = setup_three_records();
    flip_byte(&path, second_value_offset());

    let store = ReadOnlyStore::open(&path, verified()).unwrap();

    assert_eq!(store.keys::<String>().unwrap(), vec!["one", "three"]);
    assert_eq!(store.report().records_corrupted, 1);
    assert!(!store.report().was_truncated());
}

#[test]
fn test_corrupted_record_compacted_away() {
    let (_temp, path) = setup_three_records();
    flip_byte(&path, second_value_offset());
    let size_before = fs::metadata(&path).unwrap().len();

    let mut store = Store::open(&path, WriteMode::Existing, verified()).unwrap();
    assert_eq!(store.len(), 2);
    store.compact().unwrap();
    store.close().unwrap();

    assert!(fs::metadata(&path).unwrap().len() < size_before);
    let store = ReadOnlyStore::open(&path, verified()).unwrap();
    assert!(store.report().is_clean());
    assert_eq!(store.get::<_, String>("three").unwrap(), "3");
}

#[test]
fn test_corruption_ignored_without_verification() {
    let (_temp, path) = setup_three_records();
    flip_byte(&path, second_value_offset());

    let config = Config::builder().verify_checksums(false).build();
    let store = ReadOnlyStore::open(&path, config).unwrap();

    assert!(store.report().is_clean());
    assert_eq!(store.get::<_, String>("two").unwrap(), "3");
}

#[test]
fn test_repair_on_open() {
    let (_temp, path) = setup_three_records();
    truncate_by(&path, 3);

    let config = Config::builder().repair_on_open(true).build();
    let store = Store::open(&path, WriteMode::Existing, config).unwrap();

    assert_eq!(store.len(), 2);
    assert!(store.report().is_clean());
    store.close().unwrap();

    let expected = 8 + (8 + 3 + 1 + 4) + (8 + 3 + 1 + 4);
    assert_eq!(fs::metadata(&path).unwrap().len(), expected);
}

// =============================================================================
// Corruption While Open Tests
// =============================================================================

#[test]
fn test_get_detects_corruption_after_open() {
    let (_temp, path) = setup_three_records();
    let store = ReadOnlyStore::open(&path, verified()).unwrap();

    flip_byte(&path, second_value_offset());

    let result = store.get::<_, String>("two");
    assert!(matches!(
        result,
        Err(StowError::ChecksumMismatch { offset }) if offset == second_value_offset()
    ));
    assert_eq!(store.get::<_, String>("one").unwrap(), "1");
}

#[test]
fn test_get_without_verification_returns_flipped_bytes() {
    let (_temp, path) = setup_three_records();
    let config = Config::builder().verify_checksums(false).build();
    let store = ReadOnlyStore::open(&path, config).unwrap();

    flip_byte(&path, second_value_offset());

    assert_eq!(store.get_raw(b"two").unwrap(), vec![b'2' ^ 0x01]);
}
