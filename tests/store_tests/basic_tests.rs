//! Tests for core store operations
//!
//! These tests verify:
//! - set/get/delete within one handle and across reopen
//! - Typed keys and values (bytes, text, numbers)
//! - Key validation (empty keys)
//! - Insertion-ordered iteration, forwards and backwards

use std::path::PathBuf;

use stowkv::{Config, ReadAccess, ReadOnlyStore, Store, StowError, WriteMode};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_store() -> (TempDir, PathBuf, Store) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.stow");
    let store = Store::open(&path, WriteMode::New, Config::default()).unwrap();
    (temp_dir, path, store)
}

fn reopen(path: &PathBuf) -> ReadOnlyStore {
    ReadOnlyStore::open(path, Config::default()).unwrap()
}

// =============================================================================
// Set / Get Tests
// =============================================================================

#[test]
fn test_set_then_get() {
    let (_temp, _path, mut store) = setup_temp_store();

    store.set("foo", "bar").unwrap();

    let value: String = store.get("foo").unwrap();
    assert_eq!(value, "bar");
    assert_eq!(store.get_raw(b"foo").unwrap(), b"bar");
}

#[test]
fn test_set_persists_across_reopen() {
    let (_temp, path, mut store) = setup_temp_store();
    store.set("foo", "bar").unwrap();
    store.set(b"bin".as_slice(), &[0u8, 255, 7][..]).unwrap();
    store.close().unwrap();

    let store = reopen(&path);
    assert_eq!(store.get::<_, String>("foo").unwrap(), "bar");
    assert_eq!(store.get_raw(b"bin").unwrap(), vec![0u8, 255, 7]);
}

#[test]
fn test_overwrite_returns_newest_value() {
    let (_temp, path, mut store) = setup_temp_store();
    store.set("k", "first").unwrap();
    store.set("k", "second").unwrap();

    assert_eq!(store.get::<_, String>("k").unwrap(), "second");
    assert_eq!(store.len(), 1);
    store.close().unwrap();

    assert_eq!(reopen(&path).get::<_, String>("k").unwrap(), "second");
}

#[test]
fn test_empty_value_round_trips() {
    let (_temp, path, mut store) = setup_temp_store();
    store.set("empty", "").unwrap();
    assert!(store.contains("empty").unwrap());
    store.close().unwrap();

    let store = reopen(&path);
    assert!(store.contains("empty").unwrap());
    assert_eq!(store.get::<_, String>("empty").unwrap(), "");
}

#[test]
fn test_numbers_round_trip() {
    let (_temp, path, mut store) = setup_temp_store();
    store.set(&1u64, &-42i32).unwrap();
    store.set("pi", &3.25f64).unwrap();
    store.close().unwrap();

    let store = reopen(&path);
    assert_eq!(store.get::<_, i32>(&1u64).unwrap(), -42);
    assert_eq!(store.get::<_, f64>("pi").unwrap(), 3.25);
    assert_eq!(store.get_raw(b"1").unwrap(), b"-42");
}

#[test]
fn test_get_missing_key() {
    let (_temp, _path, store) = setup_temp_store();

    let result = store.get::<_, String>("missing");
    assert!(matches!(result, Err(StowError::KeyNotFound)));
}

#[test]
fn test_get_or_default() {
    let (_temp, _path, mut store) = setup_temp_store();
    store.set("present", "yes").unwrap();

    assert_eq!(store.get_or("present", "no".to_string()).unwrap(), "yes");
    assert_eq!(store.get_or("absent", "no".to_string()).unwrap(), "no");
}

#[test]
fn test_empty_key_rejected() {
    let (_temp, _path, mut store) = setup_temp_store();

    let result = store.set("", "value");
    assert!(matches!(result, Err(StowError::EmptyKey)));
    assert!(store.is_empty());
}

#[test]
fn test_wrong_value_type_is_codec_error() {
    let (_temp, _path, mut store) = setup_temp_store();
    store.set("n", "not a number").unwrap();

    let result = store.get::<_, u32>("n");
    assert!(matches!(result, Err(StowError::Codec(_))));
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_delete_removes_key() {
    let (_temp, path, mut store) = setup_temp_store();
    store.set("a", "1").unwrap();
    store.set("b", "2").unwrap();

    store.delete("a").unwrap();
    assert!(!store.contains("a").unwrap());
    assert_eq!(store.len(), 1);
    store.close().unwrap();

    let store = reopen(&path);
    assert!(!store.contains("a").unwrap());
    assert!(store.contains("b").unwrap());
}

#[test]
fn test_delete_missing_key() {
    let (_temp, path, mut store) = setup_temp_store();
    let size_before = store.file_size().unwrap();

    let result = store.delete("missing");
    assert!(matches!(result, Err(StowError::KeyNotFound)));
    assert_eq!(store.file_size().unwrap(), size_before);
    drop(store);

    assert!(reopen(&path).report().is_clean());
}

// =============================================================================
// Iteration Tests
// =============================================================================

#[test]
fn test_keys_follow_insertion_order() {
    let (_temp, _path, mut store) = setup_temp_store();
    store.update([("one", 1), ("two", 2), ("three", 3)]).unwrap();

    let keys: Vec<String> = store.keys().unwrap();
    assert_eq!(keys, vec!["one", "two", "three"]);

    let values: Vec<u32> = store.values().unwrap();
    assert_eq!(values, vec![1, 2, 3]);
}

#[test]
fn test_reinsert_moves_key_to_end() {
    let (_temp, path, mut store) = setup_temp_store();
    store.update([("a", "1"), ("b", "2"), ("c", "3")]).unwrap();
    store.delete("a").unwrap();
    store.set("a", "4").unwrap();
    store.set("b", "5").unwrap();

    let expected = vec!["b".to_string(), "c".to_string(), "a".to_string()];
    assert_eq!(store.keys::<String>().unwrap(), expected);
    store.close().unwrap();

    assert_eq!(reopen(&path).keys::<String>().unwrap(), expected);
}

#[test]
fn test_reverse_iteration() {
    let (_temp, _path, mut store) = setup_temp_store();
    store.update([("one", 1), ("two", 2), ("three", 3)]).unwrap();

    let newest_first: Vec<&[u8]> = store.raw_keys().rev().collect();
    assert_eq!(
        newest_first,
        vec![b"three".as_slice(), b"two".as_slice(), b"one".as_slice()]
    );
}

#[test]
fn test_items() {
    let (_temp, _path, mut store) = setup_temp_store();
    store.update([("x", 10), ("y", 20)]).unwrap();

    let items: Vec<(String, u16)> = store.items().unwrap();
    assert_eq!(items, vec![("x".to_string(), 10), ("y".to_string(), 20)]);
}
