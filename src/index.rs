//! In-memory index
//!
//! Maps each live key to the location of its most recent value in the log.
//!
//! ## Responsibilities
//! - O(1) lookups by raw key bytes
//! - Iteration in insertion order, so the newest live entry is always last
//! - Rebuilt from the log on every open; never persisted
//!
//! Overwriting a key keeps its position; deleting it and writing it again
//! moves it to the end. Replaying the log reproduces the same order.

use indexmap::map;
use indexmap::IndexMap;

/// Where a value lives in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Absolute file offset of the first value byte
    pub offset: u64,

    /// Value length in bytes
    pub size: u32,
}

/// Ordered key → location map
#[derive(Debug, Default, Clone)]
pub struct Index {
    entries: IndexMap<Vec<u8>, Location>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &[u8]) -> Option<Location> {
        self.entries.get(key).copied()
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }

    /// Point `key` at a new location, returning the previous one
    pub fn insert(&mut self, key: Vec<u8>, location: Location) -> Option<Location> {
        self.entries.insert(key, location)
    }

    /// Remove `key`, keeping the relative order of the remaining entries
    pub fn remove(&mut self, key: &[u8]) -> Option<Location> {
        self.entries.shift_remove(key)
    }

    /// Most recently inserted live entry
    pub fn last(&self) -> Option<(&[u8], Location)> {
        self.entries
            .last()
            .map(|(key, location)| (key.as_slice(), *location))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> Keys<'_> {
        Keys {
            inner: self.entries.keys(),
        }
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&[u8], Location)> + '_ {
        self.entries.iter().map(|(k, l)| (k.as_slice(), *l))
    }
}

/// Iterator over index keys in insertion order
#[derive(Debug, Clone)]
pub struct Keys<'a> {
    inner: map::Keys<'a, Vec<u8>, Location>,
}

impl<'a> Iterator for Keys<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Vec::as_slice)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Keys<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(Vec::as_slice)
    }
}

impl ExactSizeIterator for Keys<'_> {}
