//! Read operations shared by every store handle

use std::path::Path;

use crate::codec::{Codec, Decode, Encode};
use crate::error::{Result, StowError};
use crate::index::Keys;
use crate::log::ScanReport;

use super::engine::Engine;

/// Lookups and iteration available on read-only and writable handles alike
///
/// Keys and values go through [`Encode`]/[`Decode`]: byte strings and text
/// are stored as-is, numbers as decimal text, and anything wrapped in
/// [`Object`](crate::codec::Object) through the store's codec. Iteration
/// follows insertion order.
pub trait ReadAccess {
    type Codec: Codec;

    #[doc(hidden)]
    fn engine(&self) -> &Engine<Self::Codec>;

    /// Value stored under `key`, or `KeyNotFound`
    fn get<K, V>(&self, key: &K) -> Result<V>
    where
        K: Encode + ?Sized,
        V: Decode,
    {
        let engine = self.engine();
        let key = key.encode(engine.codec())?;
        let bytes = engine.get_raw(&key)?;
        V::decode(&bytes, engine.codec())
    }

    /// Value stored under `key`, or `default` if there is none
    fn get_or<K, V>(&self, key: &K, default: V) -> Result<V>
    where
        K: Encode + ?Sized,
        V: Decode,
    {
        match self.get(key) {
            Err(StowError::KeyNotFound) => Ok(default),
            other => other,
        }
    }

    /// Stored bytes under a raw key, without decoding
    fn get_raw(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.engine().get_raw(key)
    }

    fn contains<K: Encode + ?Sized>(&self, key: &K) -> Result<bool> {
        let engine = self.engine();
        let key = key.encode(engine.codec())?;
        Ok(engine.index().contains(&key))
    }

    fn contains_raw(&self, key: &[u8]) -> bool {
        self.engine().index().contains(key)
    }

    /// Number of live keys
    fn len(&self) -> usize {
        self.engine().index().len()
    }

    fn is_empty(&self) -> bool {
        self.engine().index().is_empty()
    }

    /// Raw live keys in insertion order; `.rev()` walks them newest first
    fn raw_keys(&self) -> Keys<'_> {
        self.engine().index().keys()
    }

    /// All live keys, decoded
    fn keys<K: Decode>(&self) -> Result<Vec<K>> {
        let engine = self.engine();
        engine
            .index()
            .keys()
            .map(|key| K::decode(key, engine.codec()))
            .collect()
    }

    /// All live values, decoded, in key order
    fn values<V: Decode>(&self) -> Result<Vec<V>> {
        let engine = self.engine();
        engine
            .index()
            .iter()
            .map(|(key, location)| {
                let bytes = engine.read_at(key, location)?;
                V::decode(&bytes, engine.codec())
            })
            .collect()
    }

    /// All live `(key, value)` pairs, decoded
    fn items<K: Decode, V: Decode>(&self) -> Result<Vec<(K, V)>> {
        let engine = self.engine();
        engine
            .index()
            .iter()
            .map(|(key, location)| {
                let bytes = engine.read_at(key, location)?;
                Ok((
                    K::decode(key, engine.codec())?,
                    V::decode(&bytes, engine.codec())?,
                ))
            })
            .collect()
    }

    /// Path of the underlying file
    fn path(&self) -> &Path {
        self.engine().path()
    }

    /// What the scan on open (or the last compaction) found
    fn report(&self) -> &ScanReport {
        self.engine().report()
    }

    /// Current size of the underlying file in bytes
    fn file_size(&self) -> Result<u64> {
        self.engine().file_size()
    }
}
