//! Writable store handle

use std::path::Path;

use crate::codec::{BincodeCodec, Codec, Decode, Encode};
use crate::compaction::CompactionStats;
use crate::config::{Config, WriteMode};
use crate::error::{Result, StowError};

use super::access::ReadAccess;
use super::engine::Engine;

/// A store opened with mode `w`, `c` or `n`
///
/// Every write appends one record to the file. Dropping the handle closes
/// it the same way [`Store::close`] does, logging any error instead of
/// returning it.
#[derive(Debug)]
pub struct Store<C: Codec = BincodeCodec> {
    engine: Engine<C>,
}

impl Store<BincodeCodec> {
    /// Open a store file for reading and writing
    pub fn open(path: impl AsRef<Path>, mode: WriteMode, config: Config) -> Result<Self> {
        Self::open_with_codec(path, mode, config, BincodeCodec)
    }
}

impl<C: Codec> Store<C> {
    pub fn open_with_codec(
        path: impl AsRef<Path>,
        mode: WriteMode,
        config: Config,
        codec: C,
    ) -> Result<Self> {
        let engine = Engine::open(path.as_ref(), mode.into(), config, codec)?;
        Ok(Self { engine })
    }

    // =========================================================================
    // Core Writes
    // =========================================================================

    /// Store `value` under `key`, replacing any previous value
    pub fn set<K, V>(&mut self, key: &K, value: &V) -> Result<()>
    where
        K: Encode + ?Sized,
        V: Encode + ?Sized,
    {
        let key = key.encode(self.engine.codec())?;
        let value = value.encode(self.engine.codec())?;
        self.engine.set_raw(&key, &value)
    }

    pub fn set_raw(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.engine.set_raw(key, value)
    }

    /// Remove `key`, or fail with `KeyNotFound`
    pub fn delete<K: Encode + ?Sized>(&mut self, key: &K) -> Result<()> {
        let key = key.encode(self.engine.codec())?;
        self.engine.delete_raw(&key)
    }

    pub fn delete_raw(&mut self, key: &[u8]) -> Result<()> {
        self.engine.delete_raw(key)
    }

    // =========================================================================
    // Derived Operations
    // =========================================================================

    /// Value under `key`; if absent, store `default` first and return it
    pub fn set_default<K, V>(&mut self, key: &K, default: V) -> Result<V>
    where
        K: Encode + ?Sized,
        V: Encode + Decode,
    {
        let raw_key = key.encode(self.engine.codec())?;
        if self.engine.index().contains(&raw_key) {
            let bytes = self.engine.get_raw(&raw_key)?;
            return V::decode(&bytes, self.engine.codec());
        }

        let value = default.encode(self.engine.codec())?;
        self.engine.set_raw(&raw_key, &value)?;
        Ok(default)
    }

    /// Remove `key` and return its value, or fail with `KeyNotFound`
    pub fn pop<K, V>(&mut self, key: &K) -> Result<V>
    where
        K: Encode + ?Sized,
        V: Decode,
    {
        let raw_key = key.encode(self.engine.codec())?;
        let bytes = self.engine.get_raw(&raw_key)?;
        let value = V::decode(&bytes, self.engine.codec())?;
        self.engine.delete_raw(&raw_key)?;
        Ok(value)
    }

    /// Like `pop`, returning `default` instead of failing when `key` is absent
    pub fn pop_or<K, V>(&mut self, key: &K, default: V) -> Result<V>
    where
        K: Encode + ?Sized,
        V: Decode,
    {
        match self.pop(key) {
            Err(StowError::KeyNotFound) => Ok(default),
            other => other,
        }
    }

    /// Remove and return the most recently inserted live entry
    ///
    /// Fails with `Empty` when the store holds no keys.
    pub fn pop_item<K: Decode, V: Decode>(&mut self) -> Result<(K, V)> {
        let (raw_key, location) = match self.engine.index().last() {
            Some((key, location)) => (key.to_vec(), location),
            None => return Err(StowError::Empty),
        };

        let bytes = self.engine.read_at(&raw_key, location)?;
        let key = K::decode(&raw_key, self.engine.codec())?;
        let value = V::decode(&bytes, self.engine.codec())?;

        self.engine.delete_raw(&raw_key)?;
        Ok((key, value))
    }

    /// Store every pair, in order
    pub fn update<I, K, V>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Encode,
        V: Encode,
    {
        for (key, value) in items {
            self.set(&key, &value)?;
        }
        Ok(())
    }

    /// Remove every key and compact the now empty file
    pub fn clear(&mut self) -> Result<()> {
        let keys: Vec<Vec<u8>> = self.engine.index().keys().map(<[u8]>::to_vec).collect();
        for key in &keys {
            self.engine.delete_raw(key)?;
        }
        self.engine.compact()?;
        Ok(())
    }

    // =========================================================================
    // File Maintenance
    // =========================================================================

    /// Rewrite the file with only its live entries, in place
    pub fn compact(&mut self) -> Result<CompactionStats> {
        self.engine.compact()
    }

    /// Write a compacted copy of this store to `path` and open it.
    ///
    /// Any file already at `path` is replaced; the current store's own file
    /// is rejected with `CopyOntoSelf`.
    pub fn copy(&self, path: impl AsRef<Path>) -> Result<Store<C>>
    where
        C: Clone,
    {
        let engine = self.engine.copy_to(path.as_ref())?;
        Ok(Store { engine })
    }

    /// Force every appended record to disk
    pub fn sync(&mut self) -> Result<()> {
        self.engine.sync()
    }

    /// Sync (compacting first if configured) and release the file
    pub fn close(mut self) -> Result<()> {
        self.engine.shutdown(false)
    }

    /// Compact, sync and release the file
    pub fn close_with_compaction(mut self) -> Result<()> {
        self.engine.shutdown(true)
    }

    pub fn is_open(&self) -> bool {
        self.engine.is_open()
    }
}

impl<C: Codec> ReadAccess for Store<C> {
    type Codec = C;

    fn engine(&self) -> &Engine<C> {
        &self.engine
    }
}

impl<C: Codec> Drop for Store<C> {
    fn drop(&mut self) {
        self.engine.shutdown_quietly();
    }
}
