//! Read-only store handle

use std::path::Path;

use crate::codec::{BincodeCodec, Codec};
use crate::config::{Config, OpenMode};
use crate::error::Result;

use super::access::ReadAccess;
use super::engine::Engine;

/// A store opened with mode `r`
///
/// Only the operations of [`ReadAccess`] exist on this type, so a write
/// through a read-only handle does not compile.
#[derive(Debug)]
pub struct ReadOnlyStore<C: Codec = BincodeCodec> {
    engine: Engine<C>,
}

impl ReadOnlyStore<BincodeCodec> {
    /// Open an existing store file for reading
    pub fn open(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        Self::open_with_codec(path, config, BincodeCodec)
    }
}

impl<C: Codec> ReadOnlyStore<C> {
    pub fn open_with_codec(path: impl AsRef<Path>, config: Config, codec: C) -> Result<Self> {
        let engine = Engine::open(path.as_ref(), OpenMode::ReadOnly, config, codec)?;
        Ok(Self { engine })
    }

    /// Release the file
    pub fn close(mut self) -> Result<()> {
        self.engine.shutdown(false)
    }
}

impl<C: Codec> ReadAccess for ReadOnlyStore<C> {
    type Codec = C;

    fn engine(&self) -> &Engine<C> {
        &self.engine
    }
}
