//! Store Module
//!
//! Handles onto a store file.
//!
//! ## Components
//! - `Store`: writable handle (modes `w`, `c`, `n`)
//! - `ReadOnlyStore`: read-only handle (mode `r`)
//! - `ReadAccess`: the read operations both handles share
//! - `Handle`: either of the two, chosen by an `OpenMode` at runtime

mod access;
mod engine;
mod read_only;
mod read_write;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub use access::ReadAccess;
pub use read_only::ReadOnlyStore;
pub use read_write::Store;

use crate::codec::{BincodeCodec, Codec};
use crate::config::{Config, OpenMode};
use crate::error::Result;

use engine::Engine;

/// Extension conventionally carried by store files
pub const FILE_EXTENSION: &str = "stow";

/// `path` with `.stow` appended, unless it already ends in it (any case)
pub fn with_extension(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let has_extension = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case(FILE_EXTENSION));

    if has_extension {
        return path.to_path_buf();
    }

    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(FILE_EXTENSION);
    PathBuf::from(name)
}

/// A store opened with a mode only known at runtime
#[derive(Debug)]
pub enum Handle<C: Codec = BincodeCodec> {
    ReadOnly(ReadOnlyStore<C>),
    ReadWrite(Store<C>),
}

impl<C: Codec> Handle<C> {
    /// The writable store, if this handle is one
    pub fn writable(&mut self) -> Option<&mut Store<C>> {
        match self {
            Handle::ReadWrite(store) => Some(store),
            Handle::ReadOnly(_) => None,
        }
    }

    pub fn into_writable(self) -> Option<Store<C>> {
        match self {
            Handle::ReadWrite(store) => Some(store),
            Handle::ReadOnly(_) => None,
        }
    }

    pub fn is_writable(&self) -> bool {
        matches!(self, Handle::ReadWrite(_))
    }

    pub fn close(self) -> Result<()> {
        match self {
            Handle::ReadOnly(store) => store.close(),
            Handle::ReadWrite(store) => store.close(),
        }
    }
}

impl<C: Codec> ReadAccess for Handle<C> {
    type Codec = C;

    fn engine(&self) -> &Engine<C> {
        match self {
            Handle::ReadOnly(store) => store.engine(),
            Handle::ReadWrite(store) => store.engine(),
        }
    }
}

/// Open the store file at `path` in `mode` with the default codec
pub fn open(path: impl AsRef<Path>, mode: OpenMode, config: Config) -> Result<Handle> {
    open_with_codec(path, mode, config, BincodeCodec)
}

/// Open the store file at `path` in `mode`, encoding objects with `codec`
pub fn open_with_codec<C: Codec>(
    path: impl AsRef<Path>,
    mode: OpenMode,
    config: Config,
    codec: C,
) -> Result<Handle<C>> {
    match mode.write_mode() {
        None => ReadOnlyStore::open_with_codec(path, config, codec).map(Handle::ReadOnly),
        Some(write_mode) => {
            Store::open_with_codec(path, write_mode, config, codec).map(Handle::ReadWrite)
        }
    }
}
