//! Key/value codec
//!
//! The storage engine only deals in byte strings. This module turns typed keys
//! and values into those bytes and back.
//!
//! ## Encodings
//! - byte strings (`[u8]`, `Vec<u8>`, `[u8; N]`): stored as-is
//! - text (`str`, `String`): UTF-8
//! - integers and floats: their decimal text form, UTF-8
//! - anything else: wrap it in [`Object`] and it goes through the store's
//!   [`Codec`], whose version is recorded in the file header
//!
//! Decoding is driven by the requested type, so the same bytes may be read
//! back as text or as raw bytes. Because numbers are stored as text, the key
//! `1i64` and the key `"1"` address the same entry.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StowError};

/// Version written to the header by [`BincodeCodec`]
pub const BINCODE_CODEC_VERSION: u16 = 1;

/// Generic object serialization injected into a store
pub trait Codec {
    /// Version tag recorded in every file this codec writes
    fn version(&self) -> u16;

    /// Whether a file written with `file_version` can be decoded.
    ///
    /// Files written with an older codec version are rejected.
    fn accepts(&self, file_version: u16) -> bool {
        file_version >= self.version()
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>>;

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;
}

/// Default codec backed by bincode
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl Codec for BincodeCodec {
    fn version(&self) -> u16 {
        BINCODE_CODEC_VERSION
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        Ok(bincode::serialize(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        Ok(bincode::deserialize(bytes)?)
    }
}

// =============================================================================
// Typed Keys and Values
// =============================================================================

/// A type that can be written as a key or value
pub trait Encode {
    fn encode<C: Codec>(&self, codec: &C) -> Result<Vec<u8>>;
}

/// A type that can be read back from a stored key or value
pub trait Decode: Sized {
    fn decode<C: Codec>(bytes: &[u8], codec: &C) -> Result<Self>;
}

/// Routes a serde type through the store's [`Codec`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Object<T>(pub T);

impl<T> Object<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Serialize> Encode for Object<T> {
    fn encode<C: Codec>(&self, codec: &C) -> Result<Vec<u8>> {
        codec.encode(&self.0)
    }
}

impl<T: DeserializeOwned> Decode for Object<T> {
    fn decode<C: Codec>(bytes: &[u8], codec: &C) -> Result<Self> {
        codec.decode(bytes).map(Object)
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode<C: Codec>(&self, codec: &C) -> Result<Vec<u8>> {
        (**self).encode(codec)
    }
}

impl Encode for [u8] {
    fn encode<C: Codec>(&self, _codec: &C) -> Result<Vec<u8>> {
        Ok(self.to_vec())
    }
}

impl<const N: usize> Encode for [u8; N] {
    fn encode<C: Codec>(&self, _codec: &C) -> Result<Vec<u8>> {
        Ok(self.to_vec())
    }
}

impl Encode for Vec<u8> {
    fn encode<C: Codec>(&self, _codec: &C) -> Result<Vec<u8>> {
        Ok(self.clone())
    }
}

impl Decode for Vec<u8> {
    fn decode<C: Codec>(bytes: &[u8], _codec: &C) -> Result<Self> {
        Ok(bytes.to_vec())
    }
}

impl Encode for str {
    fn encode<C: Codec>(&self, _codec: &C) -> Result<Vec<u8>> {
        Ok(self.as_bytes().to_vec())
    }
}

impl Encode for String {
    fn encode<C: Codec>(&self, _codec: &C) -> Result<Vec<u8>> {
        Ok(self.as_bytes().to_vec())
    }
}

impl Decode for String {
    fn decode<C: Codec>(bytes: &[u8], _codec: &C) -> Result<Self> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| StowError::Codec(format!("value is not valid UTF-8: {}", e)))
    }
}

macro_rules! impl_numeric {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Encode for $ty {
                fn encode<C: Codec>(&self, _codec: &C) -> Result<Vec<u8>> {
                    Ok(self.to_string().into_bytes())
                }
            }

            impl Decode for $ty {
                fn decode<C: Codec>(bytes: &[u8], codec: &C) -> Result<Self> {
                    let text = String::decode(bytes, codec)?;
                    text.parse::<$ty>().map_err(|e| {
                        StowError::Codec(format!(
                            "cannot read {:?} as {}: {}",
                            text,
                            stringify!($ty),
                            e
                        ))
                    })
                }
            }
        )*
    };
}

impl_numeric!(i8, i16, i32, i64, i128, isize, u16, u32, u64, u128, usize, f32, f64);
