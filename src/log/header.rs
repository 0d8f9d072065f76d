//! File header
//!
//! Identifies a store file and the format and codec versions it was written
//! with. A file whose header cannot be read is not loaded at all.

use crate::codec::Codec;
use crate::error::{Result, StowError};

/// Magic bytes identifying a StowKV store file
pub const MAGIC: &[u8; 4] = b"STOW";

/// Current log format version
pub const FORMAT_VERSION: u16 = 1;

/// Header size: Magic (4) + FormatVersion (2) + CodecVersion (2) = 8 bytes
pub const HEADER_SIZE: usize = 8;

/// Decoded file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub format_version: u16,
    pub codec_version: u16,
}

impl Header {
    /// Header for a new file written with the given codec version
    pub fn new(codec_version: u16) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            codec_version,
        }
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(MAGIC);
        buf[4..6].copy_from_slice(&self.format_version.to_be_bytes());
        buf[6..8].copy_from_slice(&self.codec_version.to_be_bytes());
        buf
    }

    /// Decode the header at the start of `bytes`.
    ///
    /// Fails with `BadMagic` if the signature is missing or short, and with
    /// `IncompatibleFormat` for any format version other than the current one.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE || &bytes[0..4] != MAGIC {
            let found = bytes[..bytes.len().min(MAGIC.len())].to_vec();
            return Err(StowError::BadMagic { found });
        }

        let format_version = u16::from_be_bytes([bytes[4], bytes[5]]);
        if format_version != FORMAT_VERSION {
            return Err(StowError::IncompatibleFormat {
                found: format_version,
                supported: FORMAT_VERSION,
            });
        }

        let codec_version = u16::from_be_bytes([bytes[6], bytes[7]]);

        Ok(Self {
            format_version,
            codec_version,
        })
    }

    /// Check that `codec` can decode objects stored in this file
    pub fn check_codec<C: Codec>(&self, codec: &C) -> Result<()> {
        if codec.accepts(self.codec_version) {
            Ok(())
        } else {
            Err(StowError::IncompatibleCodec {
                found: self.codec_version,
                required: codec.version(),
            })
        }
    }
}
