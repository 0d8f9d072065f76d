//! Log records
//!
//! Binary layout of one data or tombstone record and its checksum.

use thiserror::Error;

/// Size of the two length fields that open every record: KeySize (4) + ValSize (4)
pub const SIZE_FIELDS_LEN: usize = 8;

/// Size of the trailing CRC32
pub const CHECKSUM_SIZE: usize = 4;

/// Value size reserved to mark a deleted key
pub const TOMBSTONE: u32 = u32::MAX;

/// Largest value a data record can hold (every smaller size is a real length)
pub const MAX_VALUE_SIZE: usize = (TOMBSTONE - 1) as usize;

/// A record as it is written to the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record<'a> {
    Data { key: &'a [u8], value: &'a [u8] },
    Tombstone { key: &'a [u8] },
}

impl<'a> Record<'a> {
    pub fn data(key: &'a [u8], value: &'a [u8]) -> Self {
        Record::Data { key, value }
    }

    pub fn tombstone(key: &'a [u8]) -> Self {
        Record::Tombstone { key }
    }

    pub fn key(&self) -> &'a [u8] {
        match *self {
            Record::Data { key, .. } | Record::Tombstone { key } => key,
        }
    }

    /// Value bytes; empty for a tombstone
    pub fn value(&self) -> &'a [u8] {
        match *self {
            Record::Data { value, .. } => value,
            Record::Tombstone { .. } => &[],
        }
    }

    /// CRC32 over key ++ value (key alone for a tombstone)
    pub fn checksum(&self) -> u32 {
        checksum(self.key(), self.value())
    }

    /// Offset of the value bytes from the start of the record
    pub fn value_offset(&self) -> usize {
        SIZE_FIELDS_LEN + self.key().len()
    }

    pub fn encoded_len(&self) -> usize {
        SIZE_FIELDS_LEN + self.key().len() + self.value().len() + CHECKSUM_SIZE
    }

    /// Encode to the on-disk layout.
    ///
    /// Callers keep keys non-empty and values at most `MAX_VALUE_SIZE` bytes;
    /// the store enforces both before anything reaches the log.
    pub fn encode(&self) -> Vec<u8> {
        let key = self.key();
        let value = self.value();
        let value_size = match *self {
            Record::Data { value, .. } => value.len() as u32,
            Record::Tombstone { .. } => TOMBSTONE,
        };

        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(&(key.len() as u32).to_be_bytes());
        buf.extend_from_slice(&value_size.to_be_bytes());
        buf.extend_from_slice(key);
        buf.extend_from_slice(value);
        buf.extend_from_slice(&self.checksum().to_be_bytes());
        buf
    }
}

/// CRC32 of `key ++ value`
pub fn checksum(key: &[u8], value: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(key);
    hasher.update(value);
    hasher.finalize()
}

/// Check a stored checksum against the key and payload actually present
pub fn verify_checksum(key: &[u8], payload: &[u8], stored: u32) -> bool {
    checksum(key, payload) == stored
}

// =============================================================================
// Decoding
// =============================================================================

/// Why a record header could not be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("fewer than 8 bytes left for the size fields")]
    Truncated,

    #[error("key size is zero")]
    ZeroKeySize,

    #[error("record needs {needed} bytes but only {available} remain")]
    Overrun { needed: u64, available: u64 },
}

/// The size fields of a record, validated against the bytes that remain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub key_size: u32,
    pub value_size: u32,
}

impl RecordHeader {
    /// Decode the header of the record starting at `region[0]`.
    ///
    /// `region` runs to the end of the scanned data, so a record whose
    /// declared sizes do not fit in it is reported as `Overrun`.
    pub fn decode(region: &[u8]) -> Result<Self, RecordError> {
        if region.len() < SIZE_FIELDS_LEN {
            return Err(RecordError::Truncated);
        }

        let key_size = u32::from_be_bytes([region[0], region[1], region[2], region[3]]);
        let value_size = u32::from_be_bytes([region[4], region[5], region[6], region[7]]);

        if key_size == 0 {
            return Err(RecordError::ZeroKeySize);
        }

        let header = Self {
            key_size,
            value_size,
        };

        let needed = header.record_len();
        let available = region.len() as u64;
        if needed > available {
            return Err(RecordError::Overrun { needed, available });
        }

        Ok(header)
    }

    pub fn is_tombstone(&self) -> bool {
        self.value_size == TOMBSTONE
    }

    /// Number of value bytes that follow the key
    pub fn payload_len(&self) -> u64 {
        if self.is_tombstone() {
            0
        } else {
            self.value_size as u64
        }
    }

    /// Offset of the value bytes from the start of the record
    pub fn value_offset(&self) -> u64 {
        SIZE_FIELDS_LEN as u64 + self.key_size as u64
    }

    /// Total bytes occupied by the record, checksum included
    pub fn record_len(&self) -> u64 {
        self.value_offset() + self.payload_len() + CHECKSUM_SIZE as u64
    }
}
