//! Payload formats for cached violation collections.
//!
//! The cache stores one payload per analyzed file. [`BinaryCodec`] is the
//! default, compact format; [`JsonCodec`] trades size for entries that can
//! be inspected by hand. Neither format is stable across releases: a change
//! simply turns every existing entry into a miss.

mod binary;
mod json;
pub mod varint;

pub use binary::BinaryCodec;
pub use json::JsonCodec;

use crate::types::Violation;

/// Errors decoding a payload.
///
/// Every variant is recoverable; callers treat a failed decode as a
/// corrupted cache entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Fewer bytes remain than a field declares.
    #[error("truncated payload at byte {offset}: need {needed} byte(s), {remaining} remaining")]
    Truncated {
        /// Byte offset where the read started.
        offset: usize,
        /// Bytes the field requires.
        needed: usize,
        /// Bytes actually left.
        remaining: usize,
    },

    /// A varint ran past 10 bytes or overflowed `u64`.
    #[error("malformed varint at byte {offset}")]
    VarintOverflow {
        /// Byte offset of the varint.
        offset: usize,
    },

    /// A declared length does not fit in memory on this platform.
    #[error("length {value} at byte {offset} exceeds addressable size")]
    LengthOverflow {
        /// Byte offset of the length prefix.
        offset: usize,
        /// The declared value.
        value: u64,
    },

    /// A string field is not valid UTF-8.
    #[error("invalid UTF-8 in string at byte {offset}")]
    InvalidUtf8 {
        /// Byte offset of the string payload.
        offset: usize,
    },

    /// The cached-flag byte is neither 0 nor 1.
    #[error("invalid flag byte {value:#04x} at byte {offset}")]
    InvalidFlag {
        /// Byte offset of the flag.
        offset: usize,
        /// The byte found.
        value: u8,
    },

    /// Bytes remain after the declared number of records.
    #[error("{remaining} trailing byte(s) after byte {offset}")]
    TrailingBytes {
        /// Offset where decoding finished.
        offset: usize,
        /// Bytes left over.
        remaining: usize,
    },

    /// The payload is not valid for the JSON format.
    #[error("invalid JSON payload: {0}")]
    Json(String),
}

/// A serialization strategy for cached violations.
pub trait PayloadCodec: Send + Sync {
    /// Short name used in logs and configuration (`"binary"`, `"json"`).
    fn name(&self) -> &'static str;

    /// Serializes `violations` into a fresh buffer.
    fn encode(&self, violations: &[Violation]) -> Vec<u8>;

    /// Deserializes a buffer produced by [`PayloadCodec::encode`].
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the buffer is malformed.
    fn decode(&self, bytes: &[u8]) -> Result<Vec<Violation>, CodecError>;
}
