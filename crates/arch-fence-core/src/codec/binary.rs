//! Dense binary encoding of violation collections.
//!
//! Layout, with no padding:
//!
//! ```text
//! [varint count]
//! count × ( [varint len][file] [varint len][import] [varint len][rule]
//!           [varint len][cause] [varint len][details] [u8 cached] )
//! ```
//!
//! Encoding sizes the output exactly before writing, so the buffer is
//! allocated once and never grows.

use super::{varint, CodecError, PayloadCodec};
use crate::types::Violation;

/// Smallest possible record: five zero-length strings and the flag byte.
const MIN_RECORD_LEN: usize = 6;

/// The default compact cache payload format.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

impl BinaryCodec {
    /// Creates the codec.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Exact number of bytes [`PayloadCodec::encode`] will produce.
    #[must_use]
    pub fn encoded_len(violations: &[Violation]) -> usize {
        let records: usize = violations
            .iter()
            .map(|v| {
                string_len(&v.file)
                    + string_len(&v.import)
                    + string_len(&v.rule)
                    + string_len(&v.cause)
                    + string_len(&v.details)
                    + 1
            })
            .sum();
        varint::encoded_len(violations.len() as u64) + records
    }
}

fn string_len(s: &str) -> usize {
    varint::encoded_len(s.len() as u64) + s.len()
}

fn write_str(out: &mut Vec<u8>, s: &str) {
    varint::write(out, s.len() as u64);
    out.extend_from_slice(s.as_bytes());
}

impl PayloadCodec for BinaryCodec {
    fn name(&self) -> &'static str {
        "binary"
    }

    fn encode(&self, violations: &[Violation]) -> Vec<u8> {
        let size = Self::encoded_len(violations);
        let mut out = Vec::with_capacity(size);

        varint::write(&mut out, violations.len() as u64);
        for v in violations {
            write_str(&mut out, &v.file);
            write_str(&mut out, &v.import);
            write_str(&mut out, &v.rule);
            write_str(&mut out, &v.cause);
            write_str(&mut out, &v.details);
            out.push(u8::from(v.cached));
        }

        debug_assert_eq!(out.len(), size);
        out
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<Violation>, CodecError> {
        let mut reader = Reader::new(bytes);
        let count = reader.length()?;

        // A hostile count must not drive the allocation.
        let mut violations = Vec::with_capacity(count.min(reader.remaining() / MIN_RECORD_LEN));
        for _ in 0..count {
            violations.push(Violation {
                file: reader.string()?,
                import: reader.string()?,
                rule: reader.string()?,
                cause: reader.string()?,
                details: reader.string()?,
                cached: reader.flag()?,
            });
        }

        reader.finish()?;
        Ok(violations)
    }
}

/// Bounds-checked cursor over a payload.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn length(&mut self) -> Result<usize, CodecError> {
        let offset = self.pos;
        let (value, used) = varint::read(self.bytes, offset)?;
        self.pos += used;
        usize::try_from(value).map_err(|_| CodecError::LengthOverflow { offset, value })
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(CodecError::Truncated {
                offset: self.pos,
                needed: len,
                remaining,
            });
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn string(&mut self) -> Result<String, CodecError> {
        let len = self.length()?;
        let offset = self.pos;
        let raw = self.take(len)?;
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| CodecError::InvalidUtf8 { offset })
    }

    fn flag(&mut self) -> Result<bool, CodecError> {
        let offset = self.pos;
        match self.take(1)?[0] {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(CodecError::InvalidFlag { offset, value }),
        }
    }

    fn finish(&self) -> Result<(), CodecError> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(CodecError::TrailingBytes {
                offset: self.pos,
                remaining,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ViolationKind;

    fn sample() -> Vec<Violation> {
        vec![
            Violation::new(
                "internal/api/handler.go",
                "internal/database",
                "internal/api",
                ViolationKind::Prohibited,
                "no direct db",
            ),
            Violation::new("src/ドメイン/型.rs", "crate::インフラ", "src/ドメイン", ViolationKind::NotAllowed, ""),
            Violation {
                file: String::new(),
                import: String::new(),
                rule: String::new(),
                cause: String::new(),
                details: String::new(),
                cached: true,
            },
        ]
    }

    #[test]
    fn round_trips_mixed_records() {
        let codec = BinaryCodec::new();
        let original = sample();
        let bytes = codec.encode(&original);
        assert_eq!(bytes.len(), BinaryCodec::encoded_len(&original));
        assert_eq!(codec.decode(&bytes).unwrap(), original);
    }

    #[test]
    fn empty_set_is_count_only() {
        let codec = BinaryCodec::new();
        let bytes = codec.encode(&[]);
        assert_eq!(bytes, [0x00]);
        assert!(codec.decode(&bytes).unwrap().is_empty());
    }

    #[test]
    fn encoding_is_deterministic() {
        let codec = BinaryCodec::new();
        assert_eq!(codec.encode(&sample()), codec.encode(&sample()));
    }

    #[test]
    fn multibyte_lengths_are_byte_lengths() {
        let codec = BinaryCodec::new();
        let v = vec![Violation {
            file: "é".into(),
            import: String::new(),
            rule: String::new(),
            cause: String::new(),
            details: String::new(),
            cached: false,
        }];
        let bytes = codec.encode(&v);
        // count, len=2, 0xC3 0xA9, four empty strings, flag
        assert_eq!(bytes, [1, 2, 0xc3, 0xa9, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn every_truncation_is_an_error() {
        let codec = BinaryCodec::new();
        let bytes = codec.encode(&sample());
        for cut in 0..bytes.len() {
            assert!(
                codec.decode(&bytes[..cut]).is_err(),
                "prefix of length {cut} decoded"
            );
        }
    }

    #[test]
    fn declared_length_beyond_input() {
        let codec = BinaryCodec::new();
        let err = codec.decode(&[1, 50, b'a']).unwrap_err();
        assert_eq!(
            err,
            CodecError::Truncated {
                offset: 2,
                needed: 50,
                remaining: 1
            }
        );
    }

    #[test]
    fn huge_count_does_not_allocate() {
        let codec = BinaryCodec::new();
        let mut bytes = Vec::new();
        varint::write(&mut bytes, u64::from(u32::MAX));
        assert!(matches!(
            codec.decode(&bytes),
            Err(CodecError::Truncated { .. })
        ));
    }

    #[test]
    fn bad_flag_byte() {
        let codec = BinaryCodec::new();
        let err = codec.decode(&[1, 0, 0, 0, 0, 0, 7]).unwrap_err();
        assert_eq!(err, CodecError::InvalidFlag { offset: 6, value: 7 });
    }

    #[test]
    fn invalid_utf8() {
        let codec = BinaryCodec::new();
        let err = codec.decode(&[1, 1, 0xff, 0, 0, 0, 0, 0]).unwrap_err();
        assert_eq!(err, CodecError::InvalidUtf8 { offset: 2 });
    }

    #[test]
    fn trailing_bytes() {
        let codec = BinaryCodec::new();
        let err = codec.decode(&[0, 9]).unwrap_err();
        assert_eq!(
            err,
            CodecError::TrailingBytes {
                offset: 1,
                remaining: 1
            }
        );
    }
}
