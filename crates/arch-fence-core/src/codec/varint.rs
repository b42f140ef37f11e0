//! Unsigned LEB128 varints.

use super::CodecError;

/// Longest encoding of a `u64`.
pub const MAX_LEN: usize = 10;

/// Number of bytes needed to encode `value`.
#[must_use]
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.max(1).div_ceil(7)
}

/// Appends `value` to `out`.
pub fn write(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        // Truncation keeps the low seven bits plus the continuation bit.
        #[allow(clippy::cast_possible_truncation)]
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    #[allow(clippy::cast_possible_truncation)]
    out.push(value as u8);
}

/// Reads a varint starting at `offset`.
///
/// Returns the value and the number of bytes consumed.
///
/// # Errors
///
/// Returns [`CodecError::Truncated`] if the input ends mid-varint and
/// [`CodecError::VarintOverflow`] if it exceeds `u64`.
pub fn read(bytes: &[u8], offset: usize) -> Result<(u64, usize), CodecError> {
    let mut value: u64 = 0;
    let mut shift = 0u32;

    for i in 0..MAX_LEN {
        let Some(&byte) = bytes.get(offset + i) else {
            return Err(CodecError::Truncated {
                offset,
                needed: i + 1,
                remaining: bytes.len().saturating_sub(offset),
            });
        };

        let low = u64::from(byte & 0x7f);
        // The tenth byte may only contribute the single top bit.
        if shift == 63 && low > 1 {
            return Err(CodecError::VarintOverflow { offset });
        }
        value |= low << shift;

        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
        shift += 7;
    }

    Err(CodecError::VarintOverflow { offset })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lengths_match_writes() {
        for value in [0, 1, 127, 128, 300, 16_383, 16_384, u64::from(u32::MAX), u64::MAX] {
            let mut out = Vec::new();
            write(&mut out, value);
            assert_eq!(out.len(), encoded_len(value), "value {value}");
            assert_eq!(read(&out, 0).unwrap(), (value, out.len()));
        }
    }

    #[test]
    fn known_encodings() {
        let mut out = Vec::new();
        write(&mut out, 300);
        assert_eq!(out, [0xac, 0x02]);
        assert_eq!(encoded_len(u64::MAX), MAX_LEN);
    }

    #[test]
    fn truncated_varint() {
        let err = read(&[0x80, 0x80], 0).unwrap_err();
        assert!(matches!(err, CodecError::Truncated { offset: 0, .. }));
    }

    #[test]
    fn overlong_varint() {
        let bytes = [0xff; 11];
        assert_eq!(
            read(&bytes, 0).unwrap_err(),
            CodecError::VarintOverflow { offset: 0 }
        );
    }

    #[test]
    fn tenth_byte_overflow() {
        let mut bytes = vec![0xff; 9];
        bytes.push(0x02);
        assert_eq!(
            read(&bytes, 0).unwrap_err(),
            CodecError::VarintOverflow { offset: 0 }
        );
    }
}
