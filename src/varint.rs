//! Continuation-bit variable length integers.
//!
//! Seven payload bits per byte, least significant group first, high bit set
//! while more bytes follow. Signed values go through a zig-zag mapping first so
//! that small negative numbers stay short.

use bytes::BufMut;

use crate::error::{CodecError, Result};

/// Longest legal encoding of a 32-bit value.
pub const MAX_VARINT32_BYTES: usize = 5;
/// Longest legal encoding of a 64-bit value.
pub const MAX_VARINT64_BYTES: usize = 10;

#[inline]
pub fn zigzag_encode_32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

#[inline]
pub fn zigzag_decode_32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ -((n & 1) as i32)
}

#[inline]
pub fn zigzag_encode_64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

#[inline]
pub fn zigzag_decode_64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

pub fn write_u32(dst: &mut impl BufMut, mut value: u32) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            dst.put_u8(byte);
            return;
        }
        dst.put_u8(byte | 0x80);
    }
}

pub fn write_u64(dst: &mut impl BufMut, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            dst.put_u8(byte);
            return;
        }
        dst.put_u8(byte | 0x80);
    }
}

/// Number of bytes `write_u32` emits for `value`.
pub fn encoded_len_u32(value: u32) -> usize {
    let bits = 32 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

/// Number of bytes `write_u64` emits for `value`.
pub fn encoded_len_u64(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

/// Decodes an unsigned 32-bit varint starting at `buf[at]`.
///
/// Returns the value and the number of bytes consumed. Never reads outside
/// `buf`; a sequence longer than five bytes, or a fifth byte carrying bits
/// beyond bit 31, is rejected.
pub fn read_u32(buf: &[u8], at: usize) -> Result<(u32, usize)> {
    let mut result: u32 = 0;
    for i in 0..MAX_VARINT32_BYTES {
        let byte = *buf.get(at + i).ok_or(CodecError::Truncated {
            offset: at + i,
            needed: 1,
            remaining: 0,
        })?;
        if i == MAX_VARINT32_BYTES - 1 && byte > 0x0F {
            return Err(CodecError::VarIntTooLong {
                offset: at,
                max_bytes: MAX_VARINT32_BYTES,
            });
        }
        result |= ((byte & 0x7F) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }
    Err(CodecError::VarIntTooLong {
        offset: at,
        max_bytes: MAX_VARINT32_BYTES,
    })
}

/// 64-bit counterpart of [`read_u32`]; the tenth byte may only carry bit 63.
pub fn read_u64(buf: &[u8], at: usize) -> Result<(u64, usize)> {
    let mut result: u64 = 0;
    for i in 0..MAX_VARINT64_BYTES {
        let byte = *buf.get(at + i).ok_or(CodecError::Truncated {
            offset: at + i,
            needed: 1,
            remaining: 0,
        })?;
        if i == MAX_VARINT64_BYTES - 1 && byte > 0x01 {
            return Err(CodecError::VarIntTooLong {
                offset: at,
                max_bytes: MAX_VARINT64_BYTES,
            });
        }
        result |= ((byte & 0x7F) as u64) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }
    Err(CodecError::VarIntTooLong {
        offset: at,
        max_bytes: MAX_VARINT64_BYTES,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encode32(v: u32) -> Vec<u8> {
        let mut out = Vec::new();
        write_u32(&mut out, v);
        out
    }

    fn encode64(v: u64) -> Vec<u8> {
        let mut out = Vec::new();
        write_u64(&mut out, v);
        out
    }

    #[test]
    fn test_known_encodings() {
        assert_eq!(encode32(0), vec![0x00]);
        assert_eq!(encode32(1), vec![0x01]);
        assert_eq!(encode32(127), vec![0x7F]);
        assert_eq!(encode32(128), vec![0x80, 0x01]);
        assert_eq!(encode32(300), vec![0xAC, 0x02]);
        assert_eq!(encode32(u32::MAX), vec![0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
        assert_eq!(encode64(u64::MAX).len(), MAX_VARINT64_BYTES);
    }

    #[test]
    fn test_zigzag_boundaries() {
        assert_eq!(zigzag_encode_32(0), 0);
        assert_eq!(zigzag_encode_32(-1), 1);
        assert_eq!(zigzag_encode_32(1), 2);
        assert_eq!(zigzag_encode_32(i32::MIN), u32::MAX);
        assert_eq!(zigzag_encode_32(i32::MAX), u32::MAX - 1);
        assert_eq!(zigzag_decode_32(u32::MAX), i32::MIN);
        assert_eq!(zigzag_decode_64(zigzag_encode_64(i64::MIN)), i64::MIN);
        assert_eq!(zigzag_decode_64(zigzag_encode_64(i64::MAX)), i64::MAX);
    }

    #[test]
    fn test_rejects_overlong_sequences() {
        let bytes = [0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
        assert!(matches!(
            read_u32(&bytes, 0),
            Err(CodecError::VarIntTooLong { max_bytes: 5, .. })
        ));

        // Fifth byte with bits above 31.
        let bytes = [0xFF, 0xFF, 0xFF, 0xFF, 0x1F];
        assert!(matches!(read_u32(&bytes, 0), Err(CodecError::VarIntTooLong { .. })));

        let bytes = [0xFF; 11];
        assert!(matches!(
            read_u64(&bytes, 0),
            Err(CodecError::VarIntTooLong { max_bytes: 10, .. })
        ));
    }

    #[test]
    fn test_unterminated_sequence_is_truncated() {
        let bytes = [0x80, 0x80];
        match read_u32(&bytes, 0) {
            Err(CodecError::Truncated { offset, .. }) => assert_eq!(offset, 2),
            other => panic!("expected truncation, got {:?}", other),
        }
        assert!(matches!(read_u64(&[], 0), Err(CodecError::Truncated { .. })));
    }

    #[test]
    fn test_reads_at_offset() {
        let bytes = [0xAA, 0xAC, 0x02, 0xBB];
        assert_eq!(read_u32(&bytes, 1).unwrap(), (300, 2));
    }

    proptest! {
        #[test]
        fn prop_u32_round_trip(v in any::<u32>()) {
            let bytes = encode32(v);
            prop_assert_eq!(bytes.len(), encoded_len_u32(v));
            prop_assert_eq!(read_u32(&bytes, 0).unwrap(), (v, bytes.len()));
        }

        #[test]
        fn prop_i32_zigzag_round_trip(v in any::<i32>()) {
            let bytes = encode32(zigzag_encode_32(v));
            let (raw, _) = read_u32(&bytes, 0).unwrap();
            prop_assert_eq!(zigzag_decode_32(raw), v);
        }

        #[test]
        fn prop_i64_zigzag_round_trip(v in any::<i64>()) {
            let bytes = encode64(zigzag_encode_64(v));
            prop_assert_eq!(bytes.len(), encoded_len_u64(zigzag_encode_64(v)));
            let (raw, used) = read_u64(&bytes, 0).unwrap();
            prop_assert_eq!(used, bytes.len());
            prop_assert_eq!(zigzag_decode_64(raw), v);
        }

        #[test]
        fn prop_u64_round_trip(v in any::<u64>()) {
            let bytes = encode64(v);
            prop_assert_eq!(read_u64(&bytes, 0).unwrap(), (v, bytes.len()));
        }
    }
}
