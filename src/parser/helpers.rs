//! Helper functions for DataFlash binary decoding
//!
//! This module assembles little-endian integers of 1, 2, 4 and 8 bytes and
//! sign-extends them to 64 bits.

/// Assemble up to 4 little-endian bytes into a zero-extended value
pub fn le_unsigned(bytes: &[u8]) -> u64 {
    debug_assert!(bytes.len() <= 4);
    bytes
        .iter()
        .rev()
        .fold(0u64, |acc, &byte| (acc << 8) | byte as u64)
}

/// Sign-extend the low `width` bytes of `value` to i64
pub fn sign_extend(value: u64, width: usize) -> i64 {
    let shift = 64 - (width as u32) * 8;
    ((value << shift) as i64) >> shift
}

/// Decode an unsigned little-endian integer of 1, 2, 4 or 8 bytes.
///
/// The 8-byte case composes two 4-byte halves: low word zero-extended,
/// high word shifted left 32 and OR-combined.
pub fn le_to_u64(bytes: &[u8]) -> u64 {
    if bytes.len() == 8 {
        let low = le_unsigned(&bytes[..4]);
        let high = le_unsigned(&bytes[4..]);
        (high << 32) | low
    } else {
        le_unsigned(bytes)
    }
}

/// Decode a signed little-endian integer of 1, 2, 4 or 8 bytes.
pub fn le_to_i64(bytes: &[u8]) -> i64 {
    if bytes.len() == 8 {
        let low = le_unsigned(&bytes[..4]);
        let high = sign_extend(le_unsigned(&bytes[4..]), 4);
        (high << 32) | low as i64
    } else {
        sign_extend(le_unsigned(bytes), bytes.len())
    }
}

/// Fixed-width string field: keep bytes up to the first NUL
pub fn nul_terminated(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_le_unsigned() {
        assert_eq!(le_unsigned(&[0x01, 0x02]), 0x0201);
        assert_eq!(le_unsigned(&[0xff]), 255);
        assert_eq!(le_unsigned(&[0xff, 0xff, 0xff, 0xff]), 0xffff_ffff);
    }

    #[test]
    fn test_sign_extend() {
        assert_eq!(sign_extend(0x7f, 1), 127);
        assert_eq!(sign_extend(0x80, 1), -128);
        assert_eq!(sign_extend(0xffff, 2), -1);
        assert_eq!(sign_extend(0x8000_0000, 4), i32::MIN as i64);
        assert_eq!(sign_extend(0x7fff_ffff, 4), i32::MAX as i64);
    }

    #[test]
    fn test_le_64_composes_halves() {
        assert_eq!(le_to_u64(&[1, 0, 0, 0, 0, 0, 0, 0]), 1);
        assert_eq!(le_to_i64(&[1, 0, 0, 0, 0, 0, 0, 0]), 1);
        assert_eq!(le_to_u64(&[0, 0, 0, 0, 1, 0, 0, 0]), 1 << 32);
        assert_eq!(le_to_u64(&[0xff; 8]), u64::MAX);
        assert_eq!(le_to_i64(&[0xff; 8]), -1);
        assert_eq!(le_to_i64(&(-123_456_789_012i64).to_le_bytes()), -123_456_789_012);
        assert_eq!(le_to_i64(&i64::MIN.to_le_bytes()), i64::MIN);
    }

    #[test]
    fn test_high_bit_of_low_word_stays_unsigned() {
        let value: i64 = 0x0000_0001_8000_0000;
        assert_eq!(le_to_i64(&value.to_le_bytes()), value);
    }

    #[test]
    fn test_nul_terminated() {
        assert_eq!(nul_terminated(b"AB\0C"), "AB");
        assert_eq!(nul_terminated(b"ABCD"), "ABCD");
        assert_eq!(nul_terminated(b"\0BCD"), "");
    }
}
