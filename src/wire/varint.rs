// Header-byte variable-length integers.
//
// A single header byte either carries the value itself or says how many
// big-endian extra bytes follow:
//
//   32-bit: 0..=251 literal, 252..=255 -> 1..=4 extra bytes
//   64-bit: 0..=247 literal, 248..=255 -> 1..=8 extra bytes
//
// Extra bytes are most-significant first, so a value always reads left to
// right no matter which bit offset the cursor started at.

use crate::error::{Error, Result};

/// Values below this are written as their own header (32-bit).
pub const VARINT32_LITERAL_LIMIT: u32 = 252;

/// Values below this are written as their own header (64-bit).
pub const VARINT64_LITERAL_LIMIT: u64 = 248;

/// Header plus at most 4 extra bytes.
pub const MAX_VARINT32_LEN: usize = 5;

/// Header plus at most 8 extra bytes.
pub const MAX_VARINT64_LEN: usize = 9;

// ---------------------------------------------------------------------------
// Header interpretation
// ---------------------------------------------------------------------------

/// Number of extra bytes that follow a 32-bit header.
#[inline]
pub fn extra_bytes_u32(header: u8) -> usize {
    if u32::from(header) < VARINT32_LITERAL_LIMIT {
        0
    } else {
        usize::from(header) - (VARINT32_LITERAL_LIMIT as usize - 1)
    }
}

/// Number of extra bytes that follow a 64-bit header.
#[inline]
pub fn extra_bytes_u64(header: u8) -> usize {
    if u64::from(header) < VARINT64_LITERAL_LIMIT {
        0
    } else {
        usize::from(header) - (VARINT64_LITERAL_LIMIT as usize - 1)
    }
}

/// Bytes needed for a value with `bits` significant bits (at least 1).
#[inline]
fn significant_bytes(bits: u32) -> usize {
    (bits.div_ceil(8) as usize).max(1)
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a `u32` into `buf`, header first.
/// Returns the number of bytes used (1..=5).
#[inline]
pub fn encode_u32(num: u32, buf: &mut [u8; MAX_VARINT32_LEN]) -> usize {
    if num < VARINT32_LITERAL_LIMIT {
        buf[0] = num as u8;
        return 1;
    }
    let extra = significant_bytes(32 - num.leading_zeros());
    buf[0] = (VARINT32_LITERAL_LIMIT as usize - 1 + extra) as u8;
    let be = num.to_be_bytes();
    buf[1..=extra].copy_from_slice(&be[be.len() - extra..]);
    1 + extra
}

/// Encode a `u64` into `buf`, header first.
/// Returns the number of bytes used (1..=9).
#[inline]
pub fn encode_u64(num: u64, buf: &mut [u8; MAX_VARINT64_LEN]) -> usize {
    if num < VARINT64_LITERAL_LIMIT {
        buf[0] = num as u8;
        return 1;
    }
    let extra = significant_bytes(64 - num.leading_zeros());
    buf[0] = (VARINT64_LITERAL_LIMIT as usize - 1 + extra) as u8;
    let be = num.to_be_bytes();
    buf[1..=extra].copy_from_slice(&be[be.len() - extra..]);
    1 + extra
}

// ---------------------------------------------------------------------------
// Decoding from byte slices
// ---------------------------------------------------------------------------

fn truncated(data: &[u8], needed: usize) -> Error {
    Error::ReadOutOfRange {
        position: 0,
        requested: needed,
        capacity: data.len(),
    }
}

/// Decode a 32-bit varint from the front of `data`.
/// Returns `(value, bytes_consumed)`.
pub fn decode_u32(data: &[u8]) -> Result<(u32, usize)> {
    let &header = data.first().ok_or_else(|| truncated(data, 1))?;
    let extra = extra_bytes_u32(header);
    if extra == 0 {
        return Ok((u32::from(header), 1));
    }
    let body = data.get(1..=extra).ok_or_else(|| truncated(data, 1 + extra))?;
    let val = body.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
    Ok((val, 1 + extra))
}

/// Decode a 64-bit varint from the front of `data`.
/// Returns `(value, bytes_consumed)`.
pub fn decode_u64(data: &[u8]) -> Result<(u64, usize)> {
    let &header = data.first().ok_or_else(|| truncated(data, 1))?;
    let extra = extra_bytes_u64(header);
    if extra == 0 {
        return Ok((u64::from(header), 1));
    }
    let body = data.get(1..=extra).ok_or_else(|| truncated(data, 1 + extra))?;
    let val = body.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
    Ok((val, 1 + extra))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Encoded byte-length of a 32-bit magnitude.
#[inline]
pub fn sizeof_u32(num: u32) -> usize {
    if num < VARINT32_LITERAL_LIMIT {
        1
    } else {
        1 + significant_bytes(32 - num.leading_zeros())
    }
}

/// Encoded byte-length of a 64-bit magnitude.
#[inline]
pub fn sizeof_u64(num: u64) -> usize {
    if num < VARINT64_LITERAL_LIMIT {
        1
    } else {
        1 + significant_bytes(64 - num.leading_zeros())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn enc32(v: u32) -> Vec<u8> {
        let mut buf = [0u8; MAX_VARINT32_LEN];
        let len = encode_u32(v, &mut buf);
        buf[..len].to_vec()
    }

    fn enc64(v: u64) -> Vec<u8> {
        let mut buf = [0u8; MAX_VARINT64_LEN];
        let len = encode_u64(v, &mut buf);
        buf[..len].to_vec()
    }

    #[test]
    fn u32_header_tiers() {
        assert_eq!(enc32(0), [0]);
        assert_eq!(enc32(251), [251]);
        assert_eq!(enc32(252), [252, 252]);
        assert_eq!(enc32(255), [252, 255]);
        assert_eq!(enc32(256), [253, 1, 0]);
        assert_eq!(enc32(65535), [253, 255, 255]);
        assert_eq!(enc32(65536), [254, 1, 0, 0]);
        assert_eq!(enc32(16_777_215), [254, 255, 255, 255]);
        assert_eq!(enc32(16_777_216), [255, 1, 0, 0, 0]);
        assert_eq!(enc32(u32::MAX), [255, 255, 255, 255, 255]);
    }

    #[test]
    fn u64_header_tiers() {
        assert_eq!(enc64(247), [247]);
        assert_eq!(enc64(248), [248, 248]);
        assert_eq!(enc64(0x1_0000), [250, 1, 0, 0]);
        assert_eq!(enc64(1 << 56), [255, 1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(enc64((1 << 56) - 1), [254, 255, 255, 255, 255, 255, 255, 255]);
        assert_eq!(enc64(u64::MAX).len(), MAX_VARINT64_LEN);
    }

    #[test]
    fn roundtrip_u32() {
        let cases: &[u32] = &[0, 1, 251, 252, 255, 256, 65535, 65536, 16_777_216, u32::MAX];
        for &val in cases {
            let bytes = enc32(val);
            let (decoded, consumed) = decode_u32(&bytes).unwrap();
            assert_eq!(decoded, val, "roundtrip failed for {val}");
            assert_eq!(consumed, bytes.len());
            assert_eq!(sizeof_u32(val), bytes.len(), "sizeof mismatch for {val}");
        }
    }

    #[test]
    fn roundtrip_u64() {
        let cases: &[u64] = &[0, 247, 248, 255, 256, u32::MAX as u64, 1 << 48, u64::MAX];
        for &val in cases {
            let bytes = enc64(val);
            let (decoded, consumed) = decode_u64(&bytes).unwrap();
            assert_eq!(decoded, val, "roundtrip failed for {val}");
            assert_eq!(consumed, bytes.len());
            assert_eq!(sizeof_u64(val), bytes.len(), "sizeof mismatch for {val}");
        }
    }

    #[test]
    fn extra_byte_counts() {
        assert_eq!(extra_bytes_u32(251), 0);
        assert_eq!(extra_bytes_u32(252), 1);
        assert_eq!(extra_bytes_u32(255), 4);
        assert_eq!(extra_bytes_u64(247), 0);
        assert_eq!(extra_bytes_u64(248), 1);
        assert_eq!(extra_bytes_u64(255), 8);
    }

    #[test]
    fn truncated_input_is_rejected() {
        assert!(matches!(
            decode_u32(&[]),
            Err(Error::ReadOutOfRange { requested: 1, .. })
        ));
        assert!(matches!(
            decode_u32(&[254, 1]),
            Err(Error::ReadOutOfRange {
                requested: 4,
                capacity: 2,
                ..
            })
        ));
        assert!(decode_u64(&[255, 0, 0, 0]).is_err());
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let (val, used) = decode_u32(&[7, 0xAA, 0xBB]).unwrap();
        assert_eq!((val, used), (7, 1));
    }
}
