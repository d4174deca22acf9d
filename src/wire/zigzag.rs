// ZigZag mapping between signed and unsigned integers.
//
//   encode(v) = (v >> (n-1)) ^ (v << 1)
//   decode(u) = (u >> 1) ^ -(u & 1)
//
// 0, -1, 1, -2, 2, ... map to 0, 1, 2, 3, 4, ...

/// Map a signed 32-bit value onto the unsigned range.
#[inline]
pub fn encode_i32(v: i32) -> u32 {
    ((v >> 31) ^ (v << 1)) as u32
}

/// Inverse of [`encode_i32`].
#[inline]
pub fn decode_i32(u: u32) -> i32 {
    ((u >> 1) as i32) ^ -((u & 1) as i32)
}

/// Map a signed 64-bit value onto the unsigned range.
#[inline]
pub fn encode_i64(v: i64) -> u64 {
    ((v >> 63) ^ (v << 1)) as u64
}

/// Inverse of [`encode_i64`].
#[inline]
pub fn decode_i64(u: u64) -> i64 {
    ((u >> 1) as i64) ^ -((u & 1) as i64)
}
