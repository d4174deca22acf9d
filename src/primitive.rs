// Primitive read/write contract shared by every codec in the crate.
//
// An implementation supplies the two cursor-level operations (one byte at
// the current bit offset, one bit) and inherits the whole value vocabulary:
// fixed-width values through the canonical byte-order table, header-byte
// varints, ZigZag-mapped signed integers, and length-prefixed strings and
// byte blocks. Implementations override `write_raw`/`read_raw`/`skip_raw`
// when they have a faster path than a per-byte loop.
//
// Buffer-backed implementations also override the all-or-nothing hooks:
// `reserve` on the write side and `require`/`atomically` on the read side.
// A multi-byte value then either lands whole or leaves the cursor and the
// bytes exactly as they were.

use crate::error::{Error, Result};
use crate::wire::EndianLayout;
use crate::wire::varint::{self, MAX_VARINT32_LEN, MAX_VARINT64_LEN};
use crate::wire::zigzag;

/// Upper bound on speculative allocation when a length prefix has not been
/// backed by data yet.
const PREALLOC_LIMIT: usize = 64 * 1024;

fn length_prefix(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| Error::LengthOverflow(len))
}

fn code_unit_for(c: char) -> Result<u16> {
    u16::try_from(u32::from(c)).map_err(|_| Error::InvalidChar(u32::from(c)))
}

/// Encoded size of an Int32 length prefix followed by `body` bytes.
fn framed_len(prefix: i32, body: usize) -> Result<usize> {
    varint::sizeof_u32(zigzag::encode_i32(prefix))
        .checked_add(body)
        .ok_or(Error::LengthOverflow(body))
}

fn utf16_body_len(units: usize) -> Result<usize> {
    units.checked_mul(2).ok_or(Error::LengthOverflow(units))
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Sink side of the wire format.
pub trait PrimitiveWrite {
    /// Write one byte at the cursor, splicing across two physical bytes
    /// when the cursor is not byte-aligned.
    fn write_byte(&mut self, value: u8) -> Result<()>;

    /// Write a single bit (MSB-first within the byte) and advance the
    /// cursor by one bit.
    fn write_bit(&mut self, value: bool) -> Result<()>;

    /// Byte-order table used for fixed-width values.
    fn layout(&self) -> &'static EndianLayout {
        EndianLayout::host()
    }

    /// Make room for an `n`-byte value at the cursor before any of it is
    /// written. Sinks without a capacity limit keep the no-op default.
    fn reserve(&mut self, n: usize) -> Result<()> {
        let _ = n;
        Ok(())
    }

    /// Write `bytes` unmodified, with no length prefix.
    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        for &b in bytes {
            self.write_byte(b)?;
        }
        Ok(())
    }

    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_byte(value)
    }

    fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_byte(value as u8)
    }

    /// One bit.
    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_bit(value)
    }

    /// Two bytes, most significant first.
    fn write_u16(&mut self, value: u16) -> Result<()> {
        self.reserve(2)?;
        let native = value.to_ne_bytes();
        for &idx in self.layout().order16() {
            self.write_byte(native[idx])?;
        }
        Ok(())
    }

    /// Two bytes, most significant first.
    fn write_i16(&mut self, value: i16) -> Result<()> {
        self.write_u16(value as u16)
    }

    /// A UTF-16 code unit, fixed width like `u16`.
    fn write_code_unit(&mut self, unit: u16) -> Result<()> {
        self.write_u16(unit)
    }

    /// A `char` from the Basic Multilingual Plane, as one code unit.
    fn write_char(&mut self, value: char) -> Result<()> {
        self.write_code_unit(code_unit_for(value)?)
    }

    /// Header-byte varint.
    fn write_u32(&mut self, value: u32) -> Result<()> {
        let mut buf = [0u8; MAX_VARINT32_LEN];
        let len = varint::encode_u32(value, &mut buf);
        self.reserve(len)?;
        for &b in &buf[..len] {
            self.write_byte(b)?;
        }
        Ok(())
    }

    /// ZigZag, then a 32-bit varint.
    fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_u32(zigzag::encode_i32(value))
    }

    /// Header-byte varint.
    fn write_u64(&mut self, value: u64) -> Result<()> {
        let mut buf = [0u8; MAX_VARINT64_LEN];
        let len = varint::encode_u64(value, &mut buf);
        self.reserve(len)?;
        for &b in &buf[..len] {
            self.write_byte(b)?;
        }
        Ok(())
    }

    /// ZigZag, then a 64-bit varint.
    fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write_u64(zigzag::encode_i64(value))
    }

    /// IEEE-754 bits, four bytes most significant first.
    fn write_f32(&mut self, value: f32) -> Result<()> {
        self.reserve(4)?;
        let native = value.to_bits().to_ne_bytes();
        for &idx in self.layout().order32() {
            self.write_byte(native[idx])?;
        }
        Ok(())
    }

    /// IEEE-754 bits, eight bytes most significant first.
    fn write_f64(&mut self, value: f64) -> Result<()> {
        self.reserve(8)?;
        let native = value.to_bits().to_ne_bytes();
        for &idx in self.layout().order64() {
            self.write_byte(native[idx])?;
        }
        Ok(())
    }

    /// Int32 varint unit count, then each unit low byte first.
    fn write_utf16(&mut self, units: &[u16]) -> Result<()> {
        let prefix = length_prefix(units.len())?;
        self.reserve(framed_len(prefix, utf16_body_len(units.len())?)?)?;
        self.write_i32(prefix)?;
        for &unit in units {
            let [lo, hi] = unit.to_le_bytes();
            self.write_byte(lo)?;
            self.write_byte(hi)?;
        }
        Ok(())
    }

    /// UTF-16 encoding of `value`, framed like [`write_utf16`](Self::write_utf16).
    fn write_str(&mut self, value: &str) -> Result<()> {
        let count = value.encode_utf16().count();
        let prefix = length_prefix(count)?;
        self.reserve(framed_len(prefix, utf16_body_len(count)?)?)?;
        self.write_i32(prefix)?;
        for unit in value.encode_utf16() {
            let [lo, hi] = unit.to_le_bytes();
            self.write_byte(lo)?;
            self.write_byte(hi)?;
        }
        Ok(())
    }

    /// Int32 varint byte count, then the bytes unmodified.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let prefix = length_prefix(bytes.len())?;
        self.reserve(framed_len(prefix, bytes.len())?)?;
        self.write_i32(prefix)?;
        self.write_raw(bytes)
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Source side of the wire format. Mirrors [`PrimitiveWrite`] exactly.
pub trait PrimitiveRead {
    /// Read one byte at the cursor, recombining two physical bytes when the
    /// cursor is not byte-aligned.
    fn read_byte(&mut self) -> Result<u8>;

    /// Read a single bit and advance the cursor by one bit.
    fn read_bit(&mut self) -> Result<bool>;

    /// Byte-order table used for fixed-width values.
    fn layout(&self) -> &'static EndianLayout {
        EndianLayout::host()
    }

    /// Fail early unless `n` more bytes can be read at the cursor. Sources
    /// that cannot look ahead keep the no-op default and fail on the byte
    /// that is missing.
    fn require(&mut self, n: usize) -> Result<()> {
        let _ = n;
        Ok(())
    }

    /// Run one composite read. Rewindable sources override this so that a
    /// failed `read` leaves the cursor where it started.
    fn atomically<T, F>(&mut self, read: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        read(self)
    }

    /// Fill `dst` with raw bytes.
    fn read_raw(&mut self, dst: &mut [u8]) -> Result<()> {
        for slot in dst.iter_mut() {
            *slot = self.read_byte()?;
        }
        Ok(())
    }

    /// Advance past `len` raw bytes.
    fn skip_raw(&mut self, len: usize) -> Result<()> {
        for _ in 0..len {
            self.read_byte()?;
        }
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8> {
        self.read_byte()
    }

    fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_byte()? as i8)
    }

    fn read_bool(&mut self) -> Result<bool> {
        self.read_bit()
    }

    fn read_u16(&mut self) -> Result<u16> {
        self.atomically(|r| {
            r.require(2)?;
            let mut native = [0u8; 2];
            for &idx in r.layout().order16() {
                native[idx] = r.read_byte()?;
            }
            Ok(u16::from_ne_bytes(native))
        })
    }

    fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    fn read_code_unit(&mut self) -> Result<u16> {
        self.read_u16()
    }

    /// Fails on a lone surrogate code unit.
    fn read_char(&mut self) -> Result<char> {
        self.atomically(|r| {
            let unit = u32::from(r.read_code_unit()?);
            char::from_u32(unit).ok_or(Error::InvalidChar(unit))
        })
    }

    fn read_u32(&mut self) -> Result<u32> {
        self.atomically(|r| {
            let header = r.read_byte()?;
            let extra = varint::extra_bytes_u32(header);
            if extra == 0 {
                return Ok(u32::from(header));
            }
            r.require(extra)?;
            let mut val = 0u32;
            for _ in 0..extra {
                val = (val << 8) | u32::from(r.read_byte()?);
            }
            Ok(val)
        })
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(zigzag::decode_i32(self.read_u32()?))
    }

    fn read_u64(&mut self) -> Result<u64> {
        self.atomically(|r| {
            let header = r.read_byte()?;
            let extra = varint::extra_bytes_u64(header);
            if extra == 0 {
                return Ok(u64::from(header));
            }
            r.require(extra)?;
            let mut val = 0u64;
            for _ in 0..extra {
                val = (val << 8) | u64::from(r.read_byte()?);
            }
            Ok(val)
        })
    }

    fn read_i64(&mut self) -> Result<i64> {
        Ok(zigzag::decode_i64(self.read_u64()?))
    }

    fn read_f32(&mut self) -> Result<f32> {
        self.atomically(|r| {
            r.require(4)?;
            let mut native = [0u8; 4];
            for &idx in r.layout().order32() {
                native[idx] = r.read_byte()?;
            }
            Ok(f32::from_bits(u32::from_ne_bytes(native)))
        })
    }

    fn read_f64(&mut self) -> Result<f64> {
        self.atomically(|r| {
            r.require(8)?;
            let mut native = [0u8; 8];
            for &idx in r.layout().order64() {
                native[idx] = r.read_byte()?;
            }
            Ok(f64::from_bits(u64::from_ne_bytes(native)))
        })
    }

    /// Read an Int32 length prefix, rejecting negative values.
    fn read_len(&mut self) -> Result<usize> {
        self.atomically(|r| {
            let len = r.read_i32()?;
            usize::try_from(len).map_err(|_| Error::InvalidLength(len))
        })
    }

    /// Raw code units, lone surrogates included.
    fn read_utf16(&mut self) -> Result<Vec<u16>> {
        self.atomically(|r| {
            let len = r.read_len()?;
            r.require(utf16_body_len(len)?)?;
            let mut units = Vec::with_capacity(len.min(PREALLOC_LIMIT));
            for _ in 0..len {
                let lo = r.read_byte()?;
                let hi = r.read_byte()?;
                units.push(u16::from_le_bytes([lo, hi]));
            }
            Ok(units)
        })
    }

    fn read_string(&mut self) -> Result<String> {
        self.atomically(|r| {
            let units = r.read_utf16()?;
            String::from_utf16(&units).map_err(|_| Error::InvalidUtf16)
        })
    }

    /// Decode a byte block into `dst`.
    ///
    /// Copies `min(encoded_len, dst.len())` bytes and returns that count,
    /// but always consumes the whole encoded block so the next value lines
    /// up.
    fn read_bytes_into(&mut self, dst: &mut [u8]) -> Result<usize> {
        self.atomically(|r| {
            let len = r.read_len()?;
            r.require(len)?;
            let n = len.min(dst.len());
            r.read_raw(&mut dst[..n])?;
            r.skip_raw(len - n)?;
            Ok(n)
        })
    }

    fn read_bytes(&mut self) -> Result<Vec<u8>> {
        self.atomically(|r| {
            let len = r.read_len()?;
            r.require(len)?;
            let mut out = Vec::with_capacity(len.min(PREALLOC_LIMIT));
            while out.len() < len {
                let start = out.len();
                let chunk = (len - start).min(PREALLOC_LIMIT);
                out.resize(start + chunk, 0);
                r.read_raw(&mut out[start..])?;
            }
            Ok(out)
        })
    }
}
