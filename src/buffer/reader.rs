// Bit-addressable reader over a borrowed, immutable buffer.
//
// Reads are all-or-nothing: a value that runs past the end reports where it
// started and how many bytes it needed, and the cursor stays put.

use crate::buffer::cursor::BitCursor;
use crate::error::{Error, Result};
use crate::primitive::PrimitiveRead;
use crate::wire::EndianLayout;

/// Cursor-based reader of the bit-addressable wire format.
///
/// The reader never mutates or frees `data`; its capacity is `data.len()`.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    cursor: BitCursor,
    layout: &'static EndianLayout,
}

impl<'a> BitReader<'a> {
    /// Reader positioned at the start of `data`. Fails on an empty slice.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::InvalidCapacity(0));
        }
        Ok(Self {
            data,
            cursor: BitCursor::new(),
            layout: EndianLayout::host(),
        })
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    pub fn set_position(&mut self, position: usize) -> Result<()> {
        self.cursor.set_position(position, self.data.len())
    }

    #[inline]
    pub fn bit_position(&self) -> u8 {
        self.cursor.bit_position()
    }

    pub fn set_bit_position(&mut self, bit_position: u8) -> Result<()> {
        self.cursor.set_bit_position(bit_position, self.data.len())
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Whole bytes left after the cursor (a partially read byte counts as
    /// unavailable).
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.cursor.covered())
    }

    /// The underlying buffer.
    pub fn get_ref(&self) -> &'a [u8] {
        self.data
    }

    /// Fail unless an `n`-byte read at the cursor stays in bounds.
    fn check_span(&self, n: usize) -> Result<()> {
        let position = self.cursor.position();
        let fits = position
            .checked_add(self.cursor.span(n))
            .is_some_and(|end| end <= self.data.len());
        if fits {
            Ok(())
        } else {
            Err(Error::ReadOutOfRange {
                position,
                requested: n,
                capacity: self.data.len(),
            })
        }
    }
}

impl PrimitiveRead for BitReader<'_> {
    fn read_byte(&mut self) -> Result<u8> {
        self.check_span(1)?;
        Ok(self.cursor.take_byte(self.data))
    }

    fn read_bit(&mut self) -> Result<bool> {
        if self.cursor.position() >= self.data.len() {
            return Err(Error::ReadOutOfRange {
                position: self.cursor.position(),
                requested: 1,
                capacity: self.data.len(),
            });
        }
        Ok(self.cursor.take_bit(self.data))
    }

    fn layout(&self) -> &'static EndianLayout {
        self.layout
    }

    fn require(&mut self, n: usize) -> Result<()> {
        self.check_span(n)
    }

    fn atomically<T, F>(&mut self, read: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let start = self.cursor;
        let err = match read(self) {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        self.cursor = start;
        Err(match err {
            // re-anchor at the first byte of the value
            Error::ReadOutOfRange {
                position,
                requested,
                capacity,
            } => Error::ReadOutOfRange {
                position: start.position(),
                requested: position
                    .saturating_sub(start.position())
                    .saturating_add(requested),
                capacity,
            },
            other => other,
        })
    }

    fn read_raw(&mut self, dst: &mut [u8]) -> Result<()> {
        self.check_span(dst.len())?;
        if self.cursor.is_aligned() {
            let start = self.cursor.position();
            dst.copy_from_slice(&self.data[start..start + dst.len()]);
            self.cursor.advance_bytes(dst.len());
        } else {
            for slot in dst.iter_mut() {
                *slot = self.cursor.take_byte(self.data);
            }
        }
        Ok(())
    }

    fn skip_raw(&mut self, len: usize) -> Result<()> {
        self.check_span(len)?;
        self.cursor.advance_bytes(len);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_is_rejected() {
        assert!(matches!(BitReader::new(&[]), Err(Error::InvalidCapacity(0))));
    }

    #[test]
    fn read_past_end_reports_context() {
        let data = [1u8, 2];
        let mut r = BitReader::new(&data).unwrap();
        r.set_position(1).unwrap();
        match r.read_u16() {
            Err(Error::ReadOutOfRange {
                position,
                requested,
                capacity,
            }) => {
                assert_eq!(position, 1);
                assert_eq!(requested, 2);
                assert_eq!(capacity, 2);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(r.position(), 1);
        assert_eq!(r.read_u8().unwrap(), 2);
    }

    #[test]
    fn truncated_varint_leaves_cursor_on_header() {
        // header 254 announces three more bytes, only one follows
        let data = [254u8, 1];
        let mut r = BitReader::new(&data).unwrap();
        assert!(matches!(
            r.read_u32(),
            Err(Error::ReadOutOfRange {
                position: 0,
                requested: 4,
                capacity: 2
            })
        ));
        assert_eq!((r.position(), r.bit_position()), (0, 0));
        assert_eq!(r.read_u8().unwrap(), 254);
    }

    #[test]
    fn failed_read_at_bit_offset_keeps_bit_position() {
        let data = [0b1000_0000u8, 0, 0];
        let mut r = BitReader::new(&data).unwrap();
        assert!(r.read_bool().unwrap());
        // an f32 at bit offset 1 needs five physical bytes
        assert!(matches!(
            r.read_f32(),
            Err(Error::ReadOutOfRange {
                position: 0,
                requested: 4,
                ..
            })
        ));
        assert_eq!((r.position(), r.bit_position()), (0, 1));
        assert_eq!(r.read_u16().unwrap(), 0);
    }

    #[test]
    fn short_string_body_fails_without_consuming_prefix() {
        // 3 units (zigzag 6) but only two bytes of body
        let data = [6u8, b'a', 0];
        let mut r = BitReader::new(&data).unwrap();
        assert!(matches!(
            r.read_string(),
            Err(Error::ReadOutOfRange {
                position: 0,
                requested: 7,
                capacity: 3
            })
        ));
        assert_eq!(r.position(), 0);
    }

    #[test]
    fn lone_surrogate_rewinds_string_read() {
        let data = [2u8, 0x00, 0xDC];
        let mut r = BitReader::new(&data).unwrap();
        assert!(matches!(r.read_string(), Err(Error::InvalidUtf16)));
        assert_eq!(r.position(), 0);
        assert_eq!(r.read_utf16().unwrap(), [0xDC00]);
    }

    #[test]
    fn mid_byte_read_needs_spill_byte() {
        let data = [0xFFu8, 0x00];
        let mut r = BitReader::new(&data).unwrap();
        r.set_position(1).unwrap();
        r.set_bit_position(4).unwrap();
        assert!(matches!(
            r.read_byte(),
            Err(Error::ReadOutOfRange { requested: 1, .. })
        ));
        // four bits remain and can still be read one at a time
        for _ in 0..4 {
            assert!(!r.read_bit().unwrap());
        }
        assert!(r.read_bit().is_err());
    }

    #[test]
    fn fixed_width_reads_big_endian() {
        let data = [0x40u8, 0x09, 0x21, 0xFB, 0x54, 0x44, 0x2D, 0x18];
        let mut r = BitReader::new(&data).unwrap();
        assert_eq!(r.read_f64().unwrap(), std::f64::consts::PI);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn skip_past_end_fails_before_moving() {
        let data = [3u8, 1, 2];
        let mut r = BitReader::new(&data).unwrap();
        r.set_position(1).unwrap();
        assert!(r.skip_raw(3).is_err());
        assert_eq!(r.position(), 1);
    }

    #[test]
    fn truncated_block_read_keeps_framing() {
        // len 3 (zigzag 6), bytes, then a trailing marker
        let data = [6u8, 0x10, 0x20, 0x30, 0x99];
        let mut r = BitReader::new(&data).unwrap();
        let mut dst = [0u8; 1];
        assert_eq!(r.read_bytes_into(&mut dst).unwrap(), 1);
        assert_eq!(dst, [0x10]);
        assert_eq!(r.position(), 4);
        assert_eq!(r.read_u8().unwrap(), 0x99);
    }

    #[test]
    fn declared_length_beyond_buffer_fails() {
        let data = [200u8, 1, 2];
        let mut r = BitReader::new(&data).unwrap();
        assert!(matches!(r.read_bytes(), Err(Error::ReadOutOfRange { .. })));
    }
}
