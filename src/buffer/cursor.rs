// Byte + bit cursor and the byte-splicing engine.
//
// A byte written at bit offset b (1..=7) straddles two physical bytes:
//
//   physical:  [ kept b bits | high 8-b bits of v ] [ low b bits of v | kept 8-b bits ]
//
// `mask` selects the top b bits (already written, kept in the current byte)
// and `inverse_mask` the low 8-b bits (kept in the next byte). Both are
// recomputed every time the bit offset changes.

use crate::error::{Error, Result};
use crate::wire::TOP_BIT;

/// Read/write position within a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitCursor {
    position: usize,
    bit_position: u8,
    mask: u8,
    inverse_mask: u8,
}

impl Default for BitCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl BitCursor {
    pub const fn new() -> Self {
        Self {
            position: 0,
            bit_position: 0,
            mask: 0,
            inverse_mask: 0xFF,
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn bit_position(&self) -> u8 {
        self.bit_position
    }

    /// Top `bit_position` bits set.
    #[inline]
    pub fn mask(&self) -> u8 {
        self.mask
    }

    /// Complement of [`mask`](Self::mask).
    #[inline]
    pub fn inverse_mask(&self) -> u8 {
        self.inverse_mask
    }

    /// Whether the cursor sits on a byte boundary.
    #[inline]
    pub fn is_aligned(&self) -> bool {
        self.bit_position == 0
    }

    /// Physical bytes touched by an `n`-byte operation at this offset.
    #[inline]
    pub fn span(&self, n: usize) -> usize {
        n + usize::from(!self.is_aligned())
    }

    /// Bytes covered so far, counting a partially written byte.
    #[inline]
    pub fn covered(&self) -> usize {
        self.span(self.position)
    }

    /// Move the byte cursor, keeping the bit offset.
    pub fn set_position(&mut self, position: usize, capacity: usize) -> Result<()> {
        if position > capacity || (position == capacity && !self.is_aligned()) {
            return Err(Error::PositionOutOfRange {
                attempted: position,
                bit_position: self.bit_position,
                capacity,
            });
        }
        self.position = position;
        Ok(())
    }

    /// Move the bit offset within the current byte.
    pub fn set_bit_position(&mut self, bit_position: u8, capacity: usize) -> Result<()> {
        if bit_position > 7 || (bit_position != 0 && self.position >= capacity) {
            return Err(Error::BitPositionOutOfRange {
                attempted: bit_position,
                position: self.position,
                capacity,
            });
        }
        self.bit_position = bit_position;
        self.update_masks();
        Ok(())
    }

    /// Back to the start of the buffer.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn update_masks(&mut self) {
        self.mask = if self.bit_position == 0 {
            0
        } else {
            0xFF << (8 - self.bit_position)
        };
        self.inverse_mask = !self.mask;
    }

    #[inline]
    pub fn advance_bytes(&mut self, n: usize) {
        self.position += n;
    }

    #[inline]
    pub fn advance_bit(&mut self) {
        if self.bit_position == 7 {
            self.bit_position = 0;
            self.position += 1;
        } else {
            self.bit_position += 1;
        }
        self.update_masks();
    }

    // -----------------------------------------------------------------------
    // Byte engine. Callers check `span` against the buffer first.
    // -----------------------------------------------------------------------

    /// Write `value` at the cursor and advance one byte.
    #[inline]
    pub fn put_byte(&mut self, buf: &mut [u8], value: u8) {
        let pos = self.position;
        if self.is_aligned() {
            buf[pos] = value;
        } else {
            let b = self.bit_position;
            buf[pos] = (buf[pos] & self.mask) | (value >> b);
            buf[pos + 1] = (buf[pos + 1] & self.inverse_mask) | (value << (8 - b));
        }
        self.position += 1;
    }

    /// Read the byte at the cursor and advance one byte.
    #[inline]
    pub fn take_byte(&mut self, buf: &[u8]) -> u8 {
        let pos = self.position;
        let value = if self.is_aligned() {
            buf[pos]
        } else {
            let b = self.bit_position;
            ((buf[pos] & self.inverse_mask) << b) | ((buf[pos + 1] & self.mask) >> (8 - b))
        };
        self.position += 1;
        value
    }

    /// Set or clear the bit at the cursor and advance one bit.
    #[inline]
    pub fn put_bit(&mut self, buf: &mut [u8], value: bool) {
        let selector = TOP_BIT >> self.bit_position;
        if value {
            buf[self.position] |= selector;
        } else {
            buf[self.position] &= !selector;
        }
        self.advance_bit();
    }

    /// Read the bit at the cursor and advance one bit.
    #[inline]
    pub fn take_bit(&mut self, buf: &[u8]) -> bool {
        let set = buf[self.position] & (TOP_BIT >> self.bit_position) != 0;
        self.advance_bit();
        set
    }
}
