// Bit-addressable writer over a growable buffer.
//
// Every write computes the byte position its whole value would reach
// (including the spill byte when the cursor is mid-byte) before touching
// memory. If that exceeds capacity the buffer doubles until the write fits,
// the contents move to the new region, and the on-grow callback fires once
// per doubling. A write the ceiling rejects changes nothing.

use log::{debug, warn};

use crate::buffer::cursor::BitCursor;
use crate::buffer::storage::Storage;
use crate::error::{Error, Result};
use crate::primitive::PrimitiveWrite;
use crate::wire::{BULK_COPY_THRESHOLD, EndianLayout};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for a [`BitWriter`].
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Capacity of a self-owned buffer at construction. Ignored for
    /// borrowed buffers, whose length is the initial capacity.
    pub initial_capacity: usize,
    /// Hard ceiling for growth. `None` grows without bound.
    pub max_capacity: Option<usize>,
    /// Byte blocks at least this long are bulk-copied when the cursor is
    /// byte-aligned.
    pub bulk_copy_threshold: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            initial_capacity: 256,
            max_capacity: None,
            bulk_copy_threshold: BULK_COPY_THRESHOLD,
        }
    }
}

impl WriterOptions {
    fn validate(&self, initial_capacity: usize) -> Result<()> {
        if initial_capacity == 0 {
            return Err(Error::InvalidCapacity(initial_capacity));
        }
        if let Some(max) = self.max_capacity
            && max < initial_capacity
        {
            return Err(Error::CapacityExceeded {
                required: initial_capacity,
                max,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Growth notification
// ---------------------------------------------------------------------------

/// One capacity doubling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowEvent {
    pub old_capacity: usize,
    pub new_capacity: usize,
    /// Byte position of the write that triggered growth.
    pub position: usize,
}

/// Callback invoked after each doubling.
pub type GrowCallback<'a> = Box<dyn FnMut(&GrowEvent) + Send + 'a>;

// ---------------------------------------------------------------------------
// BitWriter
// ---------------------------------------------------------------------------

/// Cursor-based writer of the bit-addressable wire format.
///
/// # Example
/// ```
/// use bitwire::{BitReader, BitWriter, PrimitiveRead, PrimitiveWrite};
///
/// let mut w = BitWriter::new(16).unwrap();
/// w.write_bool(true).unwrap();
/// w.write_u32(70_000).unwrap();
/// w.write_str("hi").unwrap();
///
/// let mut r = BitReader::new(w.as_slice()).unwrap();
/// assert!(r.read_bool().unwrap());
/// assert_eq!(r.read_u32().unwrap(), 70_000);
/// assert_eq!(r.read_string().unwrap(), "hi");
/// ```
pub struct BitWriter<'a> {
    storage: Storage<'a>,
    cursor: BitCursor,
    layout: &'static EndianLayout,
    max_capacity: Option<usize>,
    bulk_copy_threshold: usize,
    on_grow: Option<GrowCallback<'a>>,
    grow_events: u64,
    /// Furthest byte any write has covered, so rewinding does not hide data.
    high_water: usize,
}

impl std::fmt::Debug for BitWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitWriter")
            .field("storage", &self.storage)
            .field("cursor", &self.cursor)
            .field("max_capacity", &self.max_capacity)
            .field("grow_events", &self.grow_events)
            .finish_non_exhaustive()
    }
}

impl BitWriter<'static> {
    /// Writer over a self-owned, zeroed buffer of `capacity` bytes.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_options(WriterOptions {
            initial_capacity: capacity,
            ..WriterOptions::default()
        })
    }

    /// Writer over a self-owned buffer configured by `opts`.
    pub fn with_options(opts: WriterOptions) -> Result<Self> {
        opts.validate(opts.initial_capacity)?;
        let storage = Storage::owned(opts.initial_capacity)?;
        Ok(Self::from_parts(storage, &opts))
    }
}

impl<'a> BitWriter<'a> {
    /// Writer over caller-supplied memory. The caller keeps ownership of
    /// `buf`; growth moves the data into a new self-owned region.
    pub fn borrowed(buf: &'a mut [u8]) -> Result<Self> {
        Self::borrowed_with_options(buf, &WriterOptions::default())
    }

    /// Like [`borrowed`](Self::borrowed), honoring the growth ceiling and
    /// bulk threshold in `opts`.
    pub fn borrowed_with_options(buf: &'a mut [u8], opts: &WriterOptions) -> Result<Self> {
        opts.validate(buf.len())?;
        let storage = Storage::borrowed(buf)?;
        Ok(Self::from_parts(storage, opts))
    }

    fn from_parts(storage: Storage<'a>, opts: &WriterOptions) -> Self {
        Self {
            storage,
            cursor: BitCursor::new(),
            layout: EndianLayout::host(),
            max_capacity: opts.max_capacity,
            bulk_copy_threshold: opts.bulk_copy_threshold,
            on_grow: None,
            grow_events: 0,
            high_water: 0,
        }
    }

    /// Register the growth callback, replacing any previous one.
    pub fn set_on_grow<F>(&mut self, callback: F)
    where
        F: FnMut(&GrowEvent) + Send + 'a,
    {
        self.on_grow = Some(Box::new(callback));
    }

    pub fn clear_on_grow(&mut self) {
        self.on_grow = None;
    }

    // -----------------------------------------------------------------------
    // Cursor
    // -----------------------------------------------------------------------

    #[inline]
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    pub fn set_position(&mut self, position: usize) -> Result<()> {
        self.cursor.set_position(position, self.capacity())
    }

    #[inline]
    pub fn bit_position(&self) -> u8 {
        self.cursor.bit_position()
    }

    pub fn set_bit_position(&mut self, bit_position: u8) -> Result<()> {
        self.cursor.set_bit_position(bit_position, self.capacity())
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Length of the written region, counting a partially written byte.
    ///
    /// This is the furthest byte reached by any write or by the cursor, so
    /// it can lie past the cursor after [`set_position`](Self::set_position)
    /// rewinds it.
    #[inline]
    pub fn written_len(&self) -> usize {
        self.high_water.max(self.cursor.covered())
    }

    /// Whether the current region was allocated by this writer.
    pub fn is_owned(&self) -> bool {
        self.storage.is_owned()
    }

    pub fn is_released(&self) -> bool {
        self.storage.is_released()
    }

    /// Number of doublings performed so far.
    pub fn grow_events(&self) -> u64 {
        self.grow_events
    }

    /// Bytes written so far, up to [`written_len`](Self::written_len).
    /// Bytes past a rewound cursor are included. Empty after release.
    pub fn as_slice(&self) -> &[u8] {
        match self.storage.bytes() {
            Ok(bytes) => &bytes[..self.written_len()],
            Err(_) => &[],
        }
    }

    /// The whole backing region, including bytes past the cursor.
    pub fn buffer(&self) -> Result<&[u8]> {
        self.storage.bytes()
    }

    /// Consume the writer and return the bytes written so far, with the
    /// same extent as [`as_slice`](Self::as_slice).
    pub fn into_vec(self) -> Vec<u8> {
        let len = self.written_len();
        let mut bytes = self.storage.into_vec();
        bytes.truncate(len);
        bytes
    }

    // -----------------------------------------------------------------------
    // Capacity management
    // -----------------------------------------------------------------------

    /// Resize the buffer explicitly. Never fires the growth callback.
    ///
    /// Fails below the bytes the cursor already covers, above the
    /// configured ceiling, or after release.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<()> {
        if self.storage.is_released() {
            return Err(Error::Released);
        }
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }
        let covered = self.cursor.covered();
        if capacity < covered {
            return Err(Error::CapacityBelowPosition {
                requested: capacity,
                position: covered,
            });
        }
        if let Some(max) = self.max_capacity
            && capacity > max
        {
            return Err(Error::CapacityExceeded {
                required: capacity,
                max,
            });
        }
        let old = self.capacity();
        if capacity != old {
            self.storage.reallocate(capacity)?;
            self.high_water = self.high_water.min(capacity);
            debug!("capacity set from {old} to {capacity} bytes");
        }
        Ok(())
    }

    /// Free a self-owned buffer (or detach a borrowed one). Calling this
    /// again is a no-op. Later writes fail with [`Error::Released`].
    pub fn release(&mut self) {
        if self.storage.release() {
            self.cursor.reset();
            self.high_water = 0;
        }
    }

    /// Make room for a write that reaches byte index `end` (exclusive).
    fn reserve_to(&mut self, end: usize) -> Result<()> {
        if self.storage.is_released() {
            return Err(Error::Released);
        }
        let old = self.capacity();
        if end <= old {
            return Ok(());
        }
        if let Some(max) = self.max_capacity
            && end > max
        {
            warn!("write to byte {end} rejected: maximum capacity is {max}");
            return Err(Error::CapacityExceeded { required: end, max });
        }

        let mut steps = Vec::new();
        let mut current = old;
        while current < end {
            let mut next = current.saturating_mul(2);
            if let Some(max) = self.max_capacity {
                next = next.min(max);
            }
            steps.push(GrowEvent {
                old_capacity: current,
                new_capacity: next,
                position: self.cursor.position(),
            });
            current = next;
        }

        self.storage.reallocate(current)?;
        debug!("grew buffer from {old} to {current} bytes ({} doubling(s))", steps.len());

        self.grow_events += steps.len() as u64;
        if let Some(callback) = self.on_grow.as_mut() {
            for event in &steps {
                callback(event);
            }
        }
        Ok(())
    }

    /// Make room for an `n`-byte write at the cursor.
    fn reserve_bytes(&mut self, n: usize) -> Result<()> {
        let end = self
            .cursor
            .position()
            .checked_add(self.cursor.span(n))
            .ok_or(Error::LengthOverflow(n))?;
        self.reserve_to(end)
    }

    #[inline]
    fn mark_written(&mut self) {
        self.high_water = self.high_water.max(self.cursor.covered());
    }
}

impl PrimitiveWrite for BitWriter<'_> {
    fn write_byte(&mut self, value: u8) -> Result<()> {
        self.reserve_bytes(1)?;
        let buf = self.storage.bytes_mut()?;
        self.cursor.put_byte(buf, value);
        self.mark_written();
        Ok(())
    }

    fn write_bit(&mut self, value: bool) -> Result<()> {
        self.reserve_to(self.cursor.position() + 1)?;
        let buf = self.storage.bytes_mut()?;
        self.cursor.put_bit(buf, value);
        self.mark_written();
        Ok(())
    }

    fn layout(&self) -> &'static EndianLayout {
        self.layout
    }

    fn reserve(&mut self, n: usize) -> Result<()> {
        self.reserve_bytes(n)
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve_bytes(bytes.len())?;
        let buf = self.storage.bytes_mut()?;
        if self.cursor.is_aligned() && bytes.len() >= self.bulk_copy_threshold {
            let start = self.cursor.position();
            buf[start..start + bytes.len()].copy_from_slice(bytes);
            self.cursor.advance_bytes(bytes.len());
        } else {
            for &b in bytes {
                self.cursor.put_byte(buf, b);
            }
        }
        self.mark_written();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::reader::BitReader;
    use crate::primitive::PrimitiveRead;

    #[test]
    fn zero_capacity_fails_at_construction() {
        assert!(matches!(BitWriter::new(0), Err(Error::InvalidCapacity(0))));
        let opts = WriterOptions {
            initial_capacity: 64,
            max_capacity: Some(32),
            ..Default::default()
        };
        assert!(matches!(
            BitWriter::with_options(opts),
            Err(Error::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn bools_pack_into_one_byte() {
        let pattern = [true, false, false, true, true, false, false, false];
        let mut w = BitWriter::new(1).unwrap();
        for &b in &pattern {
            w.write_bool(b).unwrap();
        }
        assert_eq!(w.position(), 1);
        assert_eq!(w.bit_position(), 0);
        assert_eq!(w.capacity(), 1);
        assert_eq!(w.as_slice(), &[0b1001_1000]);

        let mut r = BitReader::new(w.as_slice()).unwrap();
        for &b in &pattern {
            assert_eq!(r.read_bool().unwrap(), b);
        }
        assert_eq!(r.position(), 1);
    }

    #[test]
    fn byte_after_bits_straddles() {
        let mut w = BitWriter::new(4).unwrap();
        w.write_bool(true).unwrap();
        w.write_u8(0xFF).unwrap();
        assert_eq!(w.as_slice(), &[0xFF, 0x80]);
        assert_eq!((w.position(), w.bit_position()), (1, 1));
        assert_eq!(w.written_len(), 2);
    }

    #[test]
    fn spill_byte_triggers_growth() {
        let mut w = BitWriter::new(1).unwrap();
        w.write_bool(false).unwrap();
        // 1 byte at bit offset 1 touches bytes 0 and 1
        w.write_u8(0xAA).unwrap();
        assert_eq!(w.capacity(), 2);
        assert_eq!(w.grow_events(), 1);
    }

    #[test]
    fn callback_fires_once_per_doubling() {
        let mut events = Vec::new();
        {
            let mut w = BitWriter::new(2).unwrap();
            w.set_on_grow(|e| events.push(*e));
            for i in 0..10u8 {
                w.write_u8(i).unwrap();
            }
            assert_eq!(w.capacity(), 16);
            assert_eq!(w.grow_events(), 3);
        }
        let caps: Vec<_> = events
            .iter()
            .map(|e| (e.old_capacity, e.new_capacity))
            .collect();
        assert_eq!(caps, [(2, 4), (4, 8), (8, 16)]);
    }

    #[test]
    fn large_block_doubles_repeatedly_in_one_write() {
        let mut count = 0;
        let mut w = BitWriter::new(4).unwrap();
        w.set_on_grow(|_| count += 1);
        w.write_bytes(&[7u8; 100]).unwrap();
        assert_eq!(w.capacity(), 128);
        drop(w);
        // 4 -> 8 -> 16 -> 32 -> 64 -> 128
        assert_eq!(count, 5);
    }

    #[test]
    fn explicit_capacity_does_not_notify() {
        let mut fired = false;
        let mut w = BitWriter::new(8).unwrap();
        w.set_on_grow(|_| fired = true);
        w.write_u8(1).unwrap();
        w.write_u8(2).unwrap();
        w.set_capacity(64).unwrap();
        assert_eq!(w.capacity(), 64);
        w.set_capacity(2).unwrap();
        assert!(matches!(
            w.set_capacity(1),
            Err(Error::CapacityBelowPosition {
                requested: 1,
                position: 2
            })
        ));
        assert_eq!(w.as_slice(), &[1, 2]);
        drop(w);
        assert!(!fired);
    }

    #[test]
    fn shrink_respects_partial_byte() {
        let mut w = BitWriter::new(8).unwrap();
        w.write_u8(1).unwrap();
        w.write_bool(true).unwrap();
        assert!(w.set_capacity(1).is_err());
        w.set_capacity(2).unwrap();
    }

    #[test]
    fn ceiling_is_enforced() {
        let opts = WriterOptions {
            initial_capacity: 2,
            max_capacity: Some(5),
            ..Default::default()
        };
        let mut w = BitWriter::with_options(opts).unwrap();
        for i in 0..5u8 {
            w.write_u8(i).unwrap();
        }
        assert_eq!(w.capacity(), 5);
        assert!(matches!(
            w.write_u8(5),
            Err(Error::CapacityExceeded { required: 6, max: 5 })
        ));
        assert!(matches!(
            w.set_capacity(6),
            Err(Error::CapacityExceeded { .. })
        ));
        assert_eq!(w.as_slice(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn rejected_fixed_width_write_changes_nothing() {
        let opts = WriterOptions {
            initial_capacity: 4,
            max_capacity: Some(5),
            ..Default::default()
        };
        let mut w = BitWriter::with_options(opts).unwrap();
        for i in 0..4u8 {
            w.write_u8(i).unwrap();
        }
        assert!(matches!(
            w.write_u16(0xABCD),
            Err(Error::CapacityExceeded { required: 6, max: 5 })
        ));
        assert_eq!((w.position(), w.bit_position()), (4, 0));
        assert_eq!(w.as_slice(), &[0, 1, 2, 3]);
        assert_eq!(w.capacity(), 4);
        assert_eq!(w.grow_events(), 0);

        w.write_u8(4).unwrap();
        assert_eq!(w.as_slice(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn rejected_string_write_leaves_no_partial_units() {
        let opts = WriterOptions {
            initial_capacity: 4,
            max_capacity: Some(4),
            ..Default::default()
        };
        let mut w = BitWriter::with_options(opts).unwrap();
        w.write_bool(true).unwrap();
        // prefix + five units is 11 bytes, 12 physical at bit offset 1
        assert!(matches!(
            w.write_str("hello"),
            Err(Error::CapacityExceeded { required: 12, max: 4 })
        ));
        assert_eq!((w.position(), w.bit_position()), (0, 1));
        assert_eq!(w.as_slice(), &[0b1000_0000]);
        assert_eq!(w.buffer().unwrap(), &[0b1000_0000, 0, 0, 0]);

        w.write_str("h").unwrap();
        let mut r = BitReader::new(w.as_slice()).unwrap();
        assert!(r.read_bool().unwrap());
        assert_eq!(r.read_string().unwrap(), "h");
    }

    #[test]
    fn rewind_keeps_bytes_past_the_cursor() {
        let mut w = BitWriter::new(8).unwrap();
        w.write_u8(0x11).unwrap();
        w.write_u16(0x2233).unwrap();
        w.set_position(1).unwrap();
        w.write_u8(0x44).unwrap();
        assert_eq!(w.position(), 2);
        assert_eq!(w.written_len(), 3);
        assert_eq!(w.as_slice(), &[0x11, 0x44, 0x33]);

        let mut shrunk = BitWriter::new(8).unwrap();
        shrunk.write_raw(&[1, 2, 3, 4]).unwrap();
        shrunk.set_position(2).unwrap();
        shrunk.set_capacity(2).unwrap();
        assert_eq!(shrunk.as_slice(), &[1, 2]);

        assert_eq!(w.into_vec(), [0x11, 0x44, 0x33]);
    }

    #[test]
    fn release_twice_is_harmless() {
        let mut w = BitWriter::new(16).unwrap();
        w.write_u32(1234).unwrap();
        w.release();
        w.release();
        assert!(w.is_released());
        assert_eq!(w.capacity(), 0);
        assert_eq!(w.position(), 0);
        assert!(w.as_slice().is_empty());
        assert!(matches!(w.write_u8(1), Err(Error::Released)));
        assert!(matches!(w.set_capacity(4), Err(Error::Released)));
    }

    #[test]
    fn borrowed_buffer_is_written_in_place() {
        let mut backing = [0u8; 8];
        {
            let mut w = BitWriter::borrowed(&mut backing).unwrap();
            assert!(!w.is_owned());
            w.write_i16(0x0102).unwrap();
        }
        assert_eq!(&backing[..2], &[0x01, 0x02]);
    }

    #[test]
    fn borrowed_buffer_survives_growth() {
        let mut backing = [0u8; 2];
        let bytes = {
            let mut w = BitWriter::borrowed(&mut backing).unwrap();
            w.write_u8(0xA1).unwrap();
            w.write_u8(0xA2).unwrap();
            w.write_u8(0xA3).unwrap();
            assert!(w.is_owned());
            assert_eq!(w.capacity(), 4);
            w.into_vec()
        };
        assert_eq!(bytes, [0xA1, 0xA2, 0xA3]);
        assert_eq!(backing, [0xA1, 0xA2]);
    }

    #[test]
    fn bulk_and_per_byte_paths_agree() {
        let block: Vec<u8> = (0..600u32).map(|i| (i * 7) as u8).collect();

        let mut aligned = BitWriter::new(8).unwrap();
        aligned.write_bytes(&block).unwrap();

        let mut offset = BitWriter::new(8).unwrap();
        offset.write_bool(true).unwrap();
        offset.write_bytes(&block).unwrap();

        let mut r = BitReader::new(aligned.as_slice()).unwrap();
        assert_eq!(r.read_bytes().unwrap(), block);

        let mut r = BitReader::new(offset.as_slice()).unwrap();
        assert!(r.read_bool().unwrap());
        assert_eq!(r.read_bytes().unwrap(), block);
        assert_eq!(r.bit_position(), 1);
    }

    #[test]
    fn writer_moves_across_threads() {
        let mut w = BitWriter::new(4).unwrap();
        w.set_on_grow(|e| log::trace!("grew to {}", e.new_capacity));
        let bytes = std::thread::spawn(move || {
            w.write_u64(1 << 40).unwrap();
            w.into_vec()
        })
        .join()
        .unwrap();
        assert_eq!(bytes, [253, 1, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn overwrite_after_rewind() {
        let mut w = BitWriter::new(4).unwrap();
        w.write_u8(0xFF).unwrap();
        w.write_u8(0xFF).unwrap();
        w.set_position(0).unwrap();
        w.write_bool(false).unwrap();
        w.write_bool(true).unwrap();
        assert_eq!(w.buffer().unwrap()[0], 0b0111_1111);
    }
}
