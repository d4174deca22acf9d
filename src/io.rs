// Streaming variant of the codec over `std::io::Read` / `std::io::Write`.
//
// Produces and consumes exactly the bytes the in-memory BitWriter/BitReader
// do, including bit-packed booleans: a byte written mid-byte is assembled in
// a one-byte accumulator, and the pending partial byte is flushed
// zero-padded by `finish()`. There is no seeking and no capacity; the sink
// or source decides how much fits. Wrap unbuffered handles in
// `BufWriter`/`BufReader`, since single-byte calls are common.

use std::io::{self, Read, Write};

use crate::error::Result;
use crate::primitive::{PrimitiveRead, PrimitiveWrite};
use crate::wire::TOP_BIT;

// ---------------------------------------------------------------------------
// StreamWriter
// ---------------------------------------------------------------------------

/// Wire-format writer over any `Write` sink.
#[derive(Debug)]
pub struct StreamWriter<W: Write> {
    inner: W,
    /// Bits already placed in the pending byte, MSB-first.
    pending: u8,
    /// Number of valid bits in `pending` (0..=7).
    bit_position: u8,
    bytes_written: u64,
}

impl<W: Write> StreamWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            pending: 0,
            bit_position: 0,
            bytes_written: 0,
        }
    }

    /// Bits written into the pending (not yet emitted) byte.
    pub fn bit_position(&self) -> u8 {
        self.bit_position
    }

    /// Whole bytes handed to the sink so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    fn emit(&mut self, byte: u8) -> io::Result<()> {
        self.inner.write_all(&[byte])?;
        self.bytes_written += 1;
        Ok(())
    }

    /// Emit the pending partial byte (zero-padded), flush, and return the
    /// sink.
    pub fn finish(mut self) -> Result<W> {
        if self.bit_position != 0 {
            let byte = self.pending;
            self.emit(byte)?;
            self.pending = 0;
            self.bit_position = 0;
        }
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> PrimitiveWrite for StreamWriter<W> {
    fn write_byte(&mut self, value: u8) -> Result<()> {
        if self.bit_position == 0 {
            self.emit(value)?;
        } else {
            let b = self.bit_position;
            let out = self.pending | (value >> b);
            self.emit(out)?;
            self.pending = value << (8 - b);
        }
        Ok(())
    }

    fn write_bit(&mut self, value: bool) -> Result<()> {
        if value {
            self.pending |= TOP_BIT >> self.bit_position;
        }
        self.bit_position += 1;
        if self.bit_position == 8 {
            let byte = self.pending;
            self.emit(byte)?;
            self.pending = 0;
            self.bit_position = 0;
        }
        Ok(())
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        if self.bit_position == 0 {
            self.inner.write_all(bytes)?;
            self.bytes_written += bytes.len() as u64;
            return Ok(());
        }
        for &b in bytes {
            self.write_byte(b)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// StreamReader
// ---------------------------------------------------------------------------

/// Wire-format reader over any `Read` source.
#[derive(Debug)]
pub struct StreamReader<R: Read> {
    inner: R,
    /// Last byte pulled from the source while mid-byte.
    current: u8,
    /// Bits of `current` already consumed (0 means no partial byte held).
    bit_position: u8,
    bytes_read: u64,
}

impl<R: Read> StreamReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            current: 0,
            bit_position: 0,
            bytes_read: 0,
        }
    }

    pub fn bit_position(&self) -> u8 {
        self.bit_position
    }

    /// Bytes pulled from the source so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Return the source. Unconsumed bits of a partial byte are dropped.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn pull(&mut self) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        self.inner.read_exact(&mut buf)?;
        self.bytes_read += 1;
        Ok(buf[0])
    }
}

impl<R: Read> PrimitiveRead for StreamReader<R> {
    fn read_byte(&mut self) -> Result<u8> {
        if self.bit_position == 0 {
            return Ok(self.pull()?);
        }
        let b = self.bit_position;
        let next = self.pull()?;
        let value = (self.current << b) | (next >> (8 - b));
        self.current = next;
        Ok(value)
    }

    fn read_bit(&mut self) -> Result<bool> {
        if self.bit_position == 0 {
            self.current = self.pull()?;
        }
        let set = self.current & (TOP_BIT >> self.bit_position) != 0;
        self.bit_position = (self.bit_position + 1) % 8;
        Ok(set)
    }

    fn read_raw(&mut self, dst: &mut [u8]) -> Result<()> {
        if self.bit_position == 0 {
            self.inner.read_exact(dst)?;
            self.bytes_read += dst.len() as u64;
            return Ok(());
        }
        for slot in dst.iter_mut() {
            *slot = self.read_byte()?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
