// Wire format primitives.
//
// Everything in here is a pure function of its inputs: no cursor, no buffer
// ownership. The buffer and stream codecs lay these out byte by byte.
//
// # Modules
//
// - `varint`: header-byte varints for 32- and 64-bit magnitudes
// - `zigzag`: signed <-> unsigned mapping that keeps small magnitudes small
// - `endian`: host byte-order table for canonical (MSB-first) fixed-width values

pub mod endian;
pub mod varint;
pub mod zigzag;

pub use endian::{EndianLayout, HOST_LAYOUT};

/// Byte blocks at least this long take the bulk-copy path when the cursor
/// is byte-aligned.
pub const BULK_COPY_THRESHOLD: usize = 256;

/// Bit selector for the first (most significant) bit of a byte.
pub const TOP_BIT: u8 = 0b1000_0000;
