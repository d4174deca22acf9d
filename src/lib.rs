//! Bitwire: a bit-addressable binary codec.
//!
//! The crate provides:
//! - Wire-format primitives: header-byte varints, ZigZag, canonical byte order (`wire`)
//! - The shared read/write contract for every primitive type (`primitive`)
//! - An in-memory codec with bit-level cursors and growable buffers (`buffer`)
//! - A streaming codec over `std::io::Read`/`Write` (`io`)
//! - An optional CLI for encoding and inspecting values (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use bitwire::{BitReader, BitWriter, PrimitiveRead, PrimitiveWrite};
//!
//! let mut w = BitWriter::new(8).unwrap();
//! w.write_bool(true).unwrap();
//! w.write_bool(false).unwrap();
//! w.write_i32(-42).unwrap();
//! w.write_str("héllo").unwrap();
//! w.write_f64(1.5).unwrap();
//!
//! let mut r = BitReader::new(w.as_slice()).unwrap();
//! assert!(r.read_bool().unwrap());
//! assert!(!r.read_bool().unwrap());
//! assert_eq!(r.read_i32().unwrap(), -42);
//! assert_eq!(r.read_string().unwrap(), "héllo");
//! assert_eq!(r.read_f64().unwrap(), 1.5);
//! ```

pub mod buffer;
pub mod error;
pub mod io;
pub mod primitive;
pub mod wire;

#[cfg(feature = "cli")]
pub mod cli;

pub use buffer::{BitReader, BitWriter, GrowEvent, WriterOptions};
pub use error::{Error, Result};
pub use io::{StreamReader, StreamWriter};
pub use primitive::{PrimitiveRead, PrimitiveWrite};
