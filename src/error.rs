// Error type shared by the buffer codec, the streaming codec and the CLI.
//
// Every failure is local to one operation: bad configuration, a cursor moved
// out of bounds, a read past the end of the buffer, or a corrupt/foreign
// payload. Nothing here is retried.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Capacity must be greater than zero.
    #[error("invalid capacity {0}: must be greater than zero")]
    InvalidCapacity(usize),

    /// A byte position outside `0..=capacity`, or `capacity` itself while
    /// the bit offset is non-zero.
    #[error("position {attempted} out of range (bit position {bit_position}, capacity {capacity})")]
    PositionOutOfRange {
        attempted: usize,
        bit_position: u8,
        capacity: usize,
    },

    /// A bit offset above 7, or any non-zero bit offset while the byte
    /// cursor sits at `capacity`.
    #[error("bit position {attempted} out of range (position {position}, capacity {capacity})")]
    BitPositionOutOfRange {
        attempted: u8,
        position: usize,
        capacity: usize,
    },

    /// A read needing `requested` more physical bytes than the buffer holds.
    #[error("read of {requested} byte(s) at position {position} exceeds capacity {capacity}")]
    ReadOutOfRange {
        position: usize,
        requested: usize,
        capacity: usize,
    },

    /// Growth could not produce a buffer large enough for the write.
    #[error("write needs {required} bytes but maximum capacity is {max}")]
    CapacityExceeded { required: usize, max: usize },

    /// `set_capacity` below the bytes the cursor already covers.
    #[error("capacity {requested} is below cursor position {position}")]
    CapacityBelowPosition { requested: usize, position: usize },

    /// The owned buffer has already been released.
    #[error("buffer has been released")]
    Released,

    /// A decoded length prefix was negative.
    #[error("invalid length prefix {0}")]
    InvalidLength(i32),

    /// A payload too long to frame with an Int32 length prefix.
    #[error("length {0} does not fit in an Int32 length prefix")]
    LengthOverflow(usize),

    /// A decoded string was not valid UTF-16.
    #[error("invalid UTF-16 string payload")]
    InvalidUtf16,

    /// A `char` that is not a single UTF-16 code unit, or a decoded code
    /// unit that is not a scalar value.
    #[error("character {0:#06X} is not representable as a single UTF-16 code unit")]
    InvalidChar(u32),

    /// I/O error from a streaming reader or writer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<Error> for std::io::Error {
    fn from(e: Error) -> std::io::Error {
        match e {
            Error::Io(inner) => inner,
            Error::ReadOutOfRange { .. } => {
                std::io::Error::new(std::io::ErrorKind::UnexpectedEof, e)
            }
            other => std::io::Error::new(std::io::ErrorKind::InvalidData, other),
        }
    }
}
