// In-memory bit-addressable codec.
//
// - `cursor`: byte + bit position, cached masks, byte splicing
// - `storage`: borrowed/owned backing region, reallocation, release
// - `writer`: BitWriter: growth policy and on-grow notification
// - `reader`: BitReader: bounds-checked reads over a borrowed slice

pub mod cursor;
pub mod reader;
pub mod storage;
pub mod writer;

pub use cursor::BitCursor;
pub use reader::BitReader;
pub use storage::Storage;
pub use writer::{BitWriter, GrowCallback, GrowEvent, WriterOptions};
