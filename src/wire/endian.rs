// Canonical byte order for fixed-width values.
//
// On the wire, 16/32/64-bit values are always most-significant byte first.
// `EndianLayout` maps logical byte index i (0 = most significant) to the
// physical index in the value's native-endian byte array, so a codec can
// emit `native[layout.order32()[i]]` for i in 0..4 and get the same bytes on
// every host. The table for the running host is computed at compile time.

/// Logical-to-physical byte index tables for 2, 4 and 8 byte values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndianLayout {
    order16: [usize; 2],
    order32: [usize; 4],
    order64: [usize; 8],
}

/// Layout for the compile target.
pub static HOST_LAYOUT: EndianLayout = EndianLayout::new(cfg!(target_endian = "little"));

const fn offsets<const N: usize>(little_endian: bool) -> [usize; N] {
    let mut table = [0usize; N];
    let mut i = 0;
    while i < N {
        table[i] = if little_endian { N - 1 - i } else { i };
        i += 1;
    }
    table
}

impl EndianLayout {
    /// Build the layout for a host with the given native byte order.
    pub const fn new(little_endian: bool) -> Self {
        Self {
            order16: offsets::<2>(little_endian),
            order32: offsets::<4>(little_endian),
            order64: offsets::<8>(little_endian),
        }
    }

    /// The layout of the running host.
    #[inline]
    pub fn host() -> &'static Self {
        &HOST_LAYOUT
    }

    #[inline]
    pub fn order16(&self) -> &[usize; 2] {
        &self.order16
    }

    #[inline]
    pub fn order32(&self) -> &[usize; 4] {
        &self.order32
    }

    #[inline]
    pub fn order64(&self) -> &[usize; 8] {
        &self.order64
    }

    /// Whether this layout describes a little-endian host.
    #[inline]
    pub fn is_little_endian(&self) -> bool {
        self.order16[0] == 1
    }
}
