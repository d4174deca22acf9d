// Backing storage with an ownership tag.
//
// Borrowed regions belong to the caller and are never freed here; when a
// borrowed region is outgrown the new region is allocated by us and the
// old slice is simply let go. Owned regions are freed on `release` (once)
// or on drop.

use log::{debug, trace};

use crate::error::{Error, Result};

enum Region<'a> {
    Borrowed(&'a mut [u8]),
    Owned(Vec<u8>),
    Released,
}

/// Bounds-checked byte region used by [`BitWriter`](super::BitWriter).
pub struct Storage<'a> {
    region: Region<'a>,
}

impl std::fmt::Debug for Storage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.region {
            Region::Borrowed(_) => "borrowed",
            Region::Owned(_) => "owned",
            Region::Released => "released",
        };
        f.debug_struct("Storage")
            .field("kind", &kind)
            .field("capacity", &self.capacity())
            .finish()
    }
}

impl<'a> Storage<'a> {
    /// Allocate a zeroed, self-owned region.
    pub fn owned(capacity: usize) -> Result<Storage<'static>> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }
        Ok(Storage {
            region: Region::Owned(vec![0u8; capacity]),
        })
    }

    /// Wrap a caller-supplied region.
    pub fn borrowed(buf: &'a mut [u8]) -> Result<Self> {
        if buf.is_empty() {
            return Err(Error::InvalidCapacity(0));
        }
        Ok(Self {
            region: Region::Borrowed(buf),
        })
    }

    pub fn capacity(&self) -> usize {
        match &self.region {
            Region::Borrowed(buf) => buf.len(),
            Region::Owned(buf) => buf.len(),
            Region::Released => 0,
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self.region, Region::Owned(_))
    }

    pub fn is_released(&self) -> bool {
        matches!(self.region, Region::Released)
    }

    pub fn bytes(&self) -> Result<&[u8]> {
        match &self.region {
            Region::Borrowed(buf) => Ok(&buf[..]),
            Region::Owned(buf) => Ok(&buf[..]),
            Region::Released => Err(Error::Released),
        }
    }

    pub fn bytes_mut(&mut self) -> Result<&mut [u8]> {
        match &mut self.region {
            Region::Borrowed(buf) => Ok(&mut buf[..]),
            Region::Owned(buf) => Ok(&mut buf[..]),
            Region::Released => Err(Error::Released),
        }
    }

    /// Move the contents into a fresh owned region of `new_capacity`
    /// bytes. Bytes past the old capacity are zero; bytes past the new
    /// capacity are dropped.
    pub fn reallocate(&mut self, new_capacity: usize) -> Result<()> {
        if new_capacity == 0 {
            return Err(Error::InvalidCapacity(new_capacity));
        }
        let old = self.bytes()?;
        let keep = old.len().min(new_capacity);
        let mut fresh = vec![0u8; new_capacity];
        fresh[..keep].copy_from_slice(&old[..keep]);
        if let Region::Borrowed(_) = self.region {
            trace!("leaving borrowed region of {} bytes to its owner", old.len());
        }
        // An owned predecessor is dropped here; a borrowed one is only unreferenced.
        self.region = Region::Owned(fresh);
        Ok(())
    }

    /// Free an owned region or detach a borrowed one. Returns `false` if the
    /// storage was already released.
    pub fn release(&mut self) -> bool {
        match std::mem::replace(&mut self.region, Region::Released) {
            Region::Owned(buf) => {
                debug!("released owned buffer of {} bytes", buf.len());
                true
            }
            Region::Borrowed(buf) => {
                debug!("detached borrowed buffer of {} bytes", buf.len());
                true
            }
            Region::Released => {
                trace!("release on an already released buffer ignored");
                false
            }
        }
    }

    /// Take the owned bytes out, copying a borrowed region.
    pub fn into_vec(self) -> Vec<u8> {
        match self.region {
            Region::Borrowed(buf) => buf.to_vec(),
            Region::Owned(buf) => buf,
            Region::Released => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(Storage::owned(0), Err(Error::InvalidCapacity(0))));
        let mut empty: [u8; 0] = [];
        assert!(Storage::borrowed(&mut empty).is_err());
    }

    #[test]
    fn reallocate_borrowed_leaves_caller_memory_intact() {
        let mut backing = [1u8, 2, 3, 4];
        {
            let mut s = Storage::borrowed(&mut backing).unwrap();
            assert!(!s.is_owned());
            s.reallocate(8).unwrap();
            assert!(s.is_owned());
            assert_eq!(s.bytes().unwrap(), &[1, 2, 3, 4, 0, 0, 0, 0]);
            s.bytes_mut().unwrap()[0] = 9;
        }
        assert_eq!(backing, [1, 2, 3, 4]);
    }

    #[test]
    fn shrink_truncates() {
        let mut s = Storage::owned(4).unwrap();
        s.bytes_mut().unwrap().copy_from_slice(&[5, 6, 7, 8]);
        s.reallocate(2).unwrap();
        assert_eq!(s.bytes().unwrap(), &[5, 6]);
    }

    #[test]
    fn release_is_idempotent() {
        let mut s = Storage::owned(16).unwrap();
        assert!(s.release());
        assert!(!s.release());
        assert!(s.is_released());
        assert_eq!(s.capacity(), 0);
        assert!(matches!(s.bytes(), Err(Error::Released)));
        assert!(matches!(s.reallocate(4), Err(Error::Released)));
    }
}
