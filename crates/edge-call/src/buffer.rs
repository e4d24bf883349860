//! Shared buffer owned by one session.
//!
//! The buffer is allocated once, never resized, and only ever exposes
//! resolved views. Native builds back it with an anonymous mapping so the
//! region is page aligned and zero filled; the heap is used as a fallback.

use crate::envelope::ENVELOPE_SIZE;
use crate::error::{EdgeError, EdgeResult};
use crate::resolver::{self, LocalAddr, SharedOffset};
use tracing::debug;

enum Backing {
    #[cfg(feature = "mmap")]
    Mapped(memmap2::MmapMut),
    Heap(Box<[u8]>),
}

impl Backing {
    fn bytes(&self) -> &[u8] {
        match self {
            #[cfg(feature = "mmap")]
            Backing::Mapped(map) => &map[..],
            Backing::Heap(bytes) => &bytes[..],
        }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        match self {
            #[cfg(feature = "mmap")]
            Backing::Mapped(map) => &mut map[..],
            Backing::Heap(bytes) => &mut bytes[..],
        }
    }
}

/// Fixed-length region both sides of the boundary can see.
pub struct SharedBuffer {
    len: usize,
    backing: Backing,
}

impl SharedBuffer {
    /// Allocates a zeroed buffer of `len` bytes.
    ///
    /// `len` must at least hold the call envelope.
    pub fn new(len: usize) -> EdgeResult<Self> {
        Self::check_len(len)?;

        #[cfg(feature = "mmap")]
        {
            match memmap2::MmapMut::map_anon(len) {
                Ok(map) => {
                    debug!(len, "Shared buffer mapped");
                    return Ok(Self {
                        len,
                        backing: Backing::Mapped(map),
                    });
                }
                Err(e) => {
                    debug!(len, error = %e, "Anonymous mapping failed, using heap");
                }
            }
        }

        Self::new_heap(len)
    }

    /// Allocates a zeroed heap-backed buffer of `len` bytes.
    pub fn new_heap(len: usize) -> EdgeResult<Self> {
        Self::check_len(len)?;
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(len)
            .map_err(|e| EdgeError::AllocationFailed {
                len,
                reason: e.to_string(),
            })?;
        bytes.resize(len, 0);
        Ok(Self {
            len,
            backing: Backing::Heap(bytes.into_boxed_slice()),
        })
    }

    fn check_len(len: usize) -> EdgeResult<()> {
        if len < ENVELOPE_SIZE {
            return Err(EdgeError::BufferTooSmall {
                len,
                minimum: ENVELOPE_SIZE,
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// This side's base address for the region.
    pub fn base(&self) -> LocalAddr {
        LocalAddr::from_raw(self.backing.bytes().as_ptr() as usize)
    }

    pub fn resolve_to_local(&self, offset: u64, size: usize) -> EdgeResult<LocalAddr> {
        resolver::resolve_to_local(self.base(), self.len, offset, size)
    }

    pub fn resolve_to_offset(&self, addr: LocalAddr, size: usize) -> EdgeResult<SharedOffset> {
        resolver::resolve_to_offset(self.base(), self.len, addr, size).map(SharedOffset::new)
    }

    /// Resolves `offset`/`size` and borrows that range.
    pub fn region(&self, offset: u64, size: usize) -> EdgeResult<&[u8]> {
        let start = self.index_of(self.resolve_to_local(offset, size)?);
        Ok(&self.backing.bytes()[start..start + size])
    }

    /// Resolves `offset`/`size` and mutably borrows that range.
    pub fn region_mut(&mut self, offset: u64, size: usize) -> EdgeResult<&mut [u8]> {
        let start = self.index_of(self.resolve_to_local(offset, size)?);
        Ok(&mut self.backing.bytes_mut()[start..start + size])
    }

    /// Borrows `size` bytes at a local address, after mapping it back to an offset.
    pub fn region_at(&self, addr: LocalAddr, size: usize) -> EdgeResult<&[u8]> {
        let offset = self.resolve_to_offset(addr, size)?;
        self.region(offset.get(), size)
    }

    /// Mutable counterpart of [`SharedBuffer::region_at`].
    pub fn region_at_mut(&mut self, addr: LocalAddr, size: usize) -> EdgeResult<&mut [u8]> {
        let offset = self.resolve_to_offset(addr, size)?;
        self.region_mut(offset.get(), size)
    }

    // Only called with addresses produced by `resolve_to_local` on this buffer.
    fn index_of(&self, addr: LocalAddr) -> usize {
        addr.raw() - self.base().raw()
    }
}

impl std::fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedBuffer")
            .field("len", &self.len)
            .field("base", &format_args!("{:#x}", self.base().raw()))
            .finish()
    }
}
