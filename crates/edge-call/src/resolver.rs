//! Offset resolution between a local address space and the shared buffer.
//!
//! Both directions are pure functions over integers: they never touch memory,
//! so a failed resolution performs no access at all. Callers re-resolve on
//! every use; nothing here remembers that a range was validated before.

use crate::error::{EdgeError, EdgeResult};

/// An address in this side's address space.
///
/// Opaque on purpose: it can be offset and compared, never dereferenced.
/// Memory is only reachable by handing it back to
/// [`SharedBuffer`](crate::SharedBuffer), which resolves it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalAddr(usize);

impl LocalAddr {
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> usize {
        self.0
    }

    pub fn checked_add(self, bytes: usize) -> Option<Self> {
        self.0.checked_add(bytes).map(Self)
    }
}

/// A buffer-relative offset that came out of a successful resolution.
///
/// Handlers can only report a return offset of this type, so an offset
/// built from an unchecked address never reaches the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SharedOffset(u64);

impl SharedOffset {
    pub(crate) const fn new(offset: u64) -> Self {
        Self(offset)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Translates `offset` into a local address.
///
/// Fails with [`EdgeError::BadOffset`] when `offset + size` exceeds `len` or
/// any step of the arithmetic overflows.
pub fn resolve_to_local(
    base: LocalAddr,
    len: usize,
    offset: u64,
    size: usize,
) -> EdgeResult<LocalAddr> {
    let bad = || EdgeError::BadOffset { offset, size, len };

    let start = usize::try_from(offset).map_err(|_| bad())?;
    let end = start.checked_add(size).ok_or_else(bad)?;
    if end > len {
        return Err(bad());
    }
    base.checked_add(start).ok_or_else(bad)
}

/// Translates a local address back into a buffer offset.
///
/// Fails with [`EdgeError::BadPointer`] when `addr` lies below `base` or
/// `addr + size` runs past `base + len`. An empty range may sit exactly at
/// the end of the buffer.
pub fn resolve_to_offset(
    base: LocalAddr,
    len: usize,
    addr: LocalAddr,
    size: usize,
) -> EdgeResult<u64> {
    let bad = || EdgeError::BadPointer {
        addr: addr.raw(),
        size,
        len,
    };

    let start = addr.raw().checked_sub(base.raw()).ok_or_else(bad)?;
    let end = start.checked_add(size).ok_or_else(bad)?;
    if end > len {
        return Err(bad());
    }
    u64::try_from(start).map_err(|_| bad())
}
