//! Packaged strings: payloads whose size the producer only learns at call time.
//!
//! The producer holds the local form (the bytes). The handler converts it to
//! the shared form, a `{str_offset, len}` header followed by the bytes, which
//! the other side can resolve on its own.

use crate::dispatch::CallContext;
use crate::error::{EdgeError, EdgeResult};
use crate::resolver::{LocalAddr, SharedOffset};

/// Size of the encoded [`SharedPackagedStr`] header.
pub const PACKAGED_HEADER_SIZE: usize = 16;

/// Local form: bytes as the producer handed them over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPackagedStr {
    bytes: Vec<u8>,
}

impl HostPackagedStr {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Shared form: where the bytes sit in the buffer and how many there are.
///
/// Encoded as two little-endian `u64`s, `str_offset` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedPackagedStr {
    pub str_offset: u64,
    pub len: u64,
}

impl SharedPackagedStr {
    pub fn to_le_bytes(&self) -> [u8; PACKAGED_HEADER_SIZE] {
        let mut bytes = [0u8; PACKAGED_HEADER_SIZE];
        bytes[0..8].copy_from_slice(&self.str_offset.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.len.to_le_bytes());
        bytes
    }

    pub fn from_le_bytes(bytes: [u8; PACKAGED_HEADER_SIZE]) -> Self {
        let mut offset = [0u8; 8];
        let mut len = [0u8; 8];
        offset.copy_from_slice(&bytes[0..8]);
        len.copy_from_slice(&bytes[8..16]);
        Self {
            str_offset: u64::from_le_bytes(offset),
            len: u64::from_le_bytes(len),
        }
    }

    /// Writes `local` at `header_addr` in shared form: header first, bytes
    /// immediately after.
    ///
    /// Both ranges are resolved before anything is written, so a string that
    /// does not fit fails with [`EdgeError::BadPointer`] and leaves the
    /// buffer untouched.
    pub fn package(
        ctx: &mut CallContext<'_>,
        header_addr: LocalAddr,
        local: &HostPackagedStr,
    ) -> EdgeResult<SharedOffset> {
        let header_offset = ctx.resolve_to_offset(header_addr, PACKAGED_HEADER_SIZE)?;
        let str_addr = header_addr
            .checked_add(PACKAGED_HEADER_SIZE)
            .ok_or(EdgeError::BadPointer {
                addr: header_addr.raw(),
                size: PACKAGED_HEADER_SIZE,
                len: ctx.buffer_len(),
            })?;
        let str_offset = ctx.resolve_to_offset(str_addr, local.len())?;

        let header = SharedPackagedStr {
            str_offset: str_offset.get(),
            len: local.len() as u64,
        };
        ctx.region_at_mut(header_addr, PACKAGED_HEADER_SIZE)?
            .copy_from_slice(&header.to_le_bytes());
        ctx.region_at_mut(str_addr, local.len())?
            .copy_from_slice(local.as_bytes());

        Ok(header_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SharedBuffer;

    #[test]
    fn test_header_encoding() {
        let header = SharedPackagedStr {
            str_offset: 48,
            len: 5,
        };
        let bytes = header.to_le_bytes();
        assert_eq!(bytes[0], 48);
        assert_eq!(bytes[8], 5);
        assert_eq!(SharedPackagedStr::from_le_bytes(bytes), header);
    }

    #[test]
    fn test_package_rejects_without_partial_write() {
        let mut buffer = SharedBuffer::new_heap(64).unwrap();
        let mut ctx = CallContext::new(&mut buffer, 4, 0);
        let addr = ctx.payload_addr().unwrap();
        let local = HostPackagedStr::new(vec![b'x'; 17]);

        assert!(matches!(
            SharedPackagedStr::package(&mut ctx, addr, &local),
            Err(EdgeError::BadPointer { .. })
        ));
        assert!(buffer.region(0, 64).unwrap().iter().all(|b| *b == 0));
    }
}
