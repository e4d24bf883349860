//! Call envelope layout.

use crate::buffer::SharedBuffer;
use crate::error::{EdgeError, EdgeResult};
use crate::status::{CallStatus, STATUS_PENDING};

/// The envelope always sits at the front of the shared buffer.
pub const ENVELOPE_OFFSET: u64 = 0;

/// Four little-endian `u64` words, no padding.
pub const ENVELOPE_SIZE: usize = 32;

/// First byte of the payload area.
pub const PAYLOAD_OFFSET: u64 = ENVELOPE_SIZE as u64;

/// Metadata for the single call in flight on a buffer.
///
/// Wire layout (little-endian):
///
/// | bytes   | field           |
/// |---------|-----------------|
/// | 0..8    | `call_id`       |
/// | 8..16   | `arg_offset`    |
/// | 16..24  | `return_status` |
/// | 24..32  | `return_offset` |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallEnvelope {
    pub call_id: u64,
    pub arg_offset: u64,
    pub return_status: u64,
    pub return_offset: u64,
}

impl CallEnvelope {
    /// Envelope for a freshly placed call: status pending, no return offset.
    pub const fn new(call_id: u64, arg_offset: u64) -> Self {
        Self {
            call_id,
            arg_offset,
            return_status: STATUS_PENDING,
            return_offset: 0,
        }
    }

    pub fn to_le_bytes(&self) -> [u8; ENVELOPE_SIZE] {
        let mut bytes = [0u8; ENVELOPE_SIZE];
        bytes[0..8].copy_from_slice(&self.call_id.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.arg_offset.to_le_bytes());
        bytes[16..24].copy_from_slice(&self.return_status.to_le_bytes());
        bytes[24..32].copy_from_slice(&self.return_offset.to_le_bytes());
        bytes
    }

    pub fn from_le_bytes(bytes: [u8; ENVELOPE_SIZE]) -> Self {
        Self {
            call_id: word(&bytes, 0),
            arg_offset: word(&bytes, 1),
            return_status: word(&bytes, 2),
            return_offset: word(&bytes, 3),
        }
    }

    /// Reads the envelope from the front of `buffer`.
    pub fn read(buffer: &SharedBuffer) -> EdgeResult<Self> {
        let mut bytes = [0u8; ENVELOPE_SIZE];
        bytes.copy_from_slice(buffer.region(ENVELOPE_OFFSET, ENVELOPE_SIZE)?);
        Ok(Self::from_le_bytes(bytes))
    }

    /// Writes the envelope to the front of `buffer`.
    pub fn write(&self, buffer: &mut SharedBuffer) -> EdgeResult<()> {
        buffer
            .region_mut(ENVELOPE_OFFSET, ENVELOPE_SIZE)?
            .copy_from_slice(&self.to_le_bytes());
        Ok(())
    }

    /// Decoded status; `None` while the call is still pending.
    pub fn status(&self) -> EdgeResult<Option<CallStatus>> {
        if self.return_status == STATUS_PENDING {
            return Ok(None);
        }
        CallStatus::from_code(self.return_status)
            .map(Some)
            .ok_or(EdgeError::CorruptStatus(self.return_status))
    }
}

fn word(bytes: &[u8; ENVELOPE_SIZE], index: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[index * 8..index * 8 + 8]);
    u64::from_le_bytes(raw)
}
