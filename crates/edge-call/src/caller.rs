//! Calling side of the protocol.
//!
//! [`EdgeCaller`] stages arguments right after the envelope, places the
//! call, crosses the boundary and copies results back out. The crossing is
//! synchronous: `ocall` returns only once the serving side has written a
//! terminal status.

use crate::channel::EdgeChannel;
use crate::dispatch::DispatchTable;
use crate::envelope::PAYLOAD_OFFSET;
use crate::error::{EdgeError, EdgeResult};
use crate::handlers::{
    COPY_REPORT, GET_HOST_STRING, MAX_NONCE_LEN, NONCE_LEN_PREFIX, PRINT_BUFFER, PRINT_BUFFER_LEN,
    PRINT_VALUE, REPORT_REGION_LEN,
};
use crate::packaged::{SharedPackagedStr, PACKAGED_HEADER_SIZE};
use tracing::debug;

/// A transfer of control to the serving side.
pub trait Boundary {
    /// Runs the call currently placed on `channel` to completion.
    fn cross(&self, channel: &mut EdgeChannel) -> EdgeResult<()>;
}

impl Boundary for DispatchTable {
    fn cross(&self, channel: &mut EdgeChannel) -> EdgeResult<()> {
        channel.dispatch(self).map(|_| ())
    }
}

pub struct EdgeCaller<'a> {
    channel: &'a mut EdgeChannel,
    boundary: &'a dyn Boundary,
}

impl<'a> EdgeCaller<'a> {
    pub fn new(channel: &'a mut EdgeChannel, boundary: &'a dyn Boundary) -> Self {
        Self { channel, boundary }
    }

    /// Makes one call.
    ///
    /// `args` is copied into the payload area; on `Ok`, `ret.len()` bytes are
    /// copied from the return offset into `ret`. Any other status becomes
    /// [`EdgeError::CallFailed`]. Returns the return offset.
    pub fn ocall(&mut self, call_id: u64, args: &[u8], ret: &mut [u8]) -> EdgeResult<u64> {
        let buffer = self.channel.buffer_mut()?;
        let arg_addr = buffer.resolve_to_local(PAYLOAD_OFFSET, 0)?;
        let arg_offset = buffer.resolve_to_offset(arg_addr, args.len())?.get();
        buffer.region_mut(arg_offset, args.len())?.copy_from_slice(args);

        self.channel.place_args(call_id, arg_offset)?;
        self.boundary.cross(self.channel)?;
        let outcome = self.channel.take_result()?;

        let return_offset = outcome.return_offset().ok_or(EdgeError::CallFailed {
            call_id,
            status: outcome.status,
        })?;
        if !ret.is_empty() {
            ret.copy_from_slice(self.channel.buffer().region(return_offset, ret.len())?);
        }

        debug!(call_id, return_offset, "ocall returned");
        Ok(return_offset)
    }

    /// Length of the shared buffer this caller works through.
    pub fn buffer_len(&self) -> usize {
        self.channel.buffer().len()
    }

    /// Copies `len` bytes at `offset` out of the shared buffer.
    pub fn copy_from_shared(&self, offset: u64, len: usize) -> EdgeResult<Vec<u8>> {
        Ok(self.channel.buffer().region(offset, len)?.to_vec())
    }

    /// Prints `text` through PrintBuffer and returns the host's acknowledgement.
    pub fn print_buffer(&mut self, text: &str) -> EdgeResult<u64> {
        // One byte is kept for the terminating NUL.
        if text.len() >= PRINT_BUFFER_LEN {
            return Err(EdgeError::PayloadTooLarge {
                len: text.len(),
                max: PRINT_BUFFER_LEN - 1,
            });
        }
        let mut region = [0u8; PRINT_BUFFER_LEN];
        region[..text.len()].copy_from_slice(text.as_bytes());

        let mut ack = [0u8; 8];
        self.ocall(PRINT_BUFFER, &region, &mut ack)?;
        Ok(u64::from_le_bytes(ack))
    }

    pub fn print_value(&mut self, value: u64) -> EdgeResult<()> {
        self.ocall(PRINT_VALUE, &value.to_le_bytes(), &mut [])?;
        Ok(())
    }

    /// Fetches the next host string.
    pub fn host_string(&mut self) -> EdgeResult<Vec<u8>> {
        let mut raw = [0u8; PACKAGED_HEADER_SIZE];
        self.ocall(GET_HOST_STRING, &[], &mut raw)?;
        let header = SharedPackagedStr::from_le_bytes(raw);
        let len = usize::try_from(header.len).map_err(|_| EdgeError::BadOffset {
            offset: header.str_offset,
            size: usize::MAX,
            len: self.channel.buffer().len(),
        })?;
        self.copy_from_shared(header.str_offset, len)
    }

    /// Sends `nonce` through CopyReport and returns the report region.
    ///
    /// The region carries the nonce behind a u32 LE length, zero padded to
    /// the fixed region size. A nonce over [`MAX_NONCE_LEN`] is rejected
    /// rather than cut down.
    pub fn copy_report(&mut self, nonce: &[u8]) -> EdgeResult<Vec<u8>> {
        if nonce.len() > MAX_NONCE_LEN {
            return Err(EdgeError::NonceTooLarge {
                len: nonce.len(),
                max: MAX_NONCE_LEN,
            });
        }
        let mut region = vec![0u8; REPORT_REGION_LEN];
        region[..NONCE_LEN_PREFIX].copy_from_slice(&(nonce.len() as u32).to_le_bytes());
        region[NONCE_LEN_PREFIX..NONCE_LEN_PREFIX + nonce.len()].copy_from_slice(nonce);

        let mut report = vec![0u8; REPORT_REGION_LEN];
        self.ocall(COPY_REPORT, &region, &mut report)?;
        Ok(report)
    }
}
