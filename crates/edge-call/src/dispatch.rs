//! Call-id → handler registry.
//!
//! Registration happens on a [`DispatchTableBuilder`]. `build()` seals it
//! into a [`DispatchTable`] which has no way to add handlers, so nothing can
//! be registered once the serving side starts dispatching.

use crate::buffer::SharedBuffer;
use crate::envelope::PAYLOAD_OFFSET;
use crate::error::{EdgeError, EdgeResult};
use crate::resolver::{LocalAddr, SharedOffset};
use std::collections::HashMap;
use tracing::debug;

/// What a handler hands back on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// No result payload; the envelope's return offset is left at 0.
    Empty,
    /// Result lives at this (already resolved) offset.
    Return(SharedOffset),
}

/// Serving-side operation bound to one call id.
pub trait CallHandler: Send + Sync {
    fn handle(&self, ctx: &mut CallContext<'_>) -> EdgeResult<Reply>;
}

impl<F> CallHandler for F
where
    F: Fn(&mut CallContext<'_>) -> EdgeResult<Reply> + Send + Sync,
{
    fn handle(&self, ctx: &mut CallContext<'_>) -> EdgeResult<Reply> {
        self(ctx)
    }
}

/// View of the shared buffer handed to a running handler.
///
/// Everything goes through resolution; there is no accessor for the raw
/// buffer.
pub struct CallContext<'a> {
    buffer: &'a mut SharedBuffer,
    call_id: u64,
    arg_offset: u64,
}

impl<'a> CallContext<'a> {
    pub(crate) fn new(buffer: &'a mut SharedBuffer, call_id: u64, arg_offset: u64) -> Self {
        Self {
            buffer,
            call_id,
            arg_offset,
        }
    }

    pub fn call_id(&self) -> u64 {
        self.call_id
    }

    /// Argument offset as placed by the caller. Untrusted until resolved.
    pub fn arg_offset(&self) -> u64 {
        self.arg_offset
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Local address of the first byte after the envelope.
    pub fn payload_addr(&self) -> EdgeResult<LocalAddr> {
        self.buffer.resolve_to_local(PAYLOAD_OFFSET, 0)
    }

    /// Resolved view of `size` argument bytes.
    pub fn args(&self, size: usize) -> EdgeResult<&[u8]> {
        self.buffer.region(self.arg_offset, size)
    }

    pub fn args_mut(&mut self, size: usize) -> EdgeResult<&mut [u8]> {
        self.buffer.region_mut(self.arg_offset, size)
    }

    pub fn resolve_to_local(&self, offset: u64, size: usize) -> EdgeResult<LocalAddr> {
        self.buffer.resolve_to_local(offset, size)
    }

    pub fn resolve_to_offset(&self, addr: LocalAddr, size: usize) -> EdgeResult<SharedOffset> {
        self.buffer.resolve_to_offset(addr, size)
    }

    /// Checks that `offset`/`size` resolves and returns it as a reply offset.
    pub fn validate(&self, offset: u64, size: usize) -> EdgeResult<SharedOffset> {
        let addr = self.buffer.resolve_to_local(offset, size)?;
        self.buffer.resolve_to_offset(addr, size)
    }

    pub fn region(&self, offset: u64, size: usize) -> EdgeResult<&[u8]> {
        self.buffer.region(offset, size)
    }

    pub fn region_mut(&mut self, offset: u64, size: usize) -> EdgeResult<&mut [u8]> {
        self.buffer.region_mut(offset, size)
    }

    pub fn region_at_mut(&mut self, addr: LocalAddr, size: usize) -> EdgeResult<&mut [u8]> {
        self.buffer.region_at_mut(addr, size)
    }
}

/// Collects handlers during session initialisation.
#[derive(Default)]
pub struct DispatchTableBuilder {
    handlers: HashMap<u64, Box<dyn CallHandler>>,
}

impl DispatchTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `handler` to `call_id`.
    ///
    /// A second registration for the same id is rejected with
    /// [`EdgeError::DuplicateCall`]; the first handler stays bound.
    pub fn register<H>(&mut self, call_id: u64, handler: H) -> EdgeResult<&mut Self>
    where
        H: CallHandler + 'static,
    {
        if self.handlers.contains_key(&call_id) {
            return Err(EdgeError::DuplicateCall(call_id));
        }
        debug!(call_id, "Registered call handler");
        self.handlers.insert(call_id, Box::new(handler));
        Ok(self)
    }

    pub fn build(self) -> DispatchTable {
        DispatchTable {
            handlers: self.handlers,
        }
    }
}

/// Immutable call-id → handler mapping for one session.
pub struct DispatchTable {
    handlers: HashMap<u64, Box<dyn CallHandler>>,
}

impl DispatchTable {
    pub fn builder() -> DispatchTableBuilder {
        DispatchTableBuilder::new()
    }

    pub fn lookup(&self, call_id: u64) -> EdgeResult<&dyn CallHandler> {
        self.handlers
            .get(&call_id)
            .map(|handler| handler.as_ref())
            .ok_or(EdgeError::UnknownCall(call_id))
    }

    pub fn contains(&self, call_id: u64) -> bool {
        self.handlers.contains_key(&call_id)
    }

    /// Registered call ids in ascending order.
    pub fn call_ids(&self) -> Vec<u64> {
        let mut ids: Vec<_> = self.handlers.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchTable")
            .field("call_ids", &self.call_ids())
            .finish()
    }
}
