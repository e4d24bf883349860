//! Host-side handlers for the edge calls an enclave can make.
//!
//! | id | call          | argument            | result                         |
//! |----|---------------|---------------------|--------------------------------|
//! | 1  | PrintBuffer   | 64-byte text region | LE u64 ack at the arg offset   |
//! | 2  | PrintValue    | LE u64              | none                           |
//! | 3  | CopyReport    | 2048-byte region:   | the same region, now a report  |
//! |    |               | u32 LE len ‖ nonce  |                                |
//! | 4  | GetHostString | none                | packaged string header offset  |

use crate::dispatch::{CallContext, CallHandler, DispatchTable, DispatchTableBuilder, Reply};
use crate::error::{EdgeError, EdgeResult};
use crate::packaged::{HostPackagedStr, SharedPackagedStr};
use crate::services::{Attestor, Console, EnclaveIdentity, StringProvider};
use std::sync::Arc;
use tracing::debug;

pub const PRINT_BUFFER: u64 = 1;
pub const PRINT_VALUE: u64 = 2;
pub const COPY_REPORT: u64 = 3;
pub const GET_HOST_STRING: u64 = 4;

/// Size of the PrintBuffer argument region.
pub const PRINT_BUFFER_LEN: usize = 64;
/// Size of the PrintValue argument.
pub const VALUE_LEN: usize = 8;
/// Size of the CopyReport nonce/report region.
pub const REPORT_REGION_LEN: usize = 2048;
/// Length prefix in front of the nonce in the CopyReport region.
pub const NONCE_LEN_PREFIX: usize = 4;
/// Largest nonce CopyReport carries.
pub const MAX_NONCE_LEN: usize = REPORT_REGION_LEN - NONCE_LEN_PREFIX;

const ACK_LEN: usize = 8;

/// Renders a NUL-terminated text region and acknowledges in place.
pub struct PrintBuffer {
    console: Arc<dyn Console>,
}

impl PrintBuffer {
    pub fn new(console: Arc<dyn Console>) -> Self {
        Self { console }
    }
}

impl CallHandler for PrintBuffer {
    fn handle(&self, ctx: &mut CallContext<'_>) -> EdgeResult<Reply> {
        let ack = {
            let text = ctx.args(PRINT_BUFFER_LEN)?;
            let end = text.iter().position(|b| *b == 0).unwrap_or(text.len());
            self.console.render_bytes(&text[..end])
        };

        // The argument region is done with; reuse its head for the ack.
        let ack_addr = ctx.resolve_to_local(ctx.arg_offset(), ACK_LEN)?;
        ctx.region_at_mut(ack_addr, ACK_LEN)?
            .copy_from_slice(&ack.to_le_bytes());
        let offset = ctx.resolve_to_offset(ack_addr, ACK_LEN)?;

        debug!(ack, "PrintBuffer acknowledged");
        Ok(Reply::Return(offset))
    }
}

/// Renders a single little-endian integer.
pub struct PrintValue {
    console: Arc<dyn Console>,
}

impl PrintValue {
    pub fn new(console: Arc<dyn Console>) -> Self {
        Self { console }
    }
}

impl CallHandler for PrintValue {
    fn handle(&self, ctx: &mut CallContext<'_>) -> EdgeResult<Reply> {
        let mut raw = [0u8; VALUE_LEN];
        raw.copy_from_slice(ctx.args(VALUE_LEN)?);
        self.console.render_value(u64::from_le_bytes(raw));
        Ok(Reply::Empty)
    }
}

/// Replaces a nonce region with a signed report, in place.
pub struct CopyReport {
    attestor: Arc<dyn Attestor>,
    identity: EnclaveIdentity,
}

impl CopyReport {
    pub fn new(attestor: Arc<dyn Attestor>, identity: EnclaveIdentity) -> Self {
        Self { attestor, identity }
    }
}

impl CallHandler for CopyReport {
    fn handle(&self, ctx: &mut CallContext<'_>) -> EdgeResult<Reply> {
        let nonce = {
            let region = ctx.args(REPORT_REGION_LEN)?;
            let mut prefix = [0u8; NONCE_LEN_PREFIX];
            prefix.copy_from_slice(&region[..NONCE_LEN_PREFIX]);
            let len = u32::from_le_bytes(prefix) as usize;
            if len > MAX_NONCE_LEN {
                return Err(EdgeError::NonceTooLarge {
                    len,
                    max: MAX_NONCE_LEN,
                });
            }
            region[NONCE_LEN_PREFIX..NONCE_LEN_PREFIX + len].to_vec()
        };
        let region = ctx.args_mut(REPORT_REGION_LEN)?;
        self.attestor.sign(&self.identity, &nonce, region)?;

        let offset = ctx.validate(ctx.arg_offset(), REPORT_REGION_LEN)?;
        debug!(offset = offset.get(), "Report copied into shared region");
        Ok(Reply::Return(offset))
    }
}

/// Packages the next host string right after the envelope.
pub struct GetHostString {
    strings: Arc<dyn StringProvider>,
}

impl GetHostString {
    pub fn new(strings: Arc<dyn StringProvider>) -> Self {
        Self { strings }
    }
}

impl CallHandler for GetHostString {
    fn handle(&self, ctx: &mut CallContext<'_>) -> EdgeResult<Reply> {
        let local = HostPackagedStr::new(self.strings.next_string()?);
        let header_addr = ctx.payload_addr()?;
        let header_offset = SharedPackagedStr::package(ctx, header_addr, &local)?;

        debug!(len = local.len(), "Host string packaged");
        Ok(Reply::Return(header_offset))
    }
}

/// The collaborators behind the standard handler set.
#[derive(Clone)]
pub struct HostServices {
    pub console: Arc<dyn Console>,
    pub strings: Arc<dyn StringProvider>,
    pub attestor: Arc<dyn Attestor>,
    pub identity: EnclaveIdentity,
}

impl HostServices {
    /// Registers PrintBuffer, PrintValue, CopyReport and GetHostString.
    pub fn register_all(&self, builder: &mut DispatchTableBuilder) -> EdgeResult<()> {
        builder
            .register(PRINT_BUFFER, PrintBuffer::new(self.console.clone()))?
            .register(PRINT_VALUE, PrintValue::new(self.console.clone()))?
            .register(
                COPY_REPORT,
                CopyReport::new(self.attestor.clone(), self.identity),
            )?
            .register(GET_HOST_STRING, GetHostString::new(self.strings.clone()))?;
        Ok(())
    }

    /// A sealed table holding only the standard handlers.
    pub fn dispatch_table(&self) -> EdgeResult<DispatchTable> {
        let mut builder = DispatchTable::builder();
        self.register_all(&mut builder)?;
        Ok(builder.build())
    }
}
