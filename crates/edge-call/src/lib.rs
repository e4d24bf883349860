//! # Edge Call
//!
//! Synchronous call substrate between an enclave and the host around it.
//!
//! Both sides share one fixed-length buffer. Neither trusts addresses coming
//! from the other, so every access goes through the offset resolver:
//!
//! ```text
//! ┌───────────────────────────── SharedBuffer (L bytes) ─────────────────────────────┐
//! │ [0,32)  CallEnvelope { call_id, arg_offset, return_status, return_offset }  (LE) │
//! │ [32,L)  payload area, addressed only by offsets resolved against this buffer     │
//! └──────────────────────────────────────────────────────────────────────────────────┘
//!
//!   caller (EdgeCaller)                       serving side (DispatchTable)
//!   ───────────────────                       ────────────────────────────
//!   copy args → payload
//!   place_args(call_id, offset)   ──cross──▶  dispatch(): lookup call_id
//!                                             handler resolves args, writes result
//!   take_result() ◀──────────────────────────  status written exactly once
//!   resolve return_offset (Ok only)
//! ```
//!
//! ## Modules
//!
//! - [`resolver`]: pure `offset ⇄ address` translation with overflow checks
//! - [`buffer`]: owned shared region exposing only resolved views
//! - [`envelope`] / [`channel`]: fixed-layout envelope and the per-buffer call state machine
//! - [`dispatch`]: call-id → handler registry, sealed before serving starts
//! - [`handlers`]: PrintBuffer, PrintValue, CopyReport, GetHostString
//! - [`caller`]: the calling side (`ocall`, `copy_from_shared`)

pub mod buffer;
pub mod caller;
pub mod channel;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod packaged;
pub mod resolver;
pub mod services;
pub mod status;

pub use buffer::SharedBuffer;
pub use caller::{Boundary, EdgeCaller};
pub use channel::{CallOutcome, EdgeChannel, EnvelopeState};
pub use dispatch::{CallContext, CallHandler, DispatchTable, DispatchTableBuilder, Reply};
pub use envelope::{CallEnvelope, ENVELOPE_OFFSET, ENVELOPE_SIZE, PAYLOAD_OFFSET};
pub use error::{EdgeError, EdgeResult};
pub use handlers::{
    HostServices, COPY_REPORT, GET_HOST_STRING, MAX_NONCE_LEN, NONCE_LEN_PREFIX, PRINT_BUFFER,
    PRINT_BUFFER_LEN, PRINT_VALUE, REPORT_REGION_LEN, VALUE_LEN,
};
pub use packaged::{HostPackagedStr, SharedPackagedStr, PACKAGED_HEADER_SIZE};
pub use resolver::{LocalAddr, SharedOffset};
pub use services::{Attestor, Console, EnclaveIdentity, StringProvider};
pub use status::{CallStatus, STATUS_PENDING};
