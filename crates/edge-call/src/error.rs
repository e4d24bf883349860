//! Edge-call error types

use crate::channel::EnvelopeState;
use crate::status::CallStatus;
use thiserror::Error;

/// Errors raised by the substrate.
///
/// Resolution failures (`BadOffset`, `BadPointer`) and `UnknownCall` are
/// recoverable: the dispatcher turns them into an envelope status instead of
/// letting them cross the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EdgeError {
    #[error("Offset {offset:#x} (+{size} bytes) does not resolve inside a {len}-byte buffer")]
    BadOffset { offset: u64, size: usize, len: usize },

    #[error("Address {addr:#x} (+{size} bytes) does not map into a {len}-byte buffer")]
    BadPointer { addr: usize, size: usize, len: usize },

    #[error("No handler registered for call id {0}")]
    UnknownCall(u64),

    #[error("Call id {0} is already registered")]
    DuplicateCall(u64),

    #[error("Envelope is {state}, cannot {operation}")]
    InvalidState {
        state: EnvelopeState,
        operation: &'static str,
    },

    #[error("Call {call_id} returned status {status}")]
    CallFailed { call_id: u64, status: CallStatus },

    #[error("Envelope holds unrecognised status value {0:#x}")]
    CorruptStatus(u64),

    #[error("Shared buffer of {len} bytes is below the {minimum}-byte minimum")]
    BufferTooSmall { len: usize, minimum: usize },

    #[error("Failed to allocate shared buffer of {len} bytes: {reason}")]
    AllocationFailed { len: usize, reason: String },

    #[error("Payload of {len} bytes exceeds the {max}-byte argument region")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("Nonce of {len} bytes exceeds the {max}-byte report region")]
    NonceTooLarge { len: usize, max: usize },

    #[error("Collaborator failed: {0}")]
    Collaborator(String),
}

impl EdgeError {
    /// Status code written to the envelope when a handler fails with this error.
    pub fn status(&self) -> CallStatus {
        match self {
            EdgeError::BadOffset { .. } => CallStatus::BadOffset,
            EdgeError::BadPointer { .. } => CallStatus::BadPointer,
            EdgeError::UnknownCall(_) => CallStatus::UnknownCall,
            EdgeError::CallFailed { status, .. } => *status,
            _ => CallStatus::HandlerError,
        }
    }
}

pub type EdgeResult<T> = Result<T, EdgeError>;
