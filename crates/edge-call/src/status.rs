//! Envelope status codes.

use std::fmt;

/// Marker stored in `return_status` while a call is in flight. Never terminal.
pub const STATUS_PENDING: u64 = u64::MAX;

/// Terminal status of one call.
///
/// Values are stable within a build: new codes are appended, existing ones
/// are never renumbered.
#[repr(u64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallStatus {
    Ok = 0,
    /// No handler registered for the call id
    UnknownCall = 1,
    /// An offset did not resolve inside the buffer
    BadOffset = 2,
    /// A local address/size did not map to a valid offset
    BadPointer = 3,
    /// A collaborator behind the handler failed
    HandlerError = 4,
}

impl CallStatus {
    pub const fn code(self) -> u64 {
        self as u64
    }

    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(CallStatus::Ok),
            1 => Some(CallStatus::UnknownCall),
            2 => Some(CallStatus::BadOffset),
            3 => Some(CallStatus::BadPointer),
            4 => Some(CallStatus::HandlerError),
            _ => None,
        }
    }

    pub fn is_ok(self) -> bool {
        self == CallStatus::Ok
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallStatus::Ok => write!(f, "ok"),
            CallStatus::UnknownCall => write!(f, "unknown_call"),
            CallStatus::BadOffset => write!(f, "bad_offset"),
            CallStatus::BadPointer => write!(f, "bad_pointer"),
            CallStatus::HandlerError => write!(f, "handler_error"),
        }
    }
}
