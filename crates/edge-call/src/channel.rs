//! Per-buffer call state machine.
//!
//! ```text
//! Idle ──place_args──▶ ArgsPlaced ──dispatch──▶ Dispatched ──▶ HandlerRunning
//!  ▲                                                │ unknown id        │
//!  │                                                ▼                   ▼
//!  └────────────take_result──────────────────── ResultWritten ◀─────────┘
//! ```
//!
//! The state lives on this side, not in the shared buffer, so the other side
//! cannot forge a transition. One call is in flight per channel; concurrency
//! means more channels.

use crate::buffer::SharedBuffer;
use crate::dispatch::{CallContext, DispatchTable, Reply};
use crate::envelope::CallEnvelope;
use crate::error::{EdgeError, EdgeResult};
use crate::status::CallStatus;
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,
    ArgsPlaced,
    Dispatched,
    HandlerRunning,
    ResultWritten,
}

impl fmt::Display for EnvelopeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvelopeState::Idle => write!(f, "idle"),
            EnvelopeState::ArgsPlaced => write!(f, "args_placed"),
            EnvelopeState::Dispatched => write!(f, "dispatched"),
            EnvelopeState::HandlerRunning => write!(f, "handler_running"),
            EnvelopeState::ResultWritten => write!(f, "result_written"),
        }
    }
}

/// Terminal result of one call as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallOutcome {
    pub call_id: u64,
    pub status: CallStatus,
    return_offset: u64,
}

impl CallOutcome {
    /// The return offset, only when the call succeeded.
    pub fn return_offset(&self) -> Option<u64> {
        self.status.is_ok().then_some(self.return_offset)
    }
}

/// A shared buffer plus the state of the call travelling through it.
#[derive(Debug)]
pub struct EdgeChannel {
    buffer: SharedBuffer,
    state: EnvelopeState,
}

impl EdgeChannel {
    pub fn new(buffer: SharedBuffer) -> Self {
        Self {
            buffer,
            state: EnvelopeState::Idle,
        }
    }

    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    pub fn buffer(&self) -> &SharedBuffer {
        &self.buffer
    }

    /// Mutable access for staging arguments. Only while no call is in flight.
    pub fn buffer_mut(&mut self) -> EdgeResult<&mut SharedBuffer> {
        self.expect(EnvelopeState::Idle, "stage arguments")?;
        Ok(&mut self.buffer)
    }

    /// Caller side: records `call_id` and `arg_offset` in the envelope.
    pub fn place_args(&mut self, call_id: u64, arg_offset: u64) -> EdgeResult<()> {
        self.expect(EnvelopeState::Idle, "place arguments")?;
        CallEnvelope::new(call_id, arg_offset).write(&mut self.buffer)?;
        self.state = EnvelopeState::ArgsPlaced;
        debug!(call_id, arg_offset, "Call placed");
        Ok(())
    }

    /// Serving side: runs the handler registered for the envelope's call id
    /// and writes its status exactly once.
    ///
    /// An unregistered id gets [`CallStatus::UnknownCall`] without any
    /// handler running or the payload area being touched.
    pub fn dispatch(&mut self, table: &DispatchTable) -> EdgeResult<CallStatus> {
        self.expect(EnvelopeState::ArgsPlaced, "dispatch")?;
        self.state = EnvelopeState::Dispatched;

        let mut envelope = CallEnvelope::read(&self.buffer)?;
        let call_id = envelope.call_id;

        let (status, return_offset) = match table.lookup(call_id) {
            Err(_) => {
                warn!(call_id, "No handler registered for call");
                (CallStatus::UnknownCall, 0)
            }
            Ok(handler) => {
                self.state = EnvelopeState::HandlerRunning;
                let mut ctx = CallContext::new(&mut self.buffer, call_id, envelope.arg_offset);
                match handler.handle(&mut ctx) {
                    Ok(Reply::Empty) => (CallStatus::Ok, 0),
                    Ok(Reply::Return(offset)) => (CallStatus::Ok, offset.get()),
                    Err(e) => {
                        debug!(call_id, error = %e, "Handler failed");
                        (e.status(), 0)
                    }
                }
            }
        };

        envelope.return_status = status.code();
        envelope.return_offset = return_offset;
        envelope.write(&mut self.buffer)?;
        self.state = EnvelopeState::ResultWritten;

        debug!(call_id, status = %status, return_offset, "Call dispatched");
        Ok(status)
    }

    /// Caller side: collects the terminal status and frees the envelope.
    pub fn take_result(&mut self) -> EdgeResult<CallOutcome> {
        self.expect(EnvelopeState::ResultWritten, "take result")?;
        let envelope = CallEnvelope::read(&self.buffer)?;
        let status = envelope
            .status()?
            .ok_or(EdgeError::CorruptStatus(envelope.return_status))?;
        self.state = EnvelopeState::Idle;
        Ok(CallOutcome {
            call_id: envelope.call_id,
            status,
            return_offset: envelope.return_offset,
        })
    }

    /// Tears the channel down, handing back the buffer.
    pub fn into_buffer(self) -> SharedBuffer {
        self.buffer
    }

    fn expect(&self, state: EnvelopeState, operation: &'static str) -> EdgeResult<()> {
        if self.state != state {
            return Err(EdgeError::InvalidState {
                state: self.state,
                operation,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{ENVELOPE_SIZE, PAYLOAD_OFFSET};

    fn echo(ctx: &mut CallContext<'_>) -> EdgeResult<Reply> {
        let offset = ctx.validate(ctx.arg_offset(), 4)?;
        Ok(Reply::Return(offset))
    }

    fn channel() -> EdgeChannel {
        EdgeChannel::new(SharedBuffer::new_heap(256).unwrap())
    }

    fn table() -> DispatchTable {
        let mut builder = DispatchTable::builder();
        builder.register(9, echo).unwrap();
        builder.build()
    }

    #[test]
    fn test_full_cycle() {
        let mut channel = channel();
        let table = table();

        channel.place_args(9, PAYLOAD_OFFSET).unwrap();
        assert_eq!(channel.state(), EnvelopeState::ArgsPlaced);

        assert_eq!(channel.dispatch(&table).unwrap(), CallStatus::Ok);
        assert_eq!(channel.state(), EnvelopeState::ResultWritten);

        let outcome = channel.take_result().unwrap();
        assert_eq!(outcome.call_id, 9);
        assert_eq!(outcome.return_offset(), Some(PAYLOAD_OFFSET));
        assert_eq!(channel.state(), EnvelopeState::Idle);
    }

    #[test]
    fn test_second_call_requires_terminal_status() {
        let mut channel = channel();
        channel.place_args(9, PAYLOAD_OFFSET).unwrap();
        assert!(matches!(
            channel.place_args(9, PAYLOAD_OFFSET),
            Err(EdgeError::InvalidState {
                state: EnvelopeState::ArgsPlaced,
                ..
            })
        ));
        assert!(channel.buffer_mut().is_err());
        assert!(channel.take_result().is_err());
    }

    #[test]
    fn test_dispatch_requires_placed_args() {
        let mut channel = channel();
        assert!(matches!(
            channel.dispatch(&table()),
            Err(EdgeError::InvalidState {
                state: EnvelopeState::Idle,
                ..
            })
        ));
    }

    #[test]
    fn test_handler_error_maps_to_status() {
        let mut channel = channel();
        let table = table();
        channel.place_args(9, 255).unwrap();

        assert_eq!(channel.dispatch(&table).unwrap(), CallStatus::BadOffset);
        let outcome = channel.take_result().unwrap();
        assert_eq!(outcome.status, CallStatus::BadOffset);
        assert_eq!(outcome.return_offset(), None);
    }

    #[test]
    fn test_unknown_call_leaves_payload_untouched() {
        let mut channel = channel();
        channel
            .buffer_mut()
            .unwrap()
            .region_mut(PAYLOAD_OFFSET, 256 - ENVELOPE_SIZE)
            .unwrap()
            .fill(0x5a);
        let before = channel.buffer().region(PAYLOAD_OFFSET, 256 - ENVELOPE_SIZE).unwrap().to_vec();

        channel.place_args(42, PAYLOAD_OFFSET).unwrap();
        assert_eq!(channel.dispatch(&table()).unwrap(), CallStatus::UnknownCall);

        let after = channel.buffer().region(PAYLOAD_OFFSET, 256 - ENVELOPE_SIZE).unwrap();
        assert_eq!(after, &before[..]);
        assert_eq!(channel.take_result().unwrap().status, CallStatus::UnknownCall);
    }
}
