//! Message processor contract
//!
//! One processor per protocol operation. A processor validates its input,
//! calls the queue engine and encodes the outcome as a response plus a
//! numeric return code. No failure path escapes as a panic or error value;
//! everything a caller can observe is a (return code, comment) pair on the
//! reply message.

use crate::protocol::message::Message;

/// Whether a processor handles commands, queries or acknowledges
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessorFamily {
    Command,
    Query,
    Acknowledge,
}

pub trait MessageProcessor: Send + Sync {
    /// The declared message type this processor handles
    fn message_type(&self) -> &str;

    fn family(&self) -> ProcessorFamily;

    /// Process one request, returning the reply message. Must not panic;
    /// all failures are encoded as return codes with notification comments.
    fn process(&self, request: &Message) -> Message;
}
