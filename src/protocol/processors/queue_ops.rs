//! Administrative queue control processors (hold/resume/open/close)

use crate::protocol::codes;
use crate::protocol::message::{Message, MessageFactory};
use crate::protocol::processor::{MessageProcessor, ProcessorFamily};
use crate::queue::engine::QueueEngine;
use crate::queue::state::QueueStatus;
use serde_json::json;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueControlOp {
    Hold,
    Resume,
    Open,
    Close,
}

impl QueueControlOp {
    fn message_type(&self) -> &'static str {
        match self {
            QueueControlOp::Hold => "HoldQueue",
            QueueControlOp::Resume => "ResumeQueue",
            QueueControlOp::Open => "OpenQueue",
            QueueControlOp::Close => "CloseQueue",
        }
    }

    fn apply(&self, engine: &QueueEngine) -> QueueStatus {
        match self {
            QueueControlOp::Hold => engine.hold_queue(),
            QueueControlOp::Resume => engine.resume_queue(),
            QueueControlOp::Open => engine.open_queue(),
            QueueControlOp::Close => engine.close_queue(),
        }
    }
}

/// One processor instance per administrative operation; all four share the
/// same shape, so the operation is data rather than four near-identical
/// types.
pub struct QueueControlProcessor {
    op: QueueControlOp,
    engine: Arc<QueueEngine>,
    ids: Arc<MessageFactory>,
}

impl QueueControlProcessor {
    pub fn new(op: QueueControlOp, engine: Arc<QueueEngine>, ids: Arc<MessageFactory>) -> Self {
        Self { op, engine, ids }
    }
}

impl MessageProcessor for QueueControlProcessor {
    fn message_type(&self) -> &str {
        self.op.message_type()
    }

    fn family(&self) -> ProcessorFamily {
        ProcessorFamily::Command
    }

    fn process(&self, request: &Message) -> Message {
        let status = self.op.apply(&self.engine);
        Message::response_to(request, self.ids.next_id(), codes::RC_SUCCESS)
            .with_param("QueueStatus", json!(status))
    }
}
