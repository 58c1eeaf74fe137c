//! RemoveQueueEntry and AbortQueueEntry processors

use crate::protocol::codes;
use crate::protocol::error::{ProtocolError, ProtocolResult};
use crate::protocol::message::{Message, MessageFactory};
use crate::protocol::processor::{MessageProcessor, ProcessorFamily};
use crate::queue::engine::QueueEngine;
use crate::queue::error::QueueResult;
use crate::queue::QueueEntry;
use serde_json::json;
use std::sync::Arc;

fn required_entry_id(request: &Message) -> ProtocolResult<&str> {
    request
        .param_str("QueueEntryID")
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ProtocolError::MissingParameter {
            name: "QueueEntryID".to_string(),
        })
}

fn entry_reply(
    request: &Message,
    ids: &MessageFactory,
    outcome: QueueResult<QueueEntry>,
) -> Message {
    match outcome {
        Ok(entry) => Message::response_to(request, ids.next_id(), codes::RC_SUCCESS)
            .with_param("QueueEntryID", json!(entry.entry_id))
            .with_param("Status", json!(entry.status)),
        Err(e) => {
            Message::response_to(request, ids.next_id(), e.return_code()).with_comment(e.to_string())
        }
    }
}

pub struct RemoveQueueEntryProcessor {
    engine: Arc<QueueEngine>,
    ids: Arc<MessageFactory>,
}

impl RemoveQueueEntryProcessor {
    pub fn new(engine: Arc<QueueEngine>, ids: Arc<MessageFactory>) -> Self {
        Self { engine, ids }
    }
}

impl MessageProcessor for RemoveQueueEntryProcessor {
    fn message_type(&self) -> &str {
        "RemoveQueueEntry"
    }

    fn family(&self) -> ProcessorFamily {
        ProcessorFamily::Command
    }

    fn process(&self, request: &Message) -> Message {
        match required_entry_id(request) {
            Ok(entry_id) => entry_reply(request, &self.ids, self.engine.remove(entry_id)),
            Err(e) => Message::response_to(request, self.ids.next_id(), e.return_code())
                .with_comment(e.to_string()),
        }
    }
}

pub struct AbortQueueEntryProcessor {
    engine: Arc<QueueEngine>,
    ids: Arc<MessageFactory>,
}

impl AbortQueueEntryProcessor {
    pub fn new(engine: Arc<QueueEngine>, ids: Arc<MessageFactory>) -> Self {
        Self { engine, ids }
    }
}

impl MessageProcessor for AbortQueueEntryProcessor {
    fn message_type(&self) -> &str {
        "AbortQueueEntry"
    }

    fn family(&self) -> ProcessorFamily {
        ProcessorFamily::Command
    }

    fn process(&self, request: &Message) -> Message {
        match required_entry_id(request) {
            Ok(entry_id) => entry_reply(request, &self.ids, self.engine.abort(entry_id)),
            Err(e) => Message::response_to(request, self.ids.next_id(), e.return_code())
                .with_comment(e.to_string()),
        }
    }
}
