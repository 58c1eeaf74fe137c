//! SubmitQueueEntry processor
//!
//! Supports two processing modes. Synchronous mode validates and admits the
//! submission inline and answers with the final outcome. Asynchronous mode
//! is selected by the submitter supplying an `AcknowledgeURL`: the request
//! is handed to the background worker pool, the inline reply only confirms
//! acceptance, and the real outcome arrives later as an out-of-band
//! Acknowledge.

use crate::protocol::codes;
use crate::protocol::error::{ProtocolError, ProtocolResult};
use crate::protocol::message::{Message, MessageFactory};
use crate::protocol::processor::{MessageProcessor, ProcessorFamily};
use crate::protocol::worker::{SubmitJob, SubmitWorkerHandle};
use crate::queue::engine::{QueueEngine, SubmitParams};
use serde_json::json;
use std::sync::Arc;

/// Priority assumed when the submitter does not request one
pub const DEFAULT_PRIORITY: i32 = 50;

/// Extract submission parameters, rejecting malformed input before any
/// state mutation
pub(crate) fn parse_submit_params(request: &Message) -> ProtocolResult<SubmitParams> {
    let job_url = request
        .param_str("URL")
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ProtocolError::MissingParameter {
            name: "URL".to_string(),
        })?;

    let priority = match request.params.get("Priority") {
        None => DEFAULT_PRIORITY,
        Some(value) => value
            .as_i64()
            .map(|p| p as i32)
            .ok_or_else(|| ProtocolError::MalformedParameter {
                name: "Priority".to_string(),
                reason: "not an integer".to_string(),
            })?,
    };

    Ok(SubmitParams {
        job_url: job_url.to_string(),
        priority,
    })
}

pub struct SubmitQueueEntryProcessor {
    engine: Arc<QueueEngine>,
    ids: Arc<MessageFactory>,
    workers: Option<SubmitWorkerHandle>,
}

impl SubmitQueueEntryProcessor {
    /// A processor without a worker handle always runs synchronously
    pub fn new(
        engine: Arc<QueueEngine>,
        ids: Arc<MessageFactory>,
        workers: Option<SubmitWorkerHandle>,
    ) -> Self {
        Self {
            engine,
            ids,
            workers,
        }
    }

    fn process_sync(&self, request: &Message, params: SubmitParams) -> Message {
        match self.engine.submit(params) {
            Ok(entry) => Message::response_to(request, self.ids.next_id(), codes::RC_SUCCESS)
                .with_param("QueueEntryID", json!(entry.entry_id))
                .with_param("Status", json!(entry.status)),
            Err(e) => Message::response_to(request, self.ids.next_id(), e.return_code())
                .with_comment(e.to_string()),
        }
    }

    fn process_async(&self, request: &Message, acknowledge_url: &str) -> Message {
        let workers = match &self.workers {
            Some(workers) => workers,
            None => {
                // No pool wired in; fall back to inline processing
                return Message::response_to(
                    request,
                    self.ids.next_id(),
                    codes::RC_NOT_SUPPORTED,
                )
                .with_comment("asynchronous submission is not available".to_string());
            }
        };

        let accepted = workers.try_submit(SubmitJob {
            request: request.clone(),
            acknowledge_url: acknowledge_url.to_string(),
        });
        if accepted {
            Message::response_to(request, self.ids.next_id(), codes::RC_SUCCESS).with_comment(
                format!("submission accepted; acknowledge will be sent to {acknowledge_url}"),
            )
        } else {
            Message::response_to(request, self.ids.next_id(), codes::RC_QUEUE_REJECTED)
                .with_comment("submission worker backlog is full".to_string())
        }
    }
}

impl MessageProcessor for SubmitQueueEntryProcessor {
    fn message_type(&self) -> &str {
        "SubmitQueueEntry"
    }

    fn family(&self) -> ProcessorFamily {
        ProcessorFamily::Command
    }

    fn process(&self, request: &Message) -> Message {
        // Validation happens inline in both modes, so malformed requests
        // are rejected before anything is queued or mutated
        let params = match parse_submit_params(request) {
            Ok(params) => params,
            Err(e) => {
                return Message::response_to(request, self.ids.next_id(), e.return_code())
                    .with_comment(e.to_string())
            }
        };

        match request.param_str("AcknowledgeURL").filter(|u| !u.is_empty()) {
            Some(acknowledge_url) => self.process_async(request, acknowledge_url),
            None => self.process_sync(request, params),
        }
    }
}
