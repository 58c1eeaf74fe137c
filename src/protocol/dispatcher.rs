//! Protocol dispatcher
//!
//! Routes an inbound message to the processor registered for its declared
//! type. Messages with no registered processor are rejected here and never
//! reach a processor. Standing-query registration also happens here, since
//! any recognized query kind may carry a subscription descriptor.

use crate::notifications::subscription::SubscriptionRegistry;
use crate::protocol::codes;
use crate::protocol::message::{Message, MessageFactory, MessageKind};
use crate::protocol::processor::{MessageProcessor, ProcessorFamily};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

pub struct ProtocolDispatcher {
    processors: HashMap<String, Arc<dyn MessageProcessor>>,
    registry: Arc<SubscriptionRegistry>,
    ids: Arc<MessageFactory>,
}

impl ProtocolDispatcher {
    pub fn new(registry: Arc<SubscriptionRegistry>, ids: Arc<MessageFactory>) -> Self {
        Self {
            processors: HashMap::new(),
            registry,
            ids,
        }
    }

    /// Register a processor under its declared message type
    pub fn register(&mut self, processor: Arc<dyn MessageProcessor>) {
        let msg_type = processor.message_type().to_string();
        log::debug!("processor registered for message type '{msg_type}'");
        if self.processors.insert(msg_type.clone(), processor).is_some() {
            log::warn!("processor for message type '{msg_type}' replaced");
        }
    }

    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    /// Dispatch one inbound message and produce the reply
    pub fn dispatch(&self, request: &Message) -> Message {
        // A query carrying a subscription descriptor opens a persistent
        // channel; a rejected descriptor fails the whole request with 6.
        let mut channel: Option<String> = None;
        if request.kind == MessageKind::Query && request.params.contains_key("Subscription") {
            match self.registry.register_subscription(request) {
                Some(channel_id) => channel = Some(channel_id),
                None => {
                    return Message::response_to(
                        request,
                        self.ids.next_id(),
                        codes::RC_INVALID_PARAMETER,
                    )
                    .with_comment("subscription rejected: invalid descriptor, URL or query type".to_string());
                }
            }
        }

        let reply = match self.processors.get(&request.msg_type) {
            Some(processor) => {
                if kind_matches(processor.family(), request.kind) {
                    processor.process(request)
                } else {
                    Message::response_to(request, self.ids.next_id(), codes::RC_INVALID_PARAMETER)
                        .with_comment(format!(
                            "message kind {:?} does not match the {} processor",
                            request.kind, request.msg_type
                        ))
                }
            }
            None => match &channel {
                // A subscription-only query (no initial-response processor)
                // still succeeds: the channel was opened.
                Some(_) => {
                    Message::response_to(request, self.ids.next_id(), codes::RC_SUCCESS)
                }
                None => {
                    log::warn!("no processor for message type '{}'", request.msg_type);
                    Message::response_to(request, self.ids.next_id(), codes::RC_NOT_SUPPORTED)
                        .with_comment(format!(
                            "no processor registered for message type '{}'",
                            request.msg_type
                        ))
                }
            },
        };

        match channel {
            Some(channel_id) => reply.with_param("ChannelID", json!(channel_id)),
            None => reply,
        }
    }
}

fn kind_matches(family: ProcessorFamily, kind: MessageKind) -> bool {
    matches!(
        (family, kind),
        (ProcessorFamily::Command, MessageKind::Command)
            | (ProcessorFamily::Query, MessageKind::Query)
            | (ProcessorFamily::Acknowledge, MessageKind::Acknowledge)
    )
}
