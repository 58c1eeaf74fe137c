//! StopPersistentChannel processor
//!
//! Removes standing subscriptions by (channel id, URL). Stopping a channel
//! that does not exist is a no-op, not an error.

use crate::protocol::codes;
use crate::protocol::error::ProtocolError;
use crate::protocol::message::{Message, MessageFactory};
use crate::protocol::processor::{MessageProcessor, ProcessorFamily};
use crate::notifications::subscription::SubscriptionRegistry;
use serde_json::json;
use std::sync::Arc;

pub struct StopPersistentChannelProcessor {
    registry: Arc<SubscriptionRegistry>,
    ids: Arc<MessageFactory>,
}

impl StopPersistentChannelProcessor {
    pub fn new(registry: Arc<SubscriptionRegistry>, ids: Arc<MessageFactory>) -> Self {
        Self { registry, ids }
    }

    fn required_param<'a>(
        &self,
        request: &'a Message,
        name: &str,
    ) -> Result<&'a str, ProtocolError> {
        request
            .param_str(name)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ProtocolError::MissingParameter {
                name: name.to_string(),
            })
    }
}

impl MessageProcessor for StopPersistentChannelProcessor {
    fn message_type(&self) -> &str {
        "StopPersistentChannel"
    }

    fn family(&self) -> ProcessorFamily {
        ProcessorFamily::Command
    }

    fn process(&self, request: &Message) -> Message {
        let channel_id = match self.required_param(request, "ChannelID") {
            Ok(value) => value,
            Err(e) => {
                return Message::response_to(request, self.ids.next_id(), e.return_code())
                    .with_comment(e.to_string())
            }
        };
        let url = match self.required_param(request, "URL") {
            Ok(value) => value,
            Err(e) => {
                return Message::response_to(request, self.ids.next_id(), e.return_code())
                    .with_comment(e.to_string())
            }
        };

        let removed = self.registry.unregister_subscription(channel_id, url);
        Message::response_to(request, self.ids.next_id(), codes::RC_SUCCESS)
            .with_param("Removed", json!(removed))
    }
}
