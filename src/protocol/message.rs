//! Protocol message model
//!
//! The five message kinds exchanged between a controller and this device:
//! Command (imperative, answered by a Response or Acknowledge), Query
//! (answered by a Response), Response (carries `refID` and `returnCode`),
//! Signal (unsolicited, `refID` references the subscription's originating
//! query) and Acknowledge (out-of-band receipt for asynchronous commands).
//!
//! JSON via serde is the wire encoding used by the binary harness and the
//! HTTP transport.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Command,
    Query,
    Response,
    Signal,
    Acknowledge,
}

/// One protocol message
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Unique message id, e.g. "m0001"
    pub id: String,
    pub kind: MessageKind,
    /// Declared operation type, e.g. "SubmitQueueEntry"
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Id of the message this one answers or references
    #[serde(rename = "refID", default, skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
    /// Numeric outcome, 0 meaning success. Responses and Acknowledges only.
    #[serde(rename = "returnCode", default, skip_serializing_if = "Option::is_none")]
    pub return_code: Option<i32>,
    /// Notification comments accompanying non-zero return codes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
    /// Operation-specific parameters
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

impl Message {
    pub fn new(id: String, kind: MessageKind, msg_type: String) -> Self {
        Self {
            id,
            kind,
            msg_type,
            ref_id: None,
            return_code: None,
            comments: Vec::new(),
            params: Map::new(),
        }
    }

    pub fn command(id: String, msg_type: String) -> Self {
        Self::new(id, MessageKind::Command, msg_type)
    }

    pub fn query(id: String, msg_type: String) -> Self {
        Self::new(id, MessageKind::Query, msg_type)
    }

    /// Response answering `request`, carrying its type and id reference
    pub fn response_to(request: &Message, id: String, return_code: i32) -> Self {
        let mut response = Self::new(id, MessageKind::Response, request.msg_type.clone());
        response.ref_id = Some(request.id.clone());
        response.return_code = Some(return_code);
        response
    }

    /// Acknowledge for an asynchronously processed `request`
    pub fn acknowledge_to(request: &Message, id: String, return_code: i32) -> Self {
        let mut acknowledge = Self::new(id, MessageKind::Acknowledge, request.msg_type.clone());
        acknowledge.ref_id = Some(request.id.clone());
        acknowledge.return_code = Some(return_code);
        acknowledge
    }

    /// Signal templated from a subscription's original query: same type,
    /// `refID` pointing at the query that created the channel
    pub fn signal_from(original_query: &Message, id: String) -> Self {
        let mut signal = Self::new(id, MessageKind::Signal, original_query.msg_type.clone());
        signal.ref_id = Some(original_query.id.clone());
        signal
    }

    pub fn with_param(mut self, key: &str, value: Value) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    pub fn with_comment(mut self, comment: String) -> Self {
        self.comments.push(comment);
        self
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    pub fn param_i64(&self, key: &str) -> Option<i64> {
        self.params.get(key).and_then(Value::as_i64)
    }

    pub fn param_object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.params.get(key).and_then(Value::as_object)
    }

    /// Parse the embedded subscription descriptor, if any
    pub fn subscription(&self) -> Option<SubscriptionDescriptor> {
        let raw = self.params.get("Subscription")?;
        match serde_json::from_value(raw.clone()) {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                log::debug!("malformed subscription descriptor on {}: {e}", self.id);
                None
            }
        }
    }
}

/// Subscription descriptor embedded in a standing query
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubscriptionDescriptor {
    #[serde(rename = "URL", default)]
    pub url: String,
    /// Amount interval between repeated signals
    #[serde(rename = "RepeatStep", default)]
    pub repeat_step: Option<u64>,
    /// Time interval between repeated signals, in seconds
    #[serde(rename = "RepeatTime", default)]
    pub repeat_time: Option<u64>,
}

/// Monotonic message id factory, shared by every component that builds
/// messages so ids stay unique across responses, signals and acknowledges
pub struct MessageFactory {
    prefix: String,
    next: AtomicU64,
}

impl MessageFactory {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            next: AtomicU64::new(1),
        }
    }

    pub fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        format!("{}{:04}", self.prefix, n)
    }
}
