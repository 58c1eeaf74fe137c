//! QueueStatus query processor

use crate::protocol::codes;
use crate::protocol::error::{ProtocolError, ProtocolResult};
use crate::protocol::message::{Message, MessageFactory};
use crate::protocol::processor::{MessageProcessor, ProcessorFamily};
use crate::queue::engine::QueueEngine;
use crate::queue::ordering::{DetailLevel, QueueFilter, SortDirection};
use std::collections::HashMap;
use std::sync::Arc;

/// Build the queue filter from query parameters
///
/// Recognized parameters: `Details` (None/Brief/JobPhase/JDF), `MaxEntries`
/// (0 or negative means all), `Match` (map of entry attribute to required
/// value) and `Ascending` (reverse the sort direction).
fn parse_filter(request: &Message) -> ProtocolResult<QueueFilter> {
    let details = match request.param_str("Details") {
        None => DetailLevel::default(),
        Some(raw) => {
            DetailLevel::parse(raw).ok_or_else(|| ProtocolError::MalformedParameter {
                name: "Details".to_string(),
                reason: format!("unknown detail level '{raw}'"),
            })?
        }
    };

    // Out-of-range (negative) caps mean unlimited
    let max_entries = request
        .param_i64("MaxEntries")
        .filter(|n| *n > 0)
        .map(|n| n as usize)
        .unwrap_or(0);

    let mut attributes = HashMap::new();
    if let Some(matches) = request.param_object("Match") {
        for (key, value) in matches {
            let value = value
                .as_str()
                .ok_or_else(|| ProtocolError::MalformedParameter {
                    name: "Match".to_string(),
                    reason: format!("value for '{key}' is not a string"),
                })?;
            attributes.insert(key.clone(), value.to_string());
        }
    }

    let direction = match request.params.get("Ascending").and_then(|v| v.as_bool()) {
        Some(true) => SortDirection::Ascending,
        _ => SortDirection::Descending,
    };

    Ok(QueueFilter {
        details,
        max_entries,
        attributes,
        direction,
    })
}

pub struct QueueStatusProcessor {
    engine: Arc<QueueEngine>,
    ids: Arc<MessageFactory>,
}

impl QueueStatusProcessor {
    pub fn new(engine: Arc<QueueEngine>, ids: Arc<MessageFactory>) -> Self {
        Self { engine, ids }
    }
}

impl MessageProcessor for QueueStatusProcessor {
    fn message_type(&self) -> &str {
        "QueueStatus"
    }

    fn family(&self) -> ProcessorFamily {
        ProcessorFamily::Query
    }

    fn process(&self, request: &Message) -> Message {
        let filter = match parse_filter(request) {
            Ok(filter) => filter,
            Err(e) => {
                return Message::response_to(request, self.ids.next_id(), e.return_code())
                    .with_comment(e.to_string())
            }
        };

        let snapshot = self.engine.query(&filter);
        match serde_json::to_value(&snapshot) {
            Ok(queue) => Message::response_to(request, self.ids.next_id(), codes::RC_SUCCESS)
                .with_param("Queue", queue),
            Err(e) => {
                // Should not happen for a plain snapshot; still never panic
                log::error!("queue snapshot not serializable: {e}");
                Message::response_to(request, self.ids.next_id(), codes::RC_INVALID_PARAMETER)
                    .with_comment("internal: snapshot serialization failed".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::engine::SubmitParams;
    use crate::queue::ordering::QueueSnapshot;
    use serde_json::json;
    use tokio::sync::mpsc::unbounded_channel;

    fn setup() -> (QueueStatusProcessor, Arc<QueueEngine>) {
        let (tx, _rx) = unbounded_channel();
        let engine = Arc::new(QueueEngine::new(10, tx));
        let processor =
            QueueStatusProcessor::new(Arc::clone(&engine), Arc::new(MessageFactory::new("m")));
        (processor, engine)
    }

    fn submit(engine: &QueueEngine, priority: i32) {
        engine
            .submit(SubmitParams {
                job_url: "file://job".to_string(),
                priority,
            })
            .unwrap();
    }

    fn snapshot_of(response: &Message) -> QueueSnapshot {
        serde_json::from_value(response.params.get("Queue").unwrap().clone()).unwrap()
    }

    #[test]
    fn test_query_returns_sorted_snapshot() {
        let (processor, engine) = setup();
        submit(&engine, 20);
        submit(&engine, 80);

        let request = Message::query("q1".to_string(), "QueueStatus".to_string());
        let response = processor.process(&request);
        assert_eq!(response.return_code, Some(codes::RC_SUCCESS));

        let snapshot = snapshot_of(&response);
        assert_eq!(snapshot.entry_count, 2);
        assert_eq!(snapshot.entries[0].priority, 80);
        assert_eq!(snapshot.entries[1].priority, 20);
    }

    #[test]
    fn test_detail_and_cap_parameters() {
        let (processor, engine) = setup();
        for _ in 0..4 {
            submit(&engine, 50);
        }

        let request = Message::query("q1".to_string(), "QueueStatus".to_string())
            .with_param("Details", json!("None"));
        let snapshot = snapshot_of(&processor.process(&request));
        assert!(snapshot.entries.is_empty());
        assert_eq!(snapshot.entry_count, 4);

        let request = Message::query("q2".to_string(), "QueueStatus".to_string())
            .with_param("MaxEntries", json!(2));
        assert_eq!(snapshot_of(&processor.process(&request)).entries.len(), 2);

        // Negative cap is out of range and means unlimited
        let request = Message::query("q3".to_string(), "QueueStatus".to_string())
            .with_param("MaxEntries", json!(-1));
        assert_eq!(snapshot_of(&processor.process(&request)).entries.len(), 4);
    }

    #[test]
    fn test_unknown_detail_level_rejected() {
        let (processor, _engine) = setup();
        let request = Message::query("q1".to_string(), "QueueStatus".to_string())
            .with_param("Details", json!("Everything"));
        let response = processor.process(&request);
        assert_eq!(response.return_code, Some(codes::RC_INVALID_PARAMETER));
    }

    #[test]
    fn test_attribute_match_parameter() {
        let (processor, engine) = setup();
        submit(&engine, 10);
        submit(&engine, 90);

        let request = Message::query("q1".to_string(), "QueueStatus".to_string())
            .with_param("Match", json!({ "Priority": "90" }));
        let snapshot = snapshot_of(&processor.process(&request));
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.entries[0].priority, 90);

        let request = Message::query("q2".to_string(), "QueueStatus".to_string())
            .with_param("Match", json!({ "Priority": 90 }));
        let response = processor.process(&request);
        assert_eq!(response.return_code, Some(codes::RC_INVALID_PARAMETER));
    }
}
