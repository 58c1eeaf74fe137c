//! Standing query subscriptions
//!
//! A subscription is created by a query message carrying a subscription
//! descriptor and lives until an explicit stop command names its channel and
//! URL, or until device shutdown clears the registry. The registry owns its
//! subscriptions exclusively; matching hands out clones.
//!
//! The mapping from lifecycle event class to the query type rebuilt into a
//! signal is a configurable table. Event classes absent from the table are
//! never broadcast.

use crate::notifications::event::LifecycleEvent;
use crate::protocol::message::{Message, MessageKind};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// One standing query bound to a callback URL
#[derive(Clone, Debug)]
pub struct Subscription {
    /// Unique per registration
    pub channel_id: String,
    /// Delivery endpoint for rebuilt signals
    pub target_url: String,
    /// The query that created this subscription, used as the signal template
    pub original_query: Message,
    /// Optional amount interval between repeated signals
    pub repeat_step: Option<u64>,
    /// Optional time interval between repeated signals
    pub repeat_time: Option<Duration>,
}

/// Event-class name to query-type mapping table
#[derive(Clone, Debug)]
pub struct SignalMap {
    map: HashMap<String, String>,
}

impl Default for SignalMap {
    fn default() -> Self {
        Self::from_table(HashMap::from([
            ("ProcessStatusChanged".to_string(), "Status".to_string()),
            ("QueueStatusChanged".to_string(), "QueueStatus".to_string()),
            ("QueueEntryChanged".to_string(), "QueueStatus".to_string()),
            ("AmountProduced".to_string(), "Resource".to_string()),
            ("Event".to_string(), "Events".to_string()),
        ]))
    }
}

impl SignalMap {
    pub fn from_table(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    /// Query type broadcast for an event class, if the class is mapped
    pub fn query_type_for(&self, class_name: &str) -> Option<&str> {
        self.map.get(class_name).map(String::as_str)
    }

    /// True when `query_type` is the target of at least one mapping and can
    /// therefore ever receive a signal
    pub fn recognizes_query(&self, query_type: &str) -> bool {
        self.map.values().any(|qt| qt == query_type)
    }
}

/// Registry of live subscriptions
///
/// Independently locked from the queue; the two locks are never held
/// together (the engine emits events only after releasing its own lock).
pub struct SubscriptionRegistry {
    subscriptions: RwLock<Vec<Subscription>>,
    next_channel: AtomicU64,
    signal_map: SignalMap,
}

impl SubscriptionRegistry {
    pub fn new(signal_map: SignalMap) -> Self {
        Self {
            subscriptions: RwLock::new(Vec::new()),
            next_channel: AtomicU64::new(1),
            signal_map,
        }
    }

    pub fn signal_map(&self) -> &SignalMap {
        &self.signal_map
    }

    /// Register a standing query
    ///
    /// Requires a Query message carrying a subscription descriptor with a
    /// non-empty URL and a query type the signal map recognizes. Returns
    /// the assigned channel id, or `None` when any requirement is violated.
    pub fn register_subscription(&self, query: &Message) -> Option<String> {
        if query.kind != MessageKind::Query {
            log::debug!(
                "subscription rejected: message {} is a {:?}, not a query",
                query.id,
                query.kind
            );
            return None;
        }
        let descriptor = match query.subscription() {
            Some(descriptor) => descriptor,
            None => {
                log::debug!(
                    "subscription rejected: query {} carries no subscription descriptor",
                    query.id
                );
                return None;
            }
        };
        if descriptor.url.is_empty() {
            log::debug!("subscription rejected: query {} has an empty URL", query.id);
            return None;
        }
        if !self.signal_map.recognizes_query(&query.msg_type) {
            log::debug!(
                "subscription rejected: query type '{}' is not mapped to any event class",
                query.msg_type
            );
            return None;
        }

        let channel_id = format!("ch{:04}", self.next_channel.fetch_add(1, Ordering::SeqCst));
        let subscription = Subscription {
            channel_id: channel_id.clone(),
            target_url: descriptor.url,
            original_query: query.clone(),
            repeat_step: descriptor.repeat_step,
            repeat_time: descriptor.repeat_time.map(Duration::from_secs),
        };
        log::info!(
            "persistent channel {} registered for '{}' signals to {}",
            channel_id,
            query.msg_type,
            subscription.target_url
        );
        self.subscriptions.write().unwrap().push(subscription);
        Some(channel_id)
    }

    /// Remove every subscription matching (channel id, URL)
    ///
    /// Removing a non-existent subscription is a no-op, not an error.
    pub fn unregister_subscription(&self, channel_id: &str, url: &str) -> usize {
        let mut subscriptions = self.subscriptions.write().unwrap();
        let before = subscriptions.len();
        subscriptions.retain(|sub| !(sub.channel_id == channel_id && sub.target_url == url));
        let removed = before - subscriptions.len();
        if removed > 0 {
            log::info!("persistent channel {channel_id} stopped ({removed} subscription(s))");
        }
        removed
    }

    /// Snapshot of the subscriptions whose query type maps from the
    /// event's class. The snapshot is taken before any delivery starts.
    pub fn matching(&self, event: &LifecycleEvent) -> Vec<Subscription> {
        let query_type = match self.signal_map.query_type_for(event.class_name()) {
            Some(query_type) => query_type,
            None => return Vec::new(),
        };
        self.subscriptions
            .read()
            .unwrap()
            .iter()
            .filter(|sub| sub.original_query.msg_type == query_type)
            .cloned()
            .collect()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().unwrap().len()
    }

    /// Drop all subscriptions (device shutdown)
    pub fn clear(&self) {
        self.subscriptions.write().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::event::{EventClass, GenericEvent, QueueStatusEvent};
    use crate::queue::state::QueueStatus;
    use serde_json::json;

    fn subscribed_query(id: &str, msg_type: &str, url: &str) -> Message {
        Message::query(id.to_string(), msg_type.to_string())
            .with_param("Subscription", json!({ "URL": url }))
    }

    fn queue_status_event() -> LifecycleEvent {
        LifecycleEvent::QueueStatus(QueueStatusEvent::new(
            QueueStatus::Waiting,
            QueueStatus::Held,
            "held".to_string(),
        ))
    }

    #[test]
    fn test_register_requires_query_kind() {
        let registry = SubscriptionRegistry::new(SignalMap::default());
        let command = Message::command("m1".to_string(), "QueueStatus".to_string())
            .with_param("Subscription", json!({ "URL": "http://mgr/cb" }));
        assert!(registry.register_subscription(&command).is_none());
        assert_eq!(registry.subscription_count(), 0);
    }

    #[test]
    fn test_register_rejects_empty_url() {
        let registry = SubscriptionRegistry::new(SignalMap::default());
        let query = subscribed_query("m1", "QueueStatus", "");
        assert!(registry.register_subscription(&query).is_none());
        assert_eq!(registry.subscription_count(), 0);

        // And a later event matches zero endpoints
        assert!(registry.matching(&queue_status_event()).is_empty());
    }

    #[test]
    fn test_register_rejects_unmapped_query_type() {
        let registry = SubscriptionRegistry::new(SignalMap::default());
        let query = subscribed_query("m1", "InkLevels", "http://mgr/cb");
        assert!(registry.register_subscription(&query).is_none());
    }

    #[test]
    fn test_register_assigns_unique_channels() {
        let registry = SubscriptionRegistry::new(SignalMap::default());
        let first = registry
            .register_subscription(&subscribed_query("m1", "QueueStatus", "http://a/cb"))
            .unwrap();
        let second = registry
            .register_subscription(&subscribed_query("m2", "QueueStatus", "http://b/cb"))
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(registry.subscription_count(), 2);
    }

    #[test]
    fn test_matching_by_event_class() {
        let registry = SubscriptionRegistry::new(SignalMap::default());
        registry
            .register_subscription(&subscribed_query("m1", "QueueStatus", "http://a/cb"))
            .unwrap();
        registry
            .register_subscription(&subscribed_query("m2", "Events", "http://b/cb"))
            .unwrap();

        let matches = registry.matching(&queue_status_event());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].target_url, "http://a/cb");

        let generic = LifecycleEvent::Generic(GenericEvent::new(
            EventClass::Warning,
            "toner low".to_string(),
        ));
        let matches = registry.matching(&generic);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].target_url, "http://b/cb");
    }

    #[test]
    fn test_unmapped_event_class_is_never_broadcast() {
        let registry = SubscriptionRegistry::new(SignalMap::from_table(HashMap::from([(
            "QueueStatusChanged".to_string(),
            "QueueStatus".to_string(),
        )])));
        registry
            .register_subscription(&subscribed_query("m1", "QueueStatus", "http://a/cb"))
            .unwrap();

        let generic = LifecycleEvent::Generic(GenericEvent::new(
            EventClass::Event,
            "unmapped".to_string(),
        ));
        assert!(registry.matching(&generic).is_empty());
    }

    #[test]
    fn test_unregister_matches_channel_and_url() {
        let registry = SubscriptionRegistry::new(SignalMap::default());
        let channel = registry
            .register_subscription(&subscribed_query("m1", "QueueStatus", "http://a/cb"))
            .unwrap();
        registry
            .register_subscription(&subscribed_query("m2", "QueueStatus", "http://b/cb"))
            .unwrap();

        // Wrong URL removes nothing
        assert_eq!(registry.unregister_subscription(&channel, "http://wrong"), 0);
        assert_eq!(registry.unregister_subscription(&channel, "http://a/cb"), 1);
        // Unregistering again is a no-op
        assert_eq!(registry.unregister_subscription(&channel, "http://a/cb"), 0);

        // The unrelated subscription still matches
        let matches = registry.matching(&queue_status_event());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].target_url, "http://b/cb");
    }

    #[test]
    fn test_descriptor_intervals_are_captured() {
        let registry = SubscriptionRegistry::new(SignalMap::default());
        let query = Message::query("m1".to_string(), "Resource".to_string()).with_param(
            "Subscription",
            json!({ "URL": "http://a/cb", "RepeatStep": 100, "RepeatTime": 30 }),
        );
        registry.register_subscription(&query).unwrap();

        let event =
            LifecycleEvent::Amount(crate::notifications::event::AmountEvent::new(
                "qe1".to_string(),
                100,
                "sheets".to_string(),
            ));
        let sub = &registry.matching(&event)[0];
        assert_eq!(sub.repeat_step, Some(100));
        assert_eq!(sub.repeat_time, Some(Duration::from_secs(30)));
    }
}
