//! Event-driven signal dispatcher
//!
//! Consumes lifecycle events from the queue engine's channel, matches them
//! against the subscription registry and rebuilds each matching
//! subscription's original query into a Signal message delivered to its
//! callback URL. Delivery is fire-and-forget per subscriber: one failing
//! endpoint never blocks, fails or delays delivery to any other, and
//! nothing propagates back to the component that raised the event.

use crate::notifications::delivery::SignalTransport;
use crate::notifications::event::LifecycleEvent;
use crate::notifications::subscription::SubscriptionRegistry;
use crate::protocol::message::{Message, MessageFactory};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

pub struct NotificationDispatcher {
    registry: Arc<SubscriptionRegistry>,
    transport: Arc<dyn SignalTransport>,
    ids: Arc<MessageFactory>,
}

impl NotificationDispatcher {
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        transport: Arc<dyn SignalTransport>,
        ids: Arc<MessageFactory>,
    ) -> Self {
        Self {
            registry,
            transport,
            ids,
        }
    }

    /// Run the dispatcher on a background task until the event channel
    /// closes (every engine handle dropped)
    pub fn spawn(self, mut events: UnboundedReceiver<LifecycleEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            log::debug!("notification dispatcher started");
            while let Some(event) = events.recv().await {
                self.event_generated(event).await;
            }
            log::debug!("notification dispatcher stopped");
        })
    }

    /// Fan one event out to every matching subscriber
    ///
    /// The subscription snapshot is taken before any delivery starts, so
    /// registrations racing with the fan-out see either all or none of it.
    pub async fn event_generated(&self, event: LifecycleEvent) {
        let subscriptions = self.registry.matching(&event);
        if subscriptions.is_empty() {
            log::trace!("no subscribers for {} event", event.class_name());
            return;
        }
        log::debug!(
            "broadcasting {} event to {} subscriber(s)",
            event.class_name(),
            subscriptions.len()
        );

        let deliveries = subscriptions.into_iter().map(|subscription| {
            let signal = self.build_signal(&subscription.original_query, &event);
            let transport = Arc::clone(&self.transport);
            async move {
                if let Err(e) = transport.deliver(&subscription.target_url, &signal).await {
                    // Failures are isolated per subscriber and never retried here
                    log::warn!(
                        "signal delivery on channel {} failed: {}",
                        subscription.channel_id,
                        e
                    );
                }
            }
        });
        futures::future::join_all(deliveries).await;
    }

    /// Build the signal message for one subscriber
    ///
    /// The signal is templated from the subscription's original query: a
    /// fresh id from the shared factory (same prefix scheme), `ref_id` set
    /// to the original query id and the type copied from the query.
    pub fn build_signal(&self, original_query: &Message, event: &LifecycleEvent) -> Message {
        let mut signal = Message::signal_from(original_query, self.ids.next_id())
            .with_comment(event.description().to_string());
        match serde_json::to_value(event) {
            Ok(payload) => signal = signal.with_param("Event", payload),
            Err(e) => log::warn!("lifecycle event not serializable: {e}"),
        }
        signal
    }
}
