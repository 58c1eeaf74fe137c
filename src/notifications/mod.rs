//! Subscription and notification engine
//!
//! Tracks standing queries bound to callback endpoints and converts
//! internal lifecycle events into protocol Signal messages delivered
//! asynchronously to each subscriber.

pub mod delivery;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod subscription;

pub use delivery::{HttpSignalTransport, SignalTransport};
pub use dispatcher::NotificationDispatcher;
pub use error::{NotificationError, NotificationResult};
pub use event::{
    AmountEvent, EventClass, GenericEvent, LifecycleEvent, ProcessStatusEvent, QueueEntryEvent,
    QueueStatusEvent,
};
pub use subscription::{SignalMap, Subscription, SubscriptionRegistry};
