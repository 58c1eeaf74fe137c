//! Lifecycle event types
//!
//! Events are transient: produced by the queue engine (or the device
//! process), consumed within one dispatch cycle, never persisted.

use crate::queue::entry::EntryStatus;
use crate::queue::state::QueueStatus;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Severity classification carried by every lifecycle event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventClass {
    Event,
    Warning,
    Error,
    Information,
}

impl EventClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventClass::Event => "Event",
            EventClass::Warning => "Warning",
            EventClass::Error => "Error",
            EventClass::Information => "Information",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessStatusEvent {
    pub timestamp: SystemTime,
    pub class: EventClass,
    pub description: String,
    /// Device-reported process state, e.g. "Idle" or "InProgress"
    pub process_status: String,
}

impl ProcessStatusEvent {
    pub fn new(class: EventClass, process_status: String, description: String) -> Self {
        Self {
            timestamp: SystemTime::now(),
            class,
            description,
            process_status,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueueStatusEvent {
    pub timestamp: SystemTime,
    pub class: EventClass,
    pub description: String,
    pub old_status: QueueStatus,
    pub new_status: QueueStatus,
}

impl QueueStatusEvent {
    pub fn new(old_status: QueueStatus, new_status: QueueStatus, description: String) -> Self {
        Self {
            timestamp: SystemTime::now(),
            class: EventClass::Event,
            description,
            old_status,
            new_status,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AmountEvent {
    pub timestamp: SystemTime,
    pub class: EventClass,
    pub description: String,
    pub entry_id: String,
    /// Units produced since the previous amount event
    pub amount: u64,
}

impl AmountEvent {
    pub fn new(entry_id: String, amount: u64, description: String) -> Self {
        Self {
            timestamp: SystemTime::now(),
            class: EventClass::Information,
            description,
            entry_id,
            amount,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueueEntryEvent {
    pub timestamp: SystemTime,
    pub class: EventClass,
    pub description: String,
    pub entry_id: String,
    pub entry_status: EntryStatus,
}

impl QueueEntryEvent {
    pub fn new(
        class: EventClass,
        entry_id: String,
        entry_status: EntryStatus,
        description: String,
    ) -> Self {
        Self {
            timestamp: SystemTime::now(),
            class,
            description,
            entry_id,
            entry_status,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenericEvent {
    pub timestamp: SystemTime,
    pub class: EventClass,
    pub description: String,
    /// Free-form identifier for correlating related events
    pub event_id: Option<String>,
}

impl GenericEvent {
    pub fn new(class: EventClass, description: String) -> Self {
        Self {
            timestamp: SystemTime::now(),
            class,
            description,
            event_id: None,
        }
    }

    pub fn with_event_id(class: EventClass, event_id: String, description: String) -> Self {
        Self {
            timestamp: SystemTime::now(),
            class,
            description,
            event_id: Some(event_id),
        }
    }
}

/// Unified lifecycle event union
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum LifecycleEvent {
    ProcessStatus(ProcessStatusEvent),
    QueueStatus(QueueStatusEvent),
    Amount(AmountEvent),
    QueueEntry(QueueEntryEvent),
    Generic(GenericEvent),
}

impl LifecycleEvent {
    /// Name of the event class, the key into the signal mapping table
    pub fn class_name(&self) -> &'static str {
        match self {
            LifecycleEvent::ProcessStatus(_) => "ProcessStatusChanged",
            LifecycleEvent::QueueStatus(_) => "QueueStatusChanged",
            LifecycleEvent::Amount(_) => "AmountProduced",
            LifecycleEvent::QueueEntry(_) => "QueueEntryChanged",
            LifecycleEvent::Generic(_) => "Event",
        }
    }

    pub fn class(&self) -> EventClass {
        match self {
            LifecycleEvent::ProcessStatus(e) => e.class,
            LifecycleEvent::QueueStatus(e) => e.class,
            LifecycleEvent::Amount(e) => e.class,
            LifecycleEvent::QueueEntry(e) => e.class,
            LifecycleEvent::Generic(e) => e.class,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            LifecycleEvent::ProcessStatus(e) => &e.description,
            LifecycleEvent::QueueStatus(e) => &e.description,
            LifecycleEvent::Amount(e) => &e.description,
            LifecycleEvent::QueueEntry(e) => &e.description,
            LifecycleEvent::Generic(e) => &e.description,
        }
    }

    pub fn timestamp(&self) -> SystemTime {
        match self {
            LifecycleEvent::ProcessStatus(e) => e.timestamp,
            LifecycleEvent::QueueStatus(e) => e.timestamp,
            LifecycleEvent::Amount(e) => e.timestamp,
            LifecycleEvent::QueueEntry(e) => e.timestamp,
            LifecycleEvent::Generic(e) => e.timestamp,
        }
    }
}
