//! Queue status state machine
//!
//! The externally visible queue status is a pure function of four flags:
//! administratively closed, administratively held, queue-capacity exhausted
//! and process-side busy. The status is recomputed on every transition and
//! never stored independently, so it can never drift from the flags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Aggregate operational state of the queue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueStatus {
    Waiting,
    Running,
    Full,
    Held,
    Closed,
    Blocked,
}

impl QueueStatus {
    /// True when new submissions are admitted in this status
    pub fn accepts_entries(&self) -> bool {
        matches!(self, QueueStatus::Waiting | QueueStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Waiting => "Waiting",
            QueueStatus::Running => "Running",
            QueueStatus::Full => "Full",
            QueueStatus::Held => "Held",
            QueueStatus::Closed => "Closed",
            QueueStatus::Blocked => "Blocked",
        }
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Synchronous observer of queue status transitions
///
/// Listeners are invoked on the calling thread before the transition call
/// returns. This is the synchronous notification path; asynchronous
/// subscriber signals travel through the notification dispatcher instead.
pub trait QueueStatusListener: Send + Sync {
    fn queue_status_changed(&self, old: QueueStatus, new: QueueStatus);
}

/// Flag-driven queue status state machine
pub struct QueueStateMachine {
    closed: bool,
    held: bool,
    queue_full: bool,
    process_full: bool,
    listeners: Vec<Arc<dyn QueueStatusListener>>,
}

impl fmt::Debug for QueueStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueStateMachine")
            .field("closed", &self.closed)
            .field("held", &self.held)
            .field("queue_full", &self.queue_full)
            .field("process_full", &self.process_full)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for QueueStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueStateMachine {
    pub fn new() -> Self {
        Self {
            closed: false,
            held: false,
            queue_full: false,
            process_full: false,
            listeners: Vec::new(),
        }
    }

    /// Derive the current status from the flags
    ///
    /// Administrative flags dominate capacity flags: a closed or held queue
    /// reports Closed/Held/Blocked even while full. When only the
    /// process-side flag is set the queue reports Running, since the queue
    /// itself could still admit work.
    pub fn status(&self) -> QueueStatus {
        match (self.closed, self.held) {
            (true, true) => QueueStatus::Blocked,
            (true, false) => QueueStatus::Closed,
            (false, true) => QueueStatus::Held,
            (false, false) => {
                if self.queue_full {
                    QueueStatus::Full
                } else if self.process_full {
                    QueueStatus::Running
                } else {
                    QueueStatus::Waiting
                }
            }
        }
    }

    /// Register a synchronous status listener
    pub fn add_listener(&mut self, listener: Arc<dyn QueueStatusListener>) {
        self.listeners.push(listener);
    }

    /// Set the closed flag. Idempotent.
    pub fn close_queue(&mut self) -> QueueStatus {
        self.transition(|s| s.closed = true)
    }

    /// Clear the closed flag; the held flag is preserved, so a Blocked
    /// queue opens into Held rather than Waiting.
    pub fn open_queue(&mut self) -> QueueStatus {
        self.transition(|s| s.closed = false)
    }

    /// Set the held flag. Idempotent.
    pub fn hold_queue(&mut self) -> QueueStatus {
        self.transition(|s| s.held = true)
    }

    /// Clear the held flag; the closed flag is preserved.
    pub fn resume_queue(&mut self) -> QueueStatus {
        self.transition(|s| s.held = false)
    }

    /// Record whether the queue storage is at capacity
    pub fn set_queue_full(&mut self, full: bool) -> QueueStatus {
        self.transition(|s| s.queue_full = full)
    }

    /// Record whether the device process cannot take further work
    pub fn set_process_full(&mut self, full: bool) -> QueueStatus {
        self.transition(|s| s.process_full = full)
    }

    /// Apply a flag mutation and notify listeners when the derived status
    /// actually changed. The listener list is snapshotted before firing so
    /// a listener may register or remove listeners without deadlocking.
    fn transition(&mut self, apply: impl FnOnce(&mut Self)) -> QueueStatus {
        let old = self.status();
        apply(self);
        let new = self.status();
        if old != new {
            let snapshot: Vec<Arc<dyn QueueStatusListener>> = self.listeners.clone();
            for listener in snapshot {
                listener.queue_status_changed(old, new);
            }
        }
        new
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingListener {
        transitions: Mutex<Vec<(QueueStatus, QueueStatus)>>,
    }

    impl QueueStatusListener for RecordingListener {
        fn queue_status_changed(&self, old: QueueStatus, new: QueueStatus) {
            self.transitions.lock().unwrap().push((old, new));
        }
    }

    #[test]
    fn test_initial_status_is_waiting() {
        assert_eq!(QueueStateMachine::new().status(), QueueStatus::Waiting);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut state = QueueStateMachine::new();
        assert_eq!(state.close_queue(), QueueStatus::Closed);
        assert_eq!(state.close_queue(), QueueStatus::Closed);
    }

    #[test]
    fn test_hold_survives_close_open_cycle() {
        let mut state = QueueStateMachine::new();
        assert_eq!(state.close_queue(), QueueStatus::Closed);
        assert_eq!(state.hold_queue(), QueueStatus::Blocked);
        // Opening a blocked queue yields Held, not Waiting
        assert_eq!(state.open_queue(), QueueStatus::Held);
        assert_eq!(state.resume_queue(), QueueStatus::Waiting);
    }

    #[test]
    fn test_resume_from_blocked_yields_closed() {
        let mut state = QueueStateMachine::new();
        state.hold_queue();
        state.close_queue();
        assert_eq!(state.status(), QueueStatus::Blocked);
        assert_eq!(state.resume_queue(), QueueStatus::Closed);
    }

    #[test]
    fn test_capacity_flags() {
        let mut state = QueueStateMachine::new();
        assert_eq!(state.set_queue_full(true), QueueStatus::Full);
        assert_eq!(state.set_queue_full(false), QueueStatus::Waiting);

        // Process-side congestion alone reports Running
        assert_eq!(state.set_process_full(true), QueueStatus::Running);
        assert_eq!(state.set_queue_full(true), QueueStatus::Full);
        assert_eq!(state.set_queue_full(false), QueueStatus::Running);
        assert_eq!(state.set_process_full(false), QueueStatus::Waiting);
    }

    #[test]
    fn test_administrative_flags_dominate_full() {
        let mut state = QueueStateMachine::new();
        state.set_queue_full(true);
        assert_eq!(state.close_queue(), QueueStatus::Closed);
        assert_eq!(state.open_queue(), QueueStatus::Full);
        assert_eq!(state.hold_queue(), QueueStatus::Held);
        assert_eq!(state.resume_queue(), QueueStatus::Full);
    }

    #[test]
    fn test_listener_fires_on_change_only() {
        let mut state = QueueStateMachine::new();
        let listener = Arc::new(RecordingListener::default());
        state.add_listener(listener.clone());

        state.close_queue();
        state.close_queue(); // no status change, no notification
        state.open_queue();

        let transitions = listener.transitions.lock().unwrap();
        assert_eq!(
            *transitions,
            vec![
                (QueueStatus::Waiting, QueueStatus::Closed),
                (QueueStatus::Closed, QueueStatus::Waiting),
            ]
        );
    }
}
