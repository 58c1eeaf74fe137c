//! QueueEngine - the operations a command processor needs
//!
//! The engine composes the entry store, the status state machine and the
//! ordering policy behind one mutex. Entry mutation, capacity-flag
//! maintenance and status recomputation happen as a single atomic unit, so
//! two concurrent submits can never both observe "space available" and push
//! the queue past capacity.
//!
//! Lifecycle events are collected while the lock is held and emitted only
//! after it is released, which keeps the queue lock and the subscription
//! registry lock from ever being held together.

use crate::notifications::event::{EventClass, LifecycleEvent, QueueEntryEvent, QueueStatusEvent};
use crate::queue::entry::{EntryStatus, QueueEntry};
use crate::queue::error::{QueueError, QueueResult};
use crate::queue::ordering::{compare_entries, QueueFilter, QueueSnapshot};
use crate::queue::state::{QueueStateMachine, QueueStatus, QueueStatusListener};
use crate::queue::store::EntryStore;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;

/// Parameters of one submission
#[derive(Clone, Debug)]
pub struct SubmitParams {
    /// Reference to the job document to execute
    pub job_url: String,
    /// Requested priority, clamped to 0-100
    pub priority: i32,
}

struct QueueCore {
    store: EntryStore,
    state: QueueStateMachine,
    next_entry: u64,
}

/// Thread-safe queue engine
///
/// All operations may be called concurrently from any number of request
/// handling tasks. Every successful mutation raises a lifecycle event after
/// the mutation completes and before the call returns.
pub struct QueueEngine {
    core: Mutex<QueueCore>,
    events: UnboundedSender<LifecycleEvent>,
}

impl QueueEngine {
    pub fn new(capacity: usize, events: UnboundedSender<LifecycleEvent>) -> Self {
        let store = EntryStore::new(capacity);
        let mut state = QueueStateMachine::new();
        // A zero-capacity queue is Full from the start
        state.set_queue_full(store.is_full());
        Self {
            core: Mutex::new(QueueCore {
                store,
                state,
                next_entry: 1,
            }),
            events,
        }
    }

    /// Register a synchronous status listener with the state machine
    pub fn add_status_listener(&self, listener: Arc<dyn QueueStatusListener>) {
        self.core.lock().unwrap().state.add_listener(listener);
    }

    /// Current externally visible queue status
    pub fn status(&self) -> QueueStatus {
        self.core.lock().unwrap().state.status()
    }

    /// Maximum number of admitted entries
    pub fn capacity(&self) -> usize {
        self.core.lock().unwrap().store.capacity()
    }

    /// Current number of admitted entries
    pub fn entry_count(&self) -> usize {
        self.core.lock().unwrap().store.count()
    }

    /// Admit a new Waiting entry
    ///
    /// Rejects without mutation while the queue is Full, Closed, Held or
    /// Blocked. The admission check and the insertion happen under one lock.
    pub fn submit(&self, params: SubmitParams) -> QueueResult<QueueEntry> {
        let mut pending = Vec::new();
        let entry = {
            let mut core = self.core.lock().unwrap();
            let before = core.state.status();
            if !before.accepts_entries() {
                return Err(QueueError::NotAccepting { status: before });
            }

            let entry_id = format!("qe{:04}", core.next_entry);
            core.next_entry += 1;
            let entry = QueueEntry::new(entry_id, params.job_url, params.priority);
            core.store.add(entry.clone())?;

            let full = core.store.is_full();
            core.state.set_queue_full(full);
            self.collect_entry_event(&mut pending, &entry, "queue entry submitted");
            self.collect_status_event(&mut pending, before, core.state.status());
            entry
        };
        self.emit_all(pending);
        Ok(entry)
    }

    /// Remove an entry, transitioning it to Removed and freeing capacity
    ///
    /// Running and Suspended entries cannot be removed.
    pub fn remove(&self, entry_id: &str) -> QueueResult<QueueEntry> {
        let mut pending = Vec::new();
        let removed = {
            let mut core = self.core.lock().unwrap();
            let before = core.state.status();
            let entry = core
                .store
                .get(entry_id)
                .ok_or_else(|| QueueError::EntryNotFound {
                    entry_id: entry_id.to_string(),
                })?;
            if entry.status.is_active() {
                return Err(QueueError::EntryActive {
                    entry_id: entry_id.to_string(),
                    status: entry.status,
                });
            }

            let mut removed = core
                .store
                .remove(entry_id)
                .ok_or_else(|| QueueError::EntryNotFound {
                    entry_id: entry_id.to_string(),
                })?;
            removed.set_status(EntryStatus::Removed);

            let full = core.store.is_full();
            core.state.set_queue_full(full);
            self.collect_entry_event(&mut pending, &removed, "queue entry removed");
            self.collect_status_event(&mut pending, before, core.state.status());
            removed
        };
        self.emit_all(pending);
        Ok(removed)
    }

    /// Abort an entry, transitioning it to Aborted
    ///
    /// Aborting active (Running/Suspended) work is intentionally not
    /// supported and reported distinctly so callers can tell "no" from
    /// "not yet supported".
    pub fn abort(&self, entry_id: &str) -> QueueResult<QueueEntry> {
        let mut pending = Vec::new();
        let aborted = {
            let mut core = self.core.lock().unwrap();
            let current = core
                .store
                .get(entry_id)
                .ok_or_else(|| QueueError::EntryNotFound {
                    entry_id: entry_id.to_string(),
                })?;
            match current.status {
                EntryStatus::Aborted => {
                    return Err(QueueError::AlreadyAborted {
                        entry_id: entry_id.to_string(),
                    })
                }
                EntryStatus::Completed => {
                    return Err(QueueError::AlreadyCompleted {
                        entry_id: entry_id.to_string(),
                    })
                }
                status if status.is_active() => {
                    return Err(QueueError::AbortUnsupported {
                        entry_id: entry_id.to_string(),
                        status,
                    })
                }
                _ => {}
            }

            let entry = core
                .store
                .get_mut(entry_id)
                .ok_or_else(|| QueueError::EntryNotFound {
                    entry_id: entry_id.to_string(),
                })?;
            entry.set_status(EntryStatus::Aborted);
            let aborted = entry.clone();
            self.collect_entry_event(&mut pending, &aborted, "queue entry aborted");
            aborted
        };
        self.emit_all(pending);
        Ok(aborted)
    }

    /// Upsert an entry, replacing any entry sharing the id
    ///
    /// This is the seam the device process uses to report execution
    /// progress (Running, Suspended, Completed transitions).
    pub fn put(&self, entry: QueueEntry) -> QueueResult<()> {
        let mut pending = Vec::new();
        {
            let mut core = self.core.lock().unwrap();
            let before = core.state.status();
            core.store.put(entry.clone())?;
            let full = core.store.is_full();
            core.state.set_queue_full(full);
            self.collect_entry_event(&mut pending, &entry, "queue entry updated");
            self.collect_status_event(&mut pending, before, core.state.status());
        }
        self.emit_all(pending);
        Ok(())
    }

    /// Independent copy of one entry
    pub fn get(&self, entry_id: &str) -> Option<QueueEntry> {
        self.core.lock().unwrap().store.get(entry_id)
    }

    pub fn hold_queue(&self) -> QueueStatus {
        self.administrative(|state| state.hold_queue())
    }

    pub fn resume_queue(&self) -> QueueStatus {
        self.administrative(|state| state.resume_queue())
    }

    pub fn open_queue(&self) -> QueueStatus {
        self.administrative(|state| state.open_queue())
    }

    pub fn close_queue(&self) -> QueueStatus {
        self.administrative(|state| state.close_queue())
    }

    /// Record whether the device process can take further work
    pub fn set_process_full(&self, full: bool) -> QueueStatus {
        self.administrative(move |state| state.set_process_full(full))
    }

    /// Answer a status query with a filtered snapshot
    pub fn query(&self, filter: &QueueFilter) -> QueueSnapshot {
        let (entries, status) = {
            let core = self.core.lock().unwrap();
            (core.store.all(), core.state.status())
        };
        filter.apply(entries, status)
    }

    /// Highest-ranked Waiting entry, or `None` while the queue is not
    /// accepting work
    pub fn first_runnable(&self) -> Option<QueueEntry> {
        let core = self.core.lock().unwrap();
        if !core.state.status().accepts_entries() {
            return None;
        }
        core.store
            .all()
            .into_iter()
            .filter(|entry| entry.status == EntryStatus::Waiting)
            .min_by(compare_entries)
    }

    /// Raise a lifecycle event on behalf of a collaborator (for example
    /// the device process reporting produced amounts)
    pub fn raise(&self, event: LifecycleEvent) {
        self.emit(event);
    }

    fn administrative(&self, apply: impl FnOnce(&mut QueueStateMachine) -> QueueStatus) -> QueueStatus {
        let mut pending = Vec::new();
        let status = {
            let mut core = self.core.lock().unwrap();
            let before = core.state.status();
            let status = apply(&mut core.state);
            self.collect_status_event(&mut pending, before, status);
            status
        };
        self.emit_all(pending);
        status
    }

    fn collect_entry_event(
        &self,
        pending: &mut Vec<LifecycleEvent>,
        entry: &QueueEntry,
        description: &str,
    ) {
        pending.push(LifecycleEvent::QueueEntry(QueueEntryEvent::new(
            EventClass::Event,
            entry.entry_id.clone(),
            entry.status,
            format!("{description}: {}", entry.entry_id),
        )));
    }

    fn collect_status_event(
        &self,
        pending: &mut Vec<LifecycleEvent>,
        old: QueueStatus,
        new: QueueStatus,
    ) {
        if old != new {
            pending.push(LifecycleEvent::QueueStatus(QueueStatusEvent::new(
                old,
                new,
                format!("queue status changed: {old} -> {new}"),
            )));
        }
    }

    fn emit_all(&self, pending: Vec<LifecycleEvent>) {
        for event in pending {
            self.emit(event);
        }
    }

    fn emit(&self, event: LifecycleEvent) {
        // The dispatcher may already be gone during shutdown; events are
        // transient and silently droppable then.
        if self.events.send(event).is_err() {
            log::trace!("lifecycle event dropped: notification dispatcher stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn engine(capacity: usize) -> (Arc<QueueEngine>, UnboundedReceiver<LifecycleEvent>) {
        let (tx, rx) = unbounded_channel();
        (Arc::new(QueueEngine::new(capacity, tx)), rx)
    }

    fn params(url: &str, priority: i32) -> SubmitParams {
        SubmitParams {
            job_url: url.to_string(),
            priority,
        }
    }

    #[test]
    fn test_submit_assigns_ids_and_admits_waiting() {
        let (engine, _rx) = engine(10);
        let entry = engine.submit(params("file://job1", 50)).unwrap();
        assert_eq!(entry.status, EntryStatus::Waiting);
        assert_eq!(entry.entry_id, "qe0001");
        assert_eq!(engine.entry_count(), 1);

        let second = engine.submit(params("file://job2", 50)).unwrap();
        assert_eq!(second.entry_id, "qe0002");
    }

    #[test]
    fn test_submit_at_capacity_reports_full() {
        let (engine, _rx) = engine(1);
        engine.submit(params("file://job1", 50)).unwrap();
        assert_eq!(engine.status(), QueueStatus::Full);

        match engine.submit(params("file://job2", 50)) {
            Err(QueueError::NotAccepting { status }) => assert_eq!(status, QueueStatus::Full),
            other => panic!("expected NotAccepting, got {other:?}"),
        }
        assert_eq!(engine.entry_count(), 1);
    }

    #[test]
    fn test_submit_rejected_while_closed_held_blocked() {
        let (engine, _rx) = engine(10);
        engine.close_queue();
        assert!(engine.submit(params("file://job", 50)).is_err());
        engine.hold_queue();
        assert!(engine.submit(params("file://job", 50)).is_err());
        engine.open_queue();
        assert!(engine.submit(params("file://job", 50)).is_err());
        engine.resume_queue();
        assert!(engine.submit(params("file://job", 50)).is_ok());
    }

    #[test]
    fn test_remove_frees_capacity_and_clears_full() {
        let (engine, _rx) = engine(1);
        let entry = engine.submit(params("file://job", 50)).unwrap();
        assert_eq!(engine.status(), QueueStatus::Full);

        let removed = engine.remove(&entry.entry_id).unwrap();
        assert_eq!(removed.status, EntryStatus::Removed);
        assert!(removed.end_time.is_some());
        assert_eq!(engine.entry_count(), 0);
        assert_eq!(engine.status(), QueueStatus::Waiting);
    }

    #[test]
    fn test_remove_running_entry_rejected() {
        let (engine, _rx) = engine(10);
        let mut entry = engine.submit(params("file://job", 50)).unwrap();
        entry.set_status(EntryStatus::Running);
        engine.put(entry.clone()).unwrap();

        match engine.remove(&entry.entry_id) {
            Err(QueueError::EntryActive { status, .. }) => {
                assert_eq!(status, EntryStatus::Running);
            }
            other => panic!("expected EntryActive, got {other:?}"),
        }
        assert_eq!(engine.entry_count(), 1);
    }

    #[test]
    fn test_remove_unknown_entry() {
        let (engine, _rx) = engine(10);
        assert!(matches!(
            engine.remove("qe9999"),
            Err(QueueError::EntryNotFound { .. })
        ));
    }

    #[test]
    fn test_abort_state_checks() {
        let (engine, _rx) = engine(10);
        let entry = engine.submit(params("file://job", 50)).unwrap();

        let aborted = engine.abort(&entry.entry_id).unwrap();
        assert_eq!(aborted.status, EntryStatus::Aborted);
        assert!(aborted.end_time.is_some());

        assert!(matches!(
            engine.abort(&entry.entry_id),
            Err(QueueError::AlreadyAborted { .. })
        ));

        let mut completed = engine.submit(params("file://job2", 50)).unwrap();
        completed.set_status(EntryStatus::Completed);
        engine.put(completed.clone()).unwrap();
        assert!(matches!(
            engine.abort(&completed.entry_id),
            Err(QueueError::AlreadyCompleted { .. })
        ));

        let mut running = engine.submit(params("file://job3", 50)).unwrap();
        running.set_status(EntryStatus::Running);
        engine.put(running.clone()).unwrap();
        assert!(matches!(
            engine.abort(&running.entry_id),
            Err(QueueError::AbortUnsupported { .. })
        ));
    }

    #[test]
    fn test_first_runnable_prefers_priority() {
        let (engine, _rx) = engine(10);
        engine.submit(params("file://low", 20)).unwrap();
        let high = engine.submit(params("file://high", 80)).unwrap();

        let next = engine.first_runnable().unwrap();
        assert_eq!(next.entry_id, high.entry_id);

        engine.hold_queue();
        assert!(engine.first_runnable().is_none());
    }

    #[test]
    fn test_lifecycle_events_emitted_per_mutation() {
        let (engine, mut rx) = engine(1);
        let entry = engine.submit(params("file://job", 50)).unwrap();

        // Admission raises an entry event, filling capacity a status event
        match rx.try_recv().unwrap() {
            LifecycleEvent::QueueEntry(ev) => assert_eq!(ev.entry_id, entry.entry_id),
            other => panic!("expected entry event, got {other:?}"),
        }
        match rx.try_recv().unwrap() {
            LifecycleEvent::QueueStatus(ev) => {
                assert_eq!(ev.new_status, QueueStatus::Full);
            }
            other => panic!("expected status event, got {other:?}"),
        }

        engine.close_queue();
        match rx.try_recv().unwrap() {
            LifecycleEvent::QueueStatus(ev) => assert_eq!(ev.new_status, QueueStatus::Closed),
            other => panic!("expected status event, got {other:?}"),
        }
        // Idempotent close raises nothing further
        engine.close_queue();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_concurrent_submission_never_exceeds_capacity() {
        let (engine, _rx) = engine(5);
        let mut handles = Vec::new();
        for worker in 0..8 {
            let engine = Arc::clone(&engine);
            handles.push(std::thread::spawn(move || {
                let mut admitted = 0;
                for job in 0..10 {
                    if engine
                        .submit(SubmitParams {
                            job_url: format!("file://w{worker}-j{job}"),
                            priority: 50,
                        })
                        .is_ok()
                    {
                        admitted += 1;
                    }
                    assert!(engine.entry_count() <= 5);
                }
                admitted
            }));
        }

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 5);
        assert_eq!(engine.entry_count(), 5);
        assert_eq!(engine.status(), QueueStatus::Full);
    }
}
