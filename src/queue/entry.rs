//! Queue entry data model
//!
//! A `QueueEntry` is one admitted unit of work. Entries are owned exclusively
//! by the entry store; everything handed out of the queue is an independent
//! copy, so callers can never mutate queue state through a returned entry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

/// Highest priority a submitter may request.
pub const MAX_PRIORITY: i32 = 100;

/// Lifecycle status of a single queue entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryStatus {
    Waiting,
    Held,
    Running,
    Suspended,
    Completed,
    Aborted,
    Removed,
}

impl EntryStatus {
    /// Sort rank used by the queue comparator. Higher ranks sort first in
    /// the default (descending) direction. The table is explicit so that
    /// ordering never depends on variant declaration order.
    pub fn rank(&self) -> u8 {
        match self {
            EntryStatus::Running => 100,
            EntryStatus::Suspended => 90,
            EntryStatus::Waiting => 80,
            EntryStatus::Held => 70,
            EntryStatus::Completed => 60,
            EntryStatus::Aborted => 50,
            EntryStatus::Removed => 40,
        }
    }

    /// Terminal statuses stamp an end time and never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EntryStatus::Completed | EntryStatus::Aborted | EntryStatus::Removed
        )
    }

    /// Active entries are being executed by the device and may not be
    /// removed or aborted through the protocol.
    pub fn is_active(&self) -> bool {
        matches!(self, EntryStatus::Running | EntryStatus::Suspended)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Waiting => "Waiting",
            EntryStatus::Held => "Held",
            EntryStatus::Running => "Running",
            EntryStatus::Suspended => "Suspended",
            EntryStatus::Completed => "Completed",
            EntryStatus::Aborted => "Aborted",
            EntryStatus::Removed => "Removed",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One admitted unit of work
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Unique identifier assigned on admission
    pub entry_id: String,
    pub status: EntryStatus,
    /// 0-100, higher runs sooner
    pub priority: i32,
    /// Stamped when the entry is admitted
    pub submission_time: Option<SystemTime>,
    /// Stamped on the first terminal transition
    pub end_time: Option<SystemTime>,
    /// Opaque reference to the submitted job document
    pub job_url: String,
    /// Current device execution phase, if the device has reported one
    pub phase: Option<String>,
}

impl QueueEntry {
    /// Create a Waiting entry stamped with the current time. Priority is
    /// clamped into the 0-100 range.
    pub fn new(entry_id: String, job_url: String, priority: i32) -> Self {
        Self {
            entry_id,
            status: EntryStatus::Waiting,
            priority: priority.clamp(0, MAX_PRIORITY),
            submission_time: Some(SystemTime::now()),
            end_time: None,
            job_url,
            phase: None,
        }
    }

    /// Transition to `status`, stamping the end time on the first terminal
    /// transition.
    pub fn set_status(&mut self, status: EntryStatus) {
        self.status = status;
        if status.is_terminal() && self.end_time.is_none() {
            self.end_time = Some(SystemTime::now());
        }
    }

    /// Sort key for terminal and held entries: the end time when present,
    /// the submission time otherwise.
    pub fn sort_time(&self) -> Option<SystemTime> {
        self.end_time.or(self.submission_time)
    }

    /// String value of a named attribute, used by the attribute-match
    /// filter. Unknown keys yield `None` and never match.
    pub fn attribute(&self, key: &str) -> Option<String> {
        match key {
            "QueueEntryID" => Some(self.entry_id.clone()),
            "Status" => Some(self.status.as_str().to_string()),
            "Priority" => Some(self.priority.to_string()),
            "JobURL" => Some(self.job_url.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_is_clamped() {
        let high = QueueEntry::new("qe1".to_string(), "file://job".to_string(), 250);
        assert_eq!(high.priority, 100);

        let low = QueueEntry::new("qe2".to_string(), "file://job".to_string(), -3);
        assert_eq!(low.priority, 0);
    }

    #[test]
    fn test_terminal_transition_stamps_end_time() {
        let mut entry = QueueEntry::new("qe1".to_string(), "file://job".to_string(), 50);
        assert!(entry.end_time.is_none());

        entry.set_status(EntryStatus::Running);
        assert!(entry.end_time.is_none());

        entry.set_status(EntryStatus::Completed);
        let first_end = entry.end_time;
        assert!(first_end.is_some());

        // A second terminal transition must not move the stamp
        entry.set_status(EntryStatus::Aborted);
        assert_eq!(entry.end_time, first_end);
    }

    #[test]
    fn test_status_rank_table() {
        assert!(EntryStatus::Running.rank() > EntryStatus::Suspended.rank());
        assert!(EntryStatus::Suspended.rank() > EntryStatus::Waiting.rank());
        assert!(EntryStatus::Waiting.rank() > EntryStatus::Held.rank());
        assert!(EntryStatus::Held.rank() > EntryStatus::Completed.rank());
        assert!(EntryStatus::Completed.rank() > EntryStatus::Aborted.rank());
        assert!(EntryStatus::Aborted.rank() > EntryStatus::Removed.rank());
    }

    #[test]
    fn test_attribute_lookup() {
        let entry = QueueEntry::new("qe7".to_string(), "file://job7".to_string(), 42);
        assert_eq!(entry.attribute("QueueEntryID"), Some("qe7".to_string()));
        assert_eq!(entry.attribute("Status"), Some("Waiting".to_string()));
        assert_eq!(entry.attribute("Priority"), Some("42".to_string()));
        assert_eq!(entry.attribute("JobURL"), Some("file://job7".to_string()));
        assert_eq!(entry.attribute("NoSuchKey"), None);
    }
}
