//! Entry ordering and query filtering
//!
//! The comparator defines the total order used both for display and for
//! first-runnable selection: status rank first, then a per-status tie-break.
//! Filters never mutate entries; they operate on the defensive copies handed
//! out by the store and shape what a caller is allowed to see.

use crate::queue::entry::{EntryStatus, QueueEntry};
use crate::queue::state::QueueStatus;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::SystemTime;

/// Sort direction for query results. Descending puts the highest status
/// rank (Running) first and is the default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Descending,
    Ascending,
}

/// How much of each entry a query response includes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetailLevel {
    /// No entries at all, only the aggregate queue status
    None,
    /// All entries without phase or job document detail
    #[default]
    Brief,
    /// Adds the current device execution phase
    JobPhase,
    /// Adds the full job document reference
    #[serde(rename = "JDF")]
    Jdf,
}

impl DetailLevel {
    /// Parse the protocol spelling of a detail level
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "None" => Some(DetailLevel::None),
            "Brief" => Some(DetailLevel::Brief),
            "JobPhase" => Some(DetailLevel::JobPhase),
            "JDF" => Some(DetailLevel::Jdf),
            _ => None,
        }
    }
}

/// Compare two entries in descending rank order (Running first)
///
/// Tie-breaks within one rank:
/// - Waiting entries: higher priority first, then earlier submission.
/// - Everything else: earlier end time first, submission time standing in
///   when no end time is stamped. An entry with no time at all sorts before
///   one that has a time; two timeless entries compare equal.
pub fn compare_entries(a: &QueueEntry, b: &QueueEntry) -> Ordering {
    match b.status.rank().cmp(&a.status.rank()) {
        Ordering::Equal => tie_break(a, b),
        other => other,
    }
}

fn tie_break(a: &QueueEntry, b: &QueueEntry) -> Ordering {
    if a.status == EntryStatus::Waiting && b.status == EntryStatus::Waiting {
        b.priority
            .cmp(&a.priority)
            .then_with(|| compare_times(a.submission_time, b.submission_time))
    } else {
        compare_times(a.sort_time(), b.sort_time())
    }
}

fn compare_times(a: Option<SystemTime>, b: Option<SystemTime>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.cmp(&y),
    }
}

/// Sort a snapshot of entries without mutating any of them
pub fn sort_entries(entries: &mut [QueueEntry], direction: SortDirection) {
    match direction {
        SortDirection::Descending => entries.sort_by(compare_entries),
        SortDirection::Ascending => entries.sort_by(|a, b| compare_entries(b, a)),
    }
}

/// Query filter combining the attribute-match and detail-level strategies
#[derive(Clone, Debug, Default)]
pub struct QueueFilter {
    pub details: DetailLevel,
    /// Result cap; 0 or anything past the current count means unlimited
    pub max_entries: usize,
    /// Entries must match every key/value pair; an empty map matches all
    pub attributes: HashMap<String, String>,
    pub direction: SortDirection,
}

impl QueueFilter {
    /// Apply the filter to a snapshot of entries, producing the view a
    /// caller may see. Entries are sorted globally before the cap applies.
    pub fn apply(&self, mut entries: Vec<QueueEntry>, status: QueueStatus) -> QueueSnapshot {
        let total = entries.len();
        sort_entries(&mut entries, self.direction);

        if !self.attributes.is_empty() {
            entries.retain(|entry| {
                self.attributes
                    .iter()
                    .all(|(key, value)| entry.attribute(key).as_deref() == Some(value))
            });
        }

        let views = match self.details {
            DetailLevel::None => Vec::new(),
            detail => {
                let cap = if self.max_entries == 0 || self.max_entries > entries.len() {
                    entries.len()
                } else {
                    self.max_entries
                };
                entries
                    .into_iter()
                    .take(cap)
                    .map(|entry| QueueEntryView::of(&entry, detail))
                    .collect()
            }
        };

        QueueSnapshot {
            status,
            entry_count: total,
            entries: views,
        }
    }
}

/// One entry as exposed by a query response, truncated per detail level
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueueEntryView {
    pub entry_id: String,
    pub status: EntryStatus,
    pub priority: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_time: Option<SystemTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<SystemTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_url: Option<String>,
}

impl QueueEntryView {
    fn of(entry: &QueueEntry, detail: DetailLevel) -> Self {
        Self {
            entry_id: entry.entry_id.clone(),
            status: entry.status,
            priority: entry.priority,
            submission_time: entry.submission_time,
            end_time: entry.end_time,
            phase: match detail {
                DetailLevel::JobPhase | DetailLevel::Jdf => entry.phase.clone(),
                _ => None,
            },
            job_url: match detail {
                DetailLevel::Jdf => Some(entry.job_url.clone()),
                _ => None,
            },
        }
    }
}

/// Filtered view of the queue answered to a status query
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub status: QueueStatus,
    /// Total admitted entries before filtering
    pub entry_count: usize,
    pub entries: Vec<QueueEntryView>,
}
