//! Entry storage with capacity enforcement
//!
//! The `EntryStore` owns every admitted entry. It is deliberately not locked
//! internally: the queue engine wraps the store, the state machine and event
//! emission in a single mutex so that admission checks and status
//! recomputation form one atomic unit.

use crate::queue::entry::QueueEntry;
use crate::queue::error::{QueueError, QueueResult};
use std::collections::HashMap;

/// Bounded storage for queue entries
///
/// `capacity` is the maximum number of admitted entries, not the current
/// occupancy. A capacity of zero admits nothing. The invariant
/// `count() <= capacity()` holds at every observation point.
#[derive(Debug)]
pub struct EntryStore {
    entries: HashMap<String, QueueEntry>,
    capacity: usize,
}

impl EntryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
        }
    }

    /// Maximum number of admitted entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of admitted entries
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// True when no further entry can be admitted
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Admit a new entry. Rejects when the store is at capacity.
    pub fn add(&mut self, entry: QueueEntry) -> QueueResult<()> {
        if self.is_full() {
            return Err(QueueError::CapacityExhausted {
                capacity: self.capacity,
            });
        }
        self.entries.insert(entry.entry_id.clone(), entry);
        Ok(())
    }

    /// Upsert an entry, replacing any entry sharing the id. Inserting a new
    /// id is subject to the same capacity check as `add`.
    pub fn put(&mut self, entry: QueueEntry) -> QueueResult<()> {
        if !self.entries.contains_key(&entry.entry_id) && self.is_full() {
            return Err(QueueError::CapacityExhausted {
                capacity: self.capacity,
            });
        }
        self.entries.insert(entry.entry_id.clone(), entry);
        Ok(())
    }

    /// Independent copy of the entry with the given id
    pub fn get(&self, entry_id: &str) -> Option<QueueEntry> {
        self.entries.get(entry_id).cloned()
    }

    pub(crate) fn get_mut(&mut self, entry_id: &str) -> Option<&mut QueueEntry> {
        self.entries.get_mut(entry_id)
    }

    /// Remove and return the entry with the given id
    pub fn remove(&mut self, entry_id: &str) -> Option<QueueEntry> {
        self.entries.remove(entry_id)
    }

    /// Independent copies of all entries, in no particular order
    pub fn all(&self) -> Vec<QueueEntry> {
        self.entries.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::entry::EntryStatus;

    fn entry(id: &str) -> QueueEntry {
        QueueEntry::new(id.to_string(), format!("file://{id}"), 50)
    }

    #[test]
    fn test_add_within_capacity() {
        let mut store = EntryStore::new(2);
        assert!(store.add(entry("qe1")).is_ok());
        assert!(store.add(entry("qe2")).is_ok());
        assert_eq!(store.count(), 2);
        assert!(store.is_full());
    }

    #[test]
    fn test_add_rejects_at_capacity() {
        let mut store = EntryStore::new(1);
        store.add(entry("qe1")).unwrap();

        match store.add(entry("qe2")) {
            Err(QueueError::CapacityExhausted { capacity }) => assert_eq!(capacity, 1),
            other => panic!("expected CapacityExhausted, got {other:?}"),
        }
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_zero_capacity_admits_nothing() {
        let mut store = EntryStore::new(0);
        assert!(store.is_full());
        assert!(store.add(entry("qe1")).is_err());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_put_replaces_without_capacity_check() {
        let mut store = EntryStore::new(1);
        store.add(entry("qe1")).unwrap();

        let mut replacement = entry("qe1");
        replacement.set_status(EntryStatus::Running);
        assert!(store.put(replacement).is_ok());
        assert_eq!(store.count(), 1);
        assert_eq!(store.get("qe1").unwrap().status, EntryStatus::Running);

        // A fresh id still respects capacity
        assert!(store.put(entry("qe2")).is_err());
    }

    #[test]
    fn test_get_returns_defensive_copy() {
        let mut store = EntryStore::new(4);
        store.add(entry("qe1")).unwrap();

        let mut copy = store.get("qe1").unwrap();
        copy.set_status(EntryStatus::Aborted);

        // Mutating the copy must not affect the stored entry
        assert_eq!(store.get("qe1").unwrap().status, EntryStatus::Waiting);
    }

    #[test]
    fn test_remove_frees_capacity() {
        let mut store = EntryStore::new(1);
        store.add(entry("qe1")).unwrap();
        assert!(store.is_full());

        let removed = store.remove("qe1");
        assert!(removed.is_some());
        assert!(!store.is_full());
        assert!(store.remove("qe1").is_none());
    }
}
