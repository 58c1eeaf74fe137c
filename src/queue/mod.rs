//! Device-side job queue
//!
//! This module is the queue engine of the device: entry storage with a hard
//! capacity bound, the flag-driven queue status state machine, and the
//! ordering/filtering policy that determines execution sequence and what a
//! query may see.
//!
//! # Architecture
//!
//! ```text
//! ProtocolDispatcher -> CommandProcessor -> QueueEngine
//!                                              |
//!                             +----------------+----------------+
//!                             |                |                |
//!                        EntryStore     QueueStateMachine  OrderingPolicy
//!                             |                |
//!                             +---- one mutex -+--> lifecycle events
//! ```
//!
//! Entry mutation, capacity-flag maintenance and status recomputation form
//! one atomic unit; lifecycle events are emitted after the lock is released.

pub mod engine;
pub mod entry;
pub mod error;
pub mod ordering;
pub mod state;
pub mod store;

pub use engine::{QueueEngine, SubmitParams};
pub use entry::{EntryStatus, QueueEntry, MAX_PRIORITY};
pub use error::{QueueError, QueueResult};
pub use ordering::{
    compare_entries, sort_entries, DetailLevel, QueueEntryView, QueueFilter, QueueSnapshot,
    SortDirection,
};
pub use state::{QueueStateMachine, QueueStatus, QueueStatusListener};
pub use store::EntryStore;
