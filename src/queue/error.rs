//! Queue Error Types

use crate::queue::entry::EntryStatus;
use crate::queue::state::QueueStatus;

#[derive(Debug, Clone, thiserror::Error)]
pub enum QueueError {
    #[error("queue is not accepting entries (status: {status})")]
    NotAccepting { status: QueueStatus },

    #[error("queue capacity exhausted (capacity: {capacity})")]
    CapacityExhausted { capacity: usize },

    #[error("queue entry not found: {entry_id}")]
    EntryNotFound { entry_id: String },

    #[error("queue entry {entry_id} is {status} and cannot be removed")]
    EntryActive {
        entry_id: String,
        status: EntryStatus,
    },

    #[error("queue entry {entry_id} is already aborted")]
    AlreadyAborted { entry_id: String },

    #[error("queue entry {entry_id} is already completed")]
    AlreadyCompleted { entry_id: String },

    #[error("aborting queue entry {entry_id} while {status} is not supported")]
    AbortUnsupported {
        entry_id: String,
        status: EntryStatus,
    },
}

impl QueueError {
    /// Protocol return code for this failure. 0 is reserved for success and
    /// never produced here.
    pub fn return_code(&self) -> i32 {
        use crate::protocol::codes;
        match self {
            QueueError::NotAccepting { .. } => codes::RC_QUEUE_REJECTED,
            QueueError::CapacityExhausted { .. } => codes::RC_QUEUE_REJECTED,
            QueueError::EntryNotFound { .. } => codes::RC_ENTRY_NOT_FOUND,
            QueueError::EntryActive { .. } => codes::RC_ENTRY_ACTIVE,
            QueueError::AlreadyAborted { .. } => codes::RC_ALREADY_ABORTED,
            QueueError::AlreadyCompleted { .. } => codes::RC_ALREADY_COMPLETED,
            QueueError::AbortUnsupported { .. } => codes::RC_NOT_SUPPORTED,
        }
    }
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
