//! Command and query processors, one per protocol operation

pub mod channel;
pub mod entry_ops;
pub mod queue_ops;
pub mod status;
pub mod submit;

pub use channel::StopPersistentChannelProcessor;
pub use entry_ops::{AbortQueueEntryProcessor, RemoveQueueEntryProcessor};
pub use queue_ops::{QueueControlOp, QueueControlProcessor};
pub use status::QueueStatusProcessor;
pub use submit::SubmitQueueEntryProcessor;
