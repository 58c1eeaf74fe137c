//! Command/query protocol layer
//!
//! The message model for the five protocol kinds, the per-operation
//! processors, the dispatcher that routes inbound messages by declared
//! type, and the worker pool backing asynchronous submission.

pub mod codes;
pub mod dispatcher;
pub mod error;
pub mod message;
pub mod processor;
pub mod processors;
pub mod worker;

pub use dispatcher::ProtocolDispatcher;
pub use error::{ProtocolError, ProtocolResult};
pub use message::{Message, MessageFactory, MessageKind, SubscriptionDescriptor};
pub use processor::{MessageProcessor, ProcessorFamily};
pub use worker::{SubmitJob, SubmitWorkerHandle, SubmitWorkerPool};
