pub mod app;
pub mod core;
pub mod notifications;
pub mod protocol;
pub mod queue;
