//! Application entry point and wiring

pub mod args;
pub mod startup;
