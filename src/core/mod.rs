//! Core services and infrastructure

pub mod config;
pub mod logging;
