//! Command line arguments

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "presswork",
    about = "Device-side job queue controller for networked print production",
    version
)]
pub struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level spec (error, warn, info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Write the log to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<String>,

    /// Override the configured queue capacity
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Override the configured submission worker count
    #[arg(long)]
    pub workers: Option<usize>,
}
