//! Logger initialisation via flexi_logger

use flexi_logger::{FileSpec, Logger, LoggerHandle};
use std::sync::{Mutex, OnceLock};

// Global handle so the level can be adjusted at runtime
static LOGGER_HANDLE: OnceLock<Mutex<LoggerHandle>> = OnceLock::new();

/// Initialise logging with an optional level spec and log file
///
/// Format and file destination are fixed at initialisation; only the log
/// level can be changed later via `set_logging_level`.
pub fn init_logging(
    log_level: Option<&str>,
    log_file: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let level_str = log_level.unwrap_or("info");
    let mut logger = Logger::try_with_str(level_str)?.format(simple_format);

    if let Some(file_path) = log_file {
        let file_spec = FileSpec::try_from(std::path::Path::new(file_path))?;
        logger = logger.log_to_file(file_spec);
    }

    let handle = logger.start()?;
    let _ = LOGGER_HANDLE.set(Mutex::new(handle));
    Ok(())
}

/// Adjust the active log level at runtime
pub fn set_logging_level(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let handle_mutex = LOGGER_HANDLE
        .get()
        .ok_or("logger not initialised; call init_logging first")?;
    let mut handle = handle_mutex
        .lock()
        .map_err(|_| "could not acquire logger handle lock")?;
    handle.parse_and_push_temp_spec(level)?;
    Ok(())
}

// Format: "YYYY-MM-DD HH:mm:ss.fff INF message (target)"
fn simple_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    let level_abbr = match record.level() {
        log::Level::Error => "ERR",
        log::Level::Warn => "WRN",
        log::Level::Info => "INF",
        log::Level::Debug => "DBG",
        log::Level::Trace => "TRC",
    };

    write!(
        w,
        "{} {} {} ({})",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        level_abbr,
        record.args(),
        record.target()
    )
}
