//! Device configuration
//!
//! Loaded from a TOML file; every section falls back to built-in defaults
//! so a missing or partial file still yields a working device.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum number of admitted entries; 0 admits nothing
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { capacity: 100 }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Number of background submission workers
    pub count: usize,
    /// Pending background submissions accepted before rejecting
    pub backlog: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            count: 2,
            backlog: 16,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: Option<String>,
    pub file: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub queue: QueueConfig,
    pub workers: WorkerConfig,
    pub log: LogConfig,
    /// Event-class name to query-type signal mapping. An empty table means
    /// "use the built-in defaults"; classes absent from the effective table
    /// are never broadcast.
    pub signals: HashMap<String, String>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            queue: QueueConfig::default(),
            workers: WorkerConfig::default(),
            log: LogConfig::default(),
            signals: HashMap::new(),
        }
    }
}

impl DeviceConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// The effective signal map: the configured table, or the built-in
    /// defaults when the table is empty
    pub fn signal_map(&self) -> crate::notifications::subscription::SignalMap {
        use crate::notifications::subscription::SignalMap;
        if self.signals.is_empty() {
            SignalMap::default()
        } else {
            SignalMap::from_table(self.signals.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = DeviceConfig::default();
        assert_eq!(config.queue.capacity, 100);
        assert_eq!(config.workers.count, 2);
        assert!(config.signals.is_empty());
        // Empty table falls back to built-in mapping
        assert!(config.signal_map().recognizes_query("QueueStatus"));
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[queue]
capacity = 3

[signals]
QueueStatusChanged = "QueueStatus"
"#
        )
        .unwrap();

        let config = DeviceConfig::load(file.path()).unwrap();
        assert_eq!(config.queue.capacity, 3);
        // Unspecified sections keep defaults
        assert_eq!(config.workers.backlog, 16);

        // A configured table replaces the defaults entirely
        let map = config.signal_map();
        assert!(map.recognizes_query("QueueStatus"));
        assert!(!map.recognizes_query("Events"));
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "queue = \"not a table\"").unwrap();
        assert!(matches!(
            DeviceConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            DeviceConfig::load(Path::new("/nonexistent/presswork.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
