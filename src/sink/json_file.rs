//! JSON array file sink.
//!
//! Each notification rewrites the whole file under a lock: read the array,
//! append one entry, write it back. Unparseable contents restart the array.

use super::{MessageSink, SinkEvent};
use crate::config::MessageLogConfig;
use crate::error::SinkError;
use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

/// Diagnostic snapshot of a file sink
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SinkStatus {
    pub enabled: bool,
    pub log_file_path: Option<PathBuf>,
    pub file_exists: bool,
    pub parent_dir_exists: bool,
}

/// Appends sink events to a JSON array file
pub struct JsonFileSink {
    enabled: bool,
    path: Option<PathBuf>,
    file_lock: Mutex<()>,
}

impl JsonFileSink {
    /// Disabled sink; every notification is a no-op
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            path: None,
            file_lock: Mutex::new(()),
        }
    }

    /// Enabled sink writing to `path`; the file is initialized to `[]` if missing
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let sink = Self {
            enabled: true,
            path: Some(path.into()),
            file_lock: Mutex::new(()),
        };
        sink.initialize()?;
        Ok(sink)
    }

    /// Build from configuration; a missing path defaults to
    /// `enhanced_logs/<YYYYMMDD_HHMMSS>.json` under the working directory.
    pub fn from_config(config: &MessageLogConfig) -> Result<Self, SinkError> {
        if !config.enabled {
            info!("Message log disabled");
            return Ok(Self::disabled());
        }
        let path = config.file.clone().unwrap_or_else(default_log_path);
        let sink = Self::open(path)?;
        info!(path = ?sink.path, "Message log enabled");
        Ok(sink)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn status(&self) -> SinkStatus {
        let path = self.path.clone();
        SinkStatus {
            enabled: self.enabled,
            file_exists: path.as_ref().map(|p| p.exists()).unwrap_or(false),
            parent_dir_exists: path
                .as_ref()
                .and_then(|p| p.parent())
                .map(|p| p.as_os_str().is_empty() || p.exists())
                .unwrap_or(false),
            log_file_path: path,
        }
    }

    /// All entries currently in the file
    pub fn read_entries(&self) -> Result<Vec<Value>, SinkError> {
        let path = self.path.as_ref().ok_or(SinkError::NoLogFile)?;
        let _guard = self.file_lock.lock();
        read_array(path)
    }

    fn initialize(&self) -> Result<(), SinkError> {
        let path = self.path.as_ref().ok_or(SinkError::NoLogFile)?;
        if path.exists() {
            return Ok(());
        }
        write_array(path, &[])
    }

    fn append(&self, entry: Value) -> Result<(), SinkError> {
        let path = self.path.as_ref().ok_or(SinkError::NoLogFile)?;
        let _guard = self.file_lock.lock();
        let mut entries = read_array(path)?;
        entries.push(entry);
        write_array(path, &entries)
    }
}

impl MessageSink for JsonFileSink {
    fn notify(&self, event: &SinkEvent) -> Result<(), SinkError> {
        if !self.enabled {
            return Ok(());
        }
        self.append(event.to_entry(Utc::now()))
    }
}

fn default_log_path() -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from("enhanced_logs").join(format!("{}.json", timestamp))
}

fn read_array(path: &Path) -> Result<Vec<Value>, SinkError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content).unwrap_or_default())
}

fn write_array(path: &Path, entries: &[Value]) -> Result<(), SinkError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string_pretty(entries)?;
    std::fs::write(path, content)?;
    Ok(())
}
