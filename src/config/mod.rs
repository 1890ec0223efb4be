//! Configuration
//!
//! Environment, message log, scheduler, and logging settings. Loaded through
//! [`ConfigLoader`] from defaults, an optional file, and `ROLEBUS__*`
//! environment variables.

mod facade;

pub use facade::ConfigLoader;

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RolebusConfig {
    /// Environment description
    #[serde(default)]
    pub desc: String,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub message_log: MessageLogConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Message log sink settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageLogConfig {
    /// Record routed messages to a JSON file
    #[serde(default)]
    pub enabled: bool,

    /// Target file; defaults to `enhanced_logs/<timestamp>.json`
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Round scheduling settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Rounds per `run` call
    #[serde(default = "default_rounds")]
    pub rounds: usize,

    /// Stop before exhausting `rounds` once every role is idle
    #[serde(default = "default_true")]
    pub stop_when_idle: bool,
}

fn default_rounds() -> usize {
    1
}

fn default_true() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            stop_when_idle: default_true(),
        }
    }
}
