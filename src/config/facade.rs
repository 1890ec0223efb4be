//! ConfigLoader: composes defaults, an optional file, and environment overrides.

use super::RolebusConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use std::path::Path;

/// Prefix for environment overrides, e.g. `ROLEBUS__SCHEDULER__ROUNDS=5`
pub const ENV_PREFIX: &str = "ROLEBUS";

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration.
    /// Precedence: defaults (lowest) -> file, when given -> environment (highest).
    pub fn load(path: Option<&Path>) -> Result<RolebusConfig, ConfigError> {
        let mut builder = Self::builder_with_defaults()?;
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let builder = Self::add_environment(builder);
        builder.build()?.try_deserialize()
    }

    /// Load configuration from a specific file with environment overlay.
    pub fn load_from_file(path: &Path) -> Result<RolebusConfig, ConfigError> {
        Self::load(Some(path))
    }

    /// Create default configuration.
    pub fn default() -> RolebusConfig {
        RolebusConfig::default()
    }

    fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("desc", "")?
            .set_default("scheduler.rounds", 1_i64)?
            .set_default("scheduler.stop_when_idle", true)?
            .set_default("message_log.enabled", false)
    }

    fn add_environment(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
        builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
    }
}
