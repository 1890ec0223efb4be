//! CLI Tooling
//!
//! Command-line interface for running a demo relay environment and
//! inspecting environment capabilities.

use crate::capability::{CapabilityKind, CapabilitySchema};
use crate::config::{ConfigLoader, RolebusConfig, SchedulerConfig};
use crate::demo::add_relay_chain;
use crate::env::{Environment, ExtEnv};
use crate::error::EnvError;
use crate::logging::LoggingConfig;
use crate::message::{Message, MessageTarget};
use crate::sink::{MemorySink, MessageSink};
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Rolebus CLI - address-routed messaging between cooperating roles
#[derive(Parser)]
#[command(name = "rolebus")]
#[command(about = "Route messages between roles and run them in rounds")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (TOML, YAML, or JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish a seed message into a relay chain and run rounds
    Run {
        /// Maximum rounds (defaults to scheduler.rounds)
        #[arg(long)]
        rounds: Option<usize>,
        /// Seed message content
        #[arg(long)]
        message: String,
        /// Target addresses; broadcast when omitted
        #[arg(long, value_delimiter = ',')]
        to: Vec<String>,
        /// Sender stamped on the seed message
        #[arg(long, default_value = "")]
        from: String,
        /// Relay chain, first to last
        #[arg(long, value_delimiter = ',', default_value = "Alice,Bob,Carol")]
        roles: Vec<String>,
        /// Print the message log entries after the history
        #[arg(long)]
        show_log: bool,
    },
    /// List environment capabilities
    Apis {
        /// Capability kind (read or write)
        #[arg(long, default_value = "read")]
        kind: CapabilityKind,
    },
}

impl Cli {
    /// Logging configuration with command-line overrides applied
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.output = output.clone();
        }
        config
    }
}

/// CLI context holding the loaded configuration
pub struct CliContext {
    config: RolebusConfig,
}

impl CliContext {
    /// Create a new CLI context
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, EnvError> {
        let config = ConfigLoader::load(config_path.as_deref())
            .map_err(|e| EnvError::ConfigError(e.to_string()))?;
        Ok(Self { config })
    }

    pub fn from_config(config: RolebusConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RolebusConfig {
        &self.config
    }

    /// Execute a CLI command
    pub async fn execute(&self, command: &Commands) -> Result<String, EnvError> {
        match command {
            Commands::Run {
                rounds,
                message,
                to,
                from,
                roles,
                show_log,
            } => {
                let request = RunRequest {
                    rounds: rounds.unwrap_or(self.config.scheduler.rounds),
                    message: message.clone(),
                    to: to.clone(),
                    from: from.clone(),
                    roles: roles.clone(),
                    show_log: *show_log,
                };
                self.run(request).await
            }
            Commands::Apis { kind } => self.apis(*kind),
        }
    }

    async fn run(&self, request: RunRequest) -> Result<String, EnvError> {
        let memory = Arc::new(MemorySink::new());
        let scheduler = SchedulerConfig {
            rounds: request.rounds,
            ..self.config.scheduler.clone()
        };
        let extra = if request.show_log {
            vec![memory.clone() as Arc<dyn MessageSink>]
        } else {
            Vec::new()
        };
        let env = Environment::from_config_with_sinks(&self.config, extra)?
            .with_scheduler_config(scheduler);

        let names: Vec<&str> = request.roles.iter().map(String::as_str).collect();
        add_relay_chain(&env, &names);

        let target = if request.to.is_empty() {
            MessageTarget::Broadcast
        } else {
            MessageTarget::any(request.to.iter().cloned())
        };
        env.publish_message(
            Message::new(request.message)
                .from_sender(request.from)
                .to(target),
        )?;

        let rounds_run = env.run_configured().await?;
        info!(rounds = rounds_run, "Run finished");

        let mut output = format!("Ran {} round(s)\n", rounds_run);
        for (i, message) in env.history().messages().iter().enumerate() {
            output.push_str(&format!(
                "[{}] {} -> [{}]: {}\n",
                i,
                env.bus().format_sender(message),
                env.bus().format_recipients(message).join(", "),
                message.content
            ));
        }

        env.flush_log();
        if request.show_log {
            output.push_str("\nMessage log:\n");
            for entry in memory.entries() {
                output.push_str(&serde_json::to_string(&entry)?);
                output.push('\n');
            }
        }
        Ok(output)
    }

    fn apis(&self, kind: CapabilityKind) -> Result<String, EnvError> {
        let env = Environment::new(self.config.desc.clone());
        let schemas = env.get_all_available_apis(kind)?;
        Ok(format_capability_table(&schemas))
    }
}

struct RunRequest {
    rounds: usize,
    message: String,
    to: Vec<String>,
    from: String,
    roles: Vec<String>,
    show_log: bool,
}

/// Render capability schemas as a table
pub fn format_capability_table(schemas: &[CapabilitySchema]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Name", "Parameters", "Description"]);
    for schema in schemas {
        let params: Vec<String> = schema
            .params
            .iter()
            .map(|p| {
                let mut rendered = p.name.clone();
                if let Some(hint) = &p.type_hint {
                    rendered.push_str(&format!(": {}", hint));
                }
                if let Some(default) = &p.default {
                    rendered.push_str(&format!(" = {}", default));
                }
                rendered
            })
            .collect();
        table.add_row(vec![
            schema.name.clone(),
            params.join(", "),
            schema.description.clone().unwrap_or_default(),
        ]);
    }
    table.to_string()
}
