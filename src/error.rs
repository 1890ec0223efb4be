//! Error types for environment, capability, and sink operations.

use crate::capability::CapabilityKind;
use thiserror::Error;

/// Errors surfaced by environments, the capability registry, and the round driver.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("unknown {kind} capability: {name}")]
    UnknownCapability { kind: CapabilityKind, name: String },

    #[error("{kind} capability already registered: {name}")]
    DuplicateCapability { kind: CapabilityKind, name: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("environment does not route messages")]
    MessagingUnsupported,

    #[error("role {role} failed: {reason}")]
    RoleFailed { role: String, reason: String },

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EnvError {
    /// Shorthand for a role failure with a displayable reason.
    pub fn role_failed(role: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        EnvError::RoleFailed {
            role: role.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors raised by a message log sink. Never propagated out of `publish`.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("sink has no log file configured")]
    NoLogFile,
}
