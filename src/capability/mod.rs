//! Capabilities
//!
//! Named read (observation) and write (action) operations an environment type
//! exposes for discovery and invocation. Each environment type builds its
//! [`CapabilityRegistry`] once, in an explicit registration pass, and every
//! instance shares it.

mod call;
mod registry;

pub use call::{ApiCall, CallArgs};
pub use registry::{AsyncHandler, CapabilityEntry, CapabilityRegistry, SyncHandler};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Read or write namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityKind {
    /// Observes the environment
    Read,
    /// Acts on the environment
    Write,
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityKind::Read => write!(f, "read"),
            CapabilityKind::Write => write!(f, "write"),
        }
    }
}

impl std::str::FromStr for CapabilityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(CapabilityKind::Read),
            "write" => Ok(CapabilityKind::Write),
            other => Err(format!("invalid capability kind: {} (must be 'read' or 'write')", other)),
        }
    }
}

/// Declared parameter of a capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    /// Type annotation, if the author gave one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,
    /// Default value; parameters with a default are optional
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Discovery descriptor for a capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
}

impl CapabilitySchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            params: Vec::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a required parameter
    pub fn param(mut self, name: impl Into<String>, type_hint: impl Into<String>) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            type_hint: Some(type_hint.into()),
            default: None,
        });
        self
    }

    /// Add an optional parameter with a default
    pub fn param_with_default(
        mut self,
        name: impl Into<String>,
        type_hint: impl Into<String>,
        default: Value,
    ) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            type_hint: Some(type_hint.into()),
            default: Some(default),
        });
        self
    }

    /// Parameter names in declaration order
    pub fn param_names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }
}
