//! Structured call descriptors and argument binding.

use super::ParamSpec;
use crate::error::EnvError;
use crate::types::Kwargs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// `{api_name, args, kwargs}` call descriptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiCall {
    pub api_name: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Kwargs,
}

impl ApiCall {
    pub fn new(api_name: impl Into<String>) -> Self {
        Self {
            api_name: api_name.into(),
            args: Vec::new(),
            kwargs: Kwargs::new(),
        }
    }

    /// Append a positional argument
    pub fn arg(mut self, value: Value) -> Self {
        self.args.push(value);
        self
    }

    /// Set a keyword argument
    pub fn kwarg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.kwargs.insert(name.into(), value);
        self
    }
}

impl From<&str> for ApiCall {
    fn from(api_name: &str) -> Self {
        ApiCall::new(api_name)
    }
}

impl From<String> for ApiCall {
    fn from(api_name: String) -> Self {
        ApiCall::new(api_name)
    }
}

/// Arguments handed to a capability handler
///
/// Named lookups bind lazily against the declared parameters: keyword first,
/// then the positional slot of that parameter, then its default.
#[derive(Debug, Clone)]
pub struct CallArgs {
    args: Vec<Value>,
    kwargs: Kwargs,
    params: Arc<[ParamSpec]>,
}

impl CallArgs {
    pub(crate) fn bound(args: Vec<Value>, kwargs: Kwargs, params: Arc<[ParamSpec]>) -> Self {
        Self {
            args,
            kwargs,
            params,
        }
    }

    /// Raw value for parameter `name`, if supplied or defaulted
    pub fn value(&self, name: &str) -> Option<&Value> {
        if let Some(v) = self.kwargs.get(name) {
            return Some(v);
        }
        let pos = self.params.iter().position(|p| p.name == name)?;
        self.args
            .get(pos)
            .or_else(|| self.params[pos].default.as_ref())
    }

    /// Deserialize parameter `name`
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, EnvError> {
        let value = self
            .value(name)
            .ok_or_else(|| EnvError::InvalidArgument(format!("missing argument '{}'", name)))?;
        serde_json::from_value(value.clone()).map_err(|e| {
            EnvError::InvalidArgument(format!("argument '{}' has the wrong type: {}", name, e))
        })
    }

    /// Deserialize parameter `name`, falling back to `default` when absent
    pub fn get_or<T: DeserializeOwned>(&self, name: &str, default: T) -> Result<T, EnvError> {
        match self.value(name) {
            Some(_) => self.get(name),
            None => Ok(default),
        }
    }

    /// Deserialize the positional argument at `index`
    pub fn arg<T: DeserializeOwned>(&self, index: usize) -> Result<T, EnvError> {
        let value = self.args.get(index).ok_or_else(|| {
            EnvError::InvalidArgument(format!("missing positional argument {}", index))
        })?;
        serde_json::from_value(value.clone()).map_err(|e| {
            EnvError::InvalidArgument(format!("positional argument {} has the wrong type: {}", index, e))
        })
    }

    pub fn positional(&self) -> &[Value] {
        &self.args
    }

    pub fn kwargs(&self) -> &Kwargs {
        &self.kwargs
    }
}
