//! Environments
//!
//! [`ExtEnv`] is the contract every environment type implements: the
//! `reset`/`observe`/`step` lifecycle plus discovery and invocation of its
//! registered read and write capabilities. [`Environment`] is the generic
//! implementation that hosts roles, routes their messages, and drives rounds.

mod environment;
mod scheduler;

pub use environment::Environment;
pub use scheduler::{RoundPhase, RoundScheduler, RoundStats};

use crate::capability::{ApiCall, CapabilityKind, CapabilityRegistry, CapabilitySchema};
use crate::error::EnvError;
use crate::message::Message;
use crate::types::{Kwargs, Observation};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Result of one `step`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    pub observation: Observation,
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
    pub info: Kwargs,
}

/// Input accepted by [`ExtEnv::write_thru_api`]
#[derive(Debug, Clone, PartialEq)]
pub enum WriteRequest {
    /// Route a message through the environment's bus
    Message(Message),
    /// Invoke one write capability
    Call(ApiCall),
    /// Invoke several write capabilities in order; stops at the first error
    Batch(Vec<ApiCall>),
}

impl From<Message> for WriteRequest {
    fn from(message: Message) -> Self {
        WriteRequest::Message(message)
    }
}

impl From<ApiCall> for WriteRequest {
    fn from(call: ApiCall) -> Self {
        WriteRequest::Call(call)
    }
}

impl From<&str> for WriteRequest {
    fn from(api_name: &str) -> Self {
        WriteRequest::Call(ApiCall::new(api_name))
    }
}

impl From<String> for WriteRequest {
    fn from(api_name: String) -> Self {
        WriteRequest::Call(ApiCall::new(api_name))
    }
}

impl From<Vec<ApiCall>> for WriteRequest {
    fn from(calls: Vec<ApiCall>) -> Self {
        WriteRequest::Batch(calls)
    }
}

/// Environment contract
///
/// Capabilities are registered once per implementing type, in the registry
/// returned by [`ExtEnv::capabilities`]; handlers receive `&Self`, so state
/// they mutate lives behind interior mutability.
#[async_trait]
pub trait ExtEnv: Send + Sync + Sized + 'static {
    /// Action accepted by `step`
    type Action: Send + 'static;

    /// The registry shared by every instance of this type
    fn capabilities() -> Result<&'static CapabilityRegistry<Self>, EnvError>;

    /// Reset to an initial state, returning `(observation, info)`
    async fn reset(
        &self,
        seed: Option<u64>,
        options: Option<Kwargs>,
    ) -> Result<(Observation, Kwargs), EnvError>;

    /// Current observation
    async fn observe(&self, params: Option<Kwargs>) -> Result<Observation, EnvError>;

    /// Apply an action
    async fn step(&self, action: Self::Action) -> Result<StepOutcome, EnvError>;

    /// Route a message; returns whether any role received it.
    ///
    /// Environments without a bus keep the default.
    fn publish_message(&self, _message: Message) -> Result<bool, EnvError> {
        Err(EnvError::MessagingUnsupported)
    }

    /// Schemas of every capability of `kind`, in registration order
    fn get_all_available_apis(&self, kind: CapabilityKind) -> Result<Vec<CapabilitySchema>, EnvError> {
        Ok(Self::capabilities()?.list(kind))
    }

    /// Invoke a read capability by name or call descriptor
    async fn read_from_api<C>(&self, call: C) -> Result<Value, EnvError>
    where
        C: Into<ApiCall> + Send,
    {
        let call = call.into();
        Self::capabilities()?
            .invoke(CapabilityKind::Read, self, call)
            .await
    }

    /// Invoke a write capability, a batch of them, or publish a message.
    ///
    /// A message yields `true`/`false` for whether it found recipients; a
    /// batch yields the array of results.
    async fn write_thru_api<R>(&self, request: R) -> Result<Value, EnvError>
    where
        R: Into<WriteRequest> + Send,
    {
        match request.into() {
            WriteRequest::Message(message) => Ok(Value::Bool(self.publish_message(message)?)),
            WriteRequest::Call(call) => {
                Self::capabilities()?
                    .invoke(CapabilityKind::Write, self, call)
                    .await
            }
            WriteRequest::Batch(calls) => {
                let registry = Self::capabilities()?;
                let mut results = Vec::with_capacity(calls.len());
                for call in calls {
                    results.push(registry.invoke(CapabilityKind::Write, self, call).await?);
                }
                Ok(Value::Array(results))
            }
        }
    }
}
