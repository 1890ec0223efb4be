//! Generic environment: hosts roles, routes their messages, drives rounds.

use super::{ExtEnv, RoundScheduler, RoundStats, StepOutcome, WriteRequest};
use crate::bus::{EnvHandle, History, MessageBus};
use crate::capability::{CapabilityRegistry, CapabilitySchema};
use crate::config::{RolebusConfig, SchedulerConfig};
use crate::error::EnvError;
use crate::message::Message;
use crate::role::{Role, RoleRegistry};
use crate::sink::{FanoutSink, JsonFileSink, MessageSink, SinkEvent};
use crate::types::{AddressSet, Kwargs, Observation};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

static ENVIRONMENT_CAPABILITIES: OnceLock<CapabilityRegistry<Environment>> = OnceLock::new();

/// Role host with address-routed messaging and round scheduling
pub struct Environment {
    desc: String,
    roles: RwLock<RoleRegistry>,
    bus: Arc<MessageBus>,
    scheduler: RoundScheduler,
    scheduler_config: SchedulerConfig,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new("")
    }
}

impl Environment {
    pub fn new(desc: impl Into<String>) -> Self {
        Self::with_bus(desc, MessageBus::new())
    }

    /// Environment whose bus reports every publish to `sink`
    pub fn with_sink(desc: impl Into<String>, sink: Arc<dyn MessageSink>) -> Self {
        Self::with_bus(desc, MessageBus::with_sink(sink))
    }

    pub fn with_bus(desc: impl Into<String>, bus: MessageBus) -> Self {
        Self {
            desc: desc.into(),
            roles: RwLock::new(RoleRegistry::new()),
            bus: Arc::new(bus),
            scheduler: RoundScheduler::new(),
            scheduler_config: SchedulerConfig::default(),
        }
    }

    /// Build from configuration, opening the message log when enabled
    pub fn from_config(config: &RolebusConfig) -> Result<Self, EnvError> {
        Self::from_config_with_sinks(config, Vec::new())
    }

    /// Build from configuration, reporting to `extra` sinks alongside the
    /// configured message log
    pub fn from_config_with_sinks(
        config: &RolebusConfig,
        extra: Vec<Arc<dyn MessageSink>>,
    ) -> Result<Self, EnvError> {
        let mut sinks = Vec::with_capacity(extra.len() + 1);
        if config.message_log.enabled {
            let sink = JsonFileSink::from_config(&config.message_log)?;
            sinks.push(Arc::new(sink) as Arc<dyn MessageSink>);
        }
        sinks.extend(extra);

        let env = if sinks.len() > 1 {
            Self::with_sink(config.desc.clone(), Arc::new(FanoutSink::new(sinks)))
        } else if let Some(sink) = sinks.pop() {
            Self::with_sink(config.desc.clone(), sink)
        } else {
            Self::new(config.desc.clone())
        };
        Ok(env.with_scheduler_config(config.scheduler.clone()))
    }

    pub fn with_scheduler_config(mut self, config: SchedulerConfig) -> Self {
        self.scheduler_config = config;
        self
    }

    pub fn desc(&self) -> &str {
        &self.desc
    }

    /// Add one role; see [`Environment::add_roles`]
    pub fn add_role(&self, role: Arc<dyn Role>) {
        self.add_roles([role]);
    }

    /// Add roles, subscribe each to its own addresses, and hand each a
    /// publishing handle.
    ///
    /// Every role is registered before any is attached, so a role may
    /// address its peers from `set_env`. A role whose name is already
    /// registered replaces the previous one.
    pub fn add_roles<I>(&self, roles: I)
    where
        I: IntoIterator<Item = Arc<dyn Role>>,
    {
        let roles: Vec<Arc<dyn Role>> = roles.into_iter().collect();
        {
            let mut registry = self.roles.write();
            for role in &roles {
                registry.register(Arc::clone(role));
            }
        }
        for role in roles {
            info!(role = %role.name(), "Role added");
            self.bus.set_addresses(Arc::clone(&role), role.addresses());
            role.set_env(self.handle());
        }
    }

    /// Replace the address set of a registered role
    pub fn set_addresses(&self, role_name: &str, addresses: AddressSet) -> Result<(), EnvError> {
        let role = self
            .get_role(role_name)
            .ok_or_else(|| EnvError::InvalidArgument(format!("unknown role '{}'", role_name)))?;
        self.bus.set_addresses(role, addresses);
        Ok(())
    }

    /// Address set of a role, empty if unknown
    pub fn get_addresses(&self, role_name: &str) -> AddressSet {
        self.bus.get_addresses(role_name)
    }

    pub fn get_role(&self, name: &str) -> Option<Arc<dyn Role>> {
        self.roles.read().get(name)
    }

    /// All roles in registration order
    pub fn get_roles(&self) -> Vec<Arc<dyn Role>> {
        self.roles.read().list_all()
    }

    pub fn role_names(&self) -> Vec<String> {
        self.roles.read().role_names()
    }

    /// True iff every role is idle
    pub fn is_idle(&self) -> bool {
        self.roles.read().all_idle()
    }

    /// Debug history of published messages
    pub fn history(&self) -> &History {
        self.bus.history()
    }

    pub fn bus(&self) -> &Arc<MessageBus> {
        &self.bus
    }

    /// Handle roles use to publish into this environment
    pub fn handle(&self) -> EnvHandle {
        EnvHandle::new(Arc::clone(&self.bus))
    }

    pub fn scheduler(&self) -> &RoundScheduler {
        &self.scheduler
    }

    pub fn scheduler_config(&self) -> &SchedulerConfig {
        &self.scheduler_config
    }

    /// Report an LLM request/response pair to the message log
    pub fn log_api_request(
        &self,
        model: impl Into<String>,
        request: Vec<Value>,
        response: impl Into<String>,
        stream: bool,
    ) {
        self.bus.record(SinkEvent::ApiRequest {
            model: model.into(),
            request,
            response: response.into(),
            stream,
        });
    }

    /// Wait until the message log has received everything published so far
    pub fn flush_log(&self) {
        self.bus.flush_sink();
    }

    /// Run `k` rounds; rounds with no pending work still count
    pub async fn run(&self, k: usize) -> Result<(), EnvError> {
        for round in 0..k {
            self.run_round(round).await?;
        }
        Ok(())
    }

    /// Run up to `max_rounds` rounds, stopping once every role is idle.
    ///
    /// Returns the number of rounds run.
    pub async fn run_until_idle(&self, max_rounds: usize) -> Result<usize, EnvError> {
        for round in 0..max_rounds {
            if self.is_idle() {
                debug!(round, "Environment idle");
                return Ok(round);
            }
            self.run_round(round).await?;
        }
        Ok(max_rounds)
    }

    /// Run as many rounds as the scheduler configuration asks for
    pub async fn run_configured(&self) -> Result<usize, EnvError> {
        let rounds = self.scheduler_config.rounds;
        if self.scheduler_config.stop_when_idle {
            self.run_until_idle(rounds).await
        } else {
            self.run(rounds).await?;
            Ok(rounds)
        }
    }

    async fn run_round(&self, round: usize) -> Result<RoundStats, EnvError> {
        let roles = self.get_roles();
        self.scheduler.run_round(round, roles).await
    }

    fn role_snapshot(&self, role: &dyn Role) -> Value {
        json!({
            "name": role.name(),
            "type": role.type_name(),
            "addresses": self.get_addresses(role.name()),
            "idle": role.is_idle(),
        })
    }

    fn register_capabilities(registry: &mut CapabilityRegistry<Self>) -> Result<(), EnvError> {
        registry
            .read(
                CapabilitySchema::new("role_names").describe("Names of the hosted roles"),
                |env: &Environment, _| Ok(json!(env.role_names())),
            )?
            .read(
                CapabilitySchema::new("get_addresses")
                    .describe("Addresses a role listens on")
                    .param("role", "str"),
                |env: &Environment, args| {
                    let role: String = args.get("role")?;
                    Ok(json!(env.get_addresses(&role)))
                },
            )?
            .read(
                CapabilitySchema::new("history").describe("Every published message, in order"),
                |env: &Environment, _| Ok(serde_json::to_value(env.history().messages())?),
            )?
            .write(
                CapabilitySchema::new("set_addresses")
                    .describe("Replace the addresses a role listens on")
                    .param("role", "str")
                    .param("addresses", "list[str]"),
                |env: &Environment, args| {
                    let role: String = args.get("role")?;
                    let addresses: AddressSet = args.get("addresses")?;
                    env.set_addresses(&role, addresses)?;
                    Ok(Value::Null)
                },
            )?;
        Ok(())
    }
}

#[async_trait]
impl ExtEnv for Environment {
    type Action = WriteRequest;

    fn capabilities() -> Result<&'static CapabilityRegistry<Self>, EnvError> {
        CapabilityRegistry::get_or_build(&ENVIRONMENT_CAPABILITIES, Self::register_capabilities)
    }

    async fn reset(
        &self,
        seed: Option<u64>,
        options: Option<Kwargs>,
    ) -> Result<(Observation, Kwargs), EnvError> {
        debug!(?seed, "reset");
        let mut info = options.unwrap_or_default();
        info.insert("seed".to_string(), json!(seed));
        Ok((self.observe(None).await?, info))
    }

    /// `{"role": name}` narrows the observation to one role
    async fn observe(&self, params: Option<Kwargs>) -> Result<Observation, EnvError> {
        if let Some(name) = params.as_ref().and_then(|p| p.get("role")) {
            let name = name
                .as_str()
                .ok_or_else(|| EnvError::InvalidArgument("'role' must be a string".to_string()))?;
            let role = self
                .get_role(name)
                .ok_or_else(|| EnvError::InvalidArgument(format!("unknown role '{}'", name)))?;
            return Ok(self.role_snapshot(role.as_ref()));
        }

        let roles: Vec<Value> = self
            .get_roles()
            .iter()
            .map(|role| self.role_snapshot(role.as_ref()))
            .collect();
        Ok(json!({
            "desc": self.desc,
            "roles": roles,
            "history_len": self.history().len(),
            "idle": self.is_idle(),
        }))
    }

    /// Apply the write, then run one round
    async fn step(&self, action: WriteRequest) -> Result<StepOutcome, EnvError> {
        let result = self.write_thru_api(action).await?;
        let round = self.scheduler.rounds_completed();
        let stats = self.run_round(round).await?;

        let mut info = Kwargs::new();
        info.insert("result".to_string(), result);
        info.insert("dispatched".to_string(), json!(stats.dispatched));
        Ok(StepOutcome {
            observation: self.observe(None).await?,
            reward: 0.0,
            terminated: self.is_idle(),
            truncated: false,
            info,
        })
    }

    fn publish_message(&self, message: Message) -> Result<bool, EnvError> {
        Ok(self.bus.publish(message))
    }
}
