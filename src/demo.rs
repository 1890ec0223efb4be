//! Demo roles used by the `rolebus run` command.
//!
//! A [`Relay`] consumes its inbox each round and, if it has a next hop,
//! forwards every message there stamped with its own name. Chained relays
//! show the bus and the round scheduler working together without any
//! outside collaborator.

use crate::bus::EnvHandle;
use crate::env::Environment;
use crate::error::EnvError;
use crate::message::{Message, MessageTarget};
use crate::role::{Inbox, Role};
use crate::types::Address;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Role that forwards what it receives to a fixed next hop
pub struct Relay {
    name: String,
    next_hop: Option<Address>,
    inbox: Inbox,
    env: Mutex<Option<EnvHandle>>,
}

impl Relay {
    pub fn new(name: impl Into<String>, next_hop: Option<Address>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            next_hop,
            inbox: Inbox::new(),
            env: Mutex::new(None),
        })
    }
}

#[async_trait]
impl Role for Relay {
    fn name(&self) -> &str {
        &self.name
    }

    fn put_message(&self, message: Message) {
        self.inbox.push(message);
    }

    fn is_idle(&self) -> bool {
        self.inbox.is_empty()
    }

    async fn run(&self) -> Result<(), EnvError> {
        let pending = self.inbox.drain();
        let Some(next_hop) = &self.next_hop else {
            debug!(role = %self.name, consumed = pending.len(), "Relay end of line");
            return Ok(());
        };
        let env = self
            .env
            .lock()
            .clone()
            .ok_or_else(|| EnvError::role_failed(&self.name, "not attached to an environment"))?;
        for message in pending {
            env.publish(
                Message::new(format!("{} -> {}", message.content, self.name))
                    .from_sender(self.name.clone())
                    .to(MessageTarget::to(next_hop.clone())),
            );
        }
        Ok(())
    }

    fn set_env(&self, env: EnvHandle) {
        *self.env.lock() = Some(env);
    }
}

/// Add a relay chain `names[0] -> names[1] -> ... -> names[n-1]` to `env`
pub fn add_relay_chain(env: &Environment, names: &[&str]) {
    let roles: Vec<Arc<dyn Role>> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let next_hop = names.get(i + 1).map(|n| n.to_string());
            Relay::new(*name, next_hop) as Arc<dyn Role>
        })
        .collect();
    env.add_roles(roles);
}
