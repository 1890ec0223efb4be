//! Messages
//!
//! Immutable value objects published into an environment. Routing information
//! only names the recipients; how a message reaches them is the bus's concern.

use crate::types::{Address, AddressSet};
use serde::{Deserialize, Serialize};

/// Who a message is addressed to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "addresses", rename_all = "snake_case")]
pub enum MessageTarget {
    /// Every role, whatever its address set
    #[default]
    Broadcast,
    /// Roles whose address sets intersect this set
    Addresses(AddressSet),
}

impl MessageTarget {
    /// Target a single address
    pub fn to(address: impl Into<Address>) -> Self {
        let mut set = AddressSet::new();
        set.insert(address.into());
        MessageTarget::Addresses(set)
    }

    /// Target any of the given addresses
    pub fn any<I, A>(addresses: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Address>,
    {
        MessageTarget::Addresses(addresses.into_iter().map(Into::into).collect())
    }
}

/// A published message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message body
    pub content: String,
    /// Origin identity; free-form and possibly empty
    #[serde(default)]
    pub sent_from: String,
    /// Recipients
    #[serde(default)]
    pub send_to: MessageTarget,
}

impl Message {
    /// Create a broadcast message with no known sender
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sent_from: String::new(),
            send_to: MessageTarget::Broadcast,
        }
    }

    /// Set the sender
    pub fn from_sender(mut self, sent_from: impl Into<String>) -> Self {
        self.sent_from = sent_from.into();
        self
    }

    /// Set the target
    pub fn to(mut self, send_to: MessageTarget) -> Self {
        self.send_to = send_to;
        self
    }

    /// JSON rendering used in diagnostics
    pub fn dump(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

/// Routing predicate: does `message` reach a role listening on `addresses`?
///
/// Broadcast matches before the address set is looked at, so it reaches roles
/// with no addresses too. Total and pure.
pub fn is_send_to(message: &Message, addresses: &AddressSet) -> bool {
    match &message.send_to {
        MessageTarget::Broadcast => true,
        MessageTarget::Addresses(targets) => !targets.is_disjoint(addresses),
    }
}
