//! Address table: which addresses each role listens on.

use crate::message::{is_send_to, Message};
use crate::role::Role;
use crate::types::AddressSet;
use std::sync::Arc;

/// One role's subscription
#[derive(Clone)]
pub struct AddressEntry {
    pub role: Arc<dyn Role>,
    pub addresses: AddressSet,
}

/// Role → address set, in the order roles were first seen
///
/// The single source of truth for routing.
#[derive(Default, Clone)]
pub struct AddressTable {
    entries: Vec<AddressEntry>,
}

impl AddressTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the role's address set, adding an entry if the role is new
    pub fn set_addresses(&mut self, role: Arc<dyn Role>, addresses: AddressSet) {
        match self.position(role.name()) {
            Some(idx) => {
                self.entries[idx] = AddressEntry { role, addresses };
            }
            None => self.entries.push(AddressEntry { role, addresses }),
        }
    }

    /// Current address set, or empty if the role is unknown
    pub fn get_addresses(&self, role_name: &str) -> AddressSet {
        self.position(role_name)
            .map(|idx| self.entries[idx].addresses.clone())
            .unwrap_or_default()
    }

    /// Roles whose addresses match the message, in table order
    pub fn recipients(&self, message: &Message) -> Vec<Arc<dyn Role>> {
        self.entries
            .iter()
            .filter(|e| is_send_to(message, &e.addresses))
            .map(|e| Arc::clone(&e.role))
            .collect()
    }

    /// Every role in the table
    pub fn roles(&self) -> Vec<Arc<dyn Role>> {
        self.entries.iter().map(|e| Arc::clone(&e.role)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AddressEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, role_name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.role.name() == role_name)
    }
}
