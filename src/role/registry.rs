//! Role registry: the roles hosted by one environment.

use super::Role;
use std::collections::HashMap;
use std::sync::Arc;

/// Insertion-ordered name → role map
///
/// Re-registering a name replaces the role in place, keeping its position.
#[derive(Default)]
pub struct RoleRegistry {
    order: Vec<String>,
    roles: HashMap<String, Arc<dyn Role>>,
}

impl RoleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a role under its name
    pub fn register(&mut self, role: Arc<dyn Role>) {
        let name = role.name().to_string();
        if self.roles.insert(name.clone(), role).is_none() {
            self.order.push(name);
        }
    }

    /// Get a role by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Role>> {
        self.roles.get(name).cloned()
    }

    /// All roles in registration order
    pub fn list_all(&self) -> Vec<Arc<dyn Role>> {
        self.order
            .iter()
            .filter_map(|name| self.roles.get(name).cloned())
            .collect()
    }

    /// Role names in registration order
    pub fn role_names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Remove a role; returns it if it was registered
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Role>> {
        let removed = self.roles.remove(name);
        if removed.is_some() {
            self.order.retain(|n| n != name);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// True iff every registered role is idle
    pub fn all_idle(&self) -> bool {
        self.roles.values().all(|role| role.is_idle())
    }
}
