//! Sender Resolver
//!
//! Best-effort reconstruction of `Name(Type)` labels for a message's sender and
//! recipients. Observability only: nothing here feeds back into delivery.
//!
//! Resolution walks an ordered chain of strategies and stops at the first hit:
//!
//! 1. [`ByName`]: `sent_from` equals a role name
//! 2. [`ByCanonicalId`]: `sent_from` equals a role's fully qualified type path
//! 3. [`ByTypeSuffix`]: the last segment of a qualified `sent_from` names
//!    exactly one role's type
//!
//! With no hit the raw string is kept (`Unknown(<Type>)` for qualified
//! strings, `Unknown` when empty).

use super::address::AddressTable;
use crate::message::Message;
use crate::role::{role_label, Role};
use std::sync::Arc;

/// Label used when a message carries no sender
pub const UNKNOWN_SENDER: &str = "Unknown";

/// One step of the resolution chain. Implementations must be pure.
pub trait SenderStrategy: Send + Sync {
    /// Strategy name for diagnostics
    fn name(&self) -> &'static str;

    /// Find the role `sent_from` refers to, if this strategy recognizes it
    fn find(&self, sent_from: &str, roles: &[Arc<dyn Role>]) -> Option<Arc<dyn Role>>;
}

/// Exact role-name match
pub struct ByName;

impl SenderStrategy for ByName {
    fn name(&self) -> &'static str {
        "name"
    }

    fn find(&self, sent_from: &str, roles: &[Arc<dyn Role>]) -> Option<Arc<dyn Role>> {
        roles.iter().find(|r| r.name() == sent_from).cloned()
    }
}

/// Match against the role's canonical type path
pub struct ByCanonicalId;

impl SenderStrategy for ByCanonicalId {
    fn name(&self) -> &'static str {
        "canonical_id"
    }

    fn find(&self, sent_from: &str, roles: &[Arc<dyn Role>]) -> Option<Arc<dyn Role>> {
        roles.iter().find(|r| r.canonical_id() == sent_from).cloned()
    }
}

/// Match the last segment of a qualified name against role type names.
/// Ambiguous matches resolve to nothing.
pub struct ByTypeSuffix;

impl SenderStrategy for ByTypeSuffix {
    fn name(&self) -> &'static str {
        "type_suffix"
    }

    fn find(&self, sent_from: &str, roles: &[Arc<dyn Role>]) -> Option<Arc<dyn Role>> {
        let type_name = last_segment(sent_from)?;
        let mut matches = roles.iter().filter(|r| r.type_name() == type_name);
        let first = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(Arc::clone(first))
    }
}

/// Last segment of a `.` or `::` qualified name; `None` if unqualified.
pub fn last_segment(qualified: &str) -> Option<&str> {
    if !qualified.contains('.') && !qualified.contains("::") {
        return None;
    }
    let tail = qualified.rsplit("::").next().unwrap_or(qualified);
    tail.rsplit('.').next().filter(|s| !s.is_empty())
}

/// Ordered chain of sender strategies
pub struct SenderResolver {
    strategies: Vec<Box<dyn SenderStrategy>>,
}

impl Default for SenderResolver {
    fn default() -> Self {
        Self::new(vec![
            Box::new(ByName),
            Box::new(ByCanonicalId),
            Box::new(ByTypeSuffix),
        ])
    }
}

impl SenderResolver {
    /// Build a resolver from an explicit strategy chain
    pub fn new(strategies: Vec<Box<dyn SenderStrategy>>) -> Self {
        Self { strategies }
    }

    /// Find the sending role, if any strategy recognizes `sent_from`
    pub fn find_sender(&self, sent_from: &str, roles: &[Arc<dyn Role>]) -> Option<Arc<dyn Role>> {
        if sent_from.is_empty() {
            return None;
        }
        self.strategies
            .iter()
            .find_map(|strategy| strategy.find(sent_from, roles))
    }

    /// `Name(Type)` for the sender, or the best fallback string
    pub fn format_sender(&self, message: &Message, roles: &[Arc<dyn Role>]) -> String {
        if message.sent_from.is_empty() {
            return UNKNOWN_SENDER.to_string();
        }
        if let Some(role) = self.find_sender(&message.sent_from, roles) {
            return role_label(role.as_ref());
        }
        match last_segment(&message.sent_from) {
            Some(type_name) => format!("{}({})", UNKNOWN_SENDER, type_name),
            None => message.sent_from.clone(),
        }
    }

    /// `Name(Type)` for every role the message routes to
    pub fn format_recipients(&self, message: &Message, table: &AddressTable) -> Vec<String> {
        table
            .recipients(message)
            .iter()
            .map(|role| role_label(role.as_ref()))
            .collect()
    }
}
