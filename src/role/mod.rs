//! Roles
//!
//! Autonomous participants of an environment. A role owns an inbox, reports
//! whether it has pending work, and runs when the round scheduler asks it to.
//! Roles publish through the [`EnvHandle`] they receive when attached.

mod inbox;
mod registry;

pub use inbox::Inbox;
pub use registry::RoleRegistry;

use crate::bus::EnvHandle;
use crate::error::EnvError;
use crate::message::Message;
use crate::types::AddressSet;
use async_trait::async_trait;

/// A participant that receives messages and runs in rounds
#[async_trait]
pub trait Role: Send + Sync {
    /// Name, unique within an environment
    fn name(&self) -> &str;

    /// Concrete type name used in `Name(Type)` labels
    fn type_name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Fully qualified type path; senders sometimes stamp this instead of a name
    fn canonical_id(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }

    /// Addresses subscribed on attach
    fn addresses(&self) -> AddressSet {
        let mut addresses = AddressSet::new();
        addresses.insert(self.name().to_string());
        addresses.insert(self.canonical_id());
        addresses
    }

    /// Enqueue a delivered message. Called while the bus holds its publish
    /// lock, so implementations must not publish from here.
    fn put_message(&self, message: Message);

    /// True iff the role has no pending work
    fn is_idle(&self) -> bool;

    /// Process pending work
    async fn run(&self) -> Result<(), EnvError>;

    /// Called once the role is attached to an environment
    fn set_env(&self, _env: EnvHandle) {}
}

/// Last path segment of a Rust type path, ignoring generic arguments.
pub(crate) fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// `Name(Type)` label used in diagnostics and the message log
pub fn role_label(role: &dyn Role) -> String {
    format!("{}({})", role.name(), role.type_name())
}
