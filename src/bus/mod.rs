//! Message Bus
//!
//! Routes published messages to every role whose address set matches the
//! message target, records them in the debug history, and notifies the
//! optional log sink.
//!
//! Publishes are serialized: each recipient observes messages in the order
//! `publish` was called, and the history has the same order.

mod address;
mod history;
mod resolver;

pub use address::{AddressEntry, AddressTable};
pub use history::History;
pub use resolver::{
    last_segment, ByCanonicalId, ByName, ByTypeSuffix, SenderResolver, SenderStrategy,
    UNKNOWN_SENDER,
};

use crate::message::Message;
use crate::role::Role;
use crate::sink::{MessageSink, SinkEvent, SinkWriter};
use crate::types::AddressSet;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, warn};

/// Publish/route engine shared by an environment and its roles
pub struct MessageBus {
    table: RwLock<AddressTable>,
    history: History,
    resolver: SenderResolver,
    sink: Option<SinkWriter>,
    publish_lock: Mutex<()>,
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBus {
    /// Bus with no log sink
    pub fn new() -> Self {
        Self {
            table: RwLock::new(AddressTable::new()),
            history: History::new(),
            resolver: SenderResolver::default(),
            sink: None,
            publish_lock: Mutex::new(()),
        }
    }

    /// Bus that reports each publish to `sink` from a background writer
    pub fn with_sink(sink: Arc<dyn MessageSink>) -> Self {
        let writer = match SinkWriter::spawn(sink) {
            Ok(writer) => Some(writer),
            Err(e) => {
                warn!(error = %e, "Message log writer failed to start; message log disabled");
                None
            }
        };
        Self {
            sink: writer,
            ..Self::new()
        }
    }

    /// Replace the sender resolution chain
    pub fn with_resolver(mut self, resolver: SenderResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replace a role's address set
    pub fn set_addresses(&self, role: Arc<dyn Role>, addresses: AddressSet) {
        debug!(role = %role.name(), addresses = ?addresses, "set_addresses");
        self.table.write().set_addresses(role, addresses);
    }

    /// A role's address set, empty if unknown
    pub fn get_addresses(&self, role_name: &str) -> AddressSet {
        self.table.read().get_addresses(role_name)
    }

    /// Deliver `message` to every matching role.
    ///
    /// Returns whether at least one role matched. The message is appended to
    /// the history either way. The log sink is only queued here; it never
    /// delays or aborts a publish.
    pub fn publish(&self, message: Message) -> bool {
        let _ordering = self.publish_lock.lock();
        debug!(message = %message.dump(), "publish_message");

        let table = self.table.read().clone();
        let recipients = table.recipients(&message);
        for role in &recipients {
            role.put_message(message.clone());
        }

        let found = !recipients.is_empty();
        if !found {
            warn!(message = %message.dump(), "Message no recipients");
        }

        let event = self
            .sink
            .is_some()
            .then(|| self.message_event(&message, &table));
        self.history.add(message);
        if let Some(event) = event {
            self.record(event);
        }
        found
    }

    /// Debug history of everything published
    pub fn history(&self) -> &History {
        &self.history
    }

    /// `Name(Type)` label for the message sender
    pub fn format_sender(&self, message: &Message) -> String {
        let table = self.table.read();
        self.resolver.format_sender(message, &table.roles())
    }

    /// `Name(Type)` labels for the roles the message routes to
    pub fn format_recipients(&self, message: &Message) -> Vec<String> {
        let table = self.table.read();
        self.resolver.format_recipients(message, &table)
    }

    /// Queue an event for the log sink, if any
    pub fn record(&self, event: SinkEvent) {
        if let Some(writer) = &self.sink {
            writer.submit(event);
        }
    }

    /// Wait until the log sink has seen every event recorded so far
    pub fn flush_sink(&self) {
        if let Some(writer) = &self.sink {
            writer.flush();
        }
    }

    fn message_event(&self, message: &Message, table: &AddressTable) -> SinkEvent {
        SinkEvent::Message {
            sender: self.resolver.format_sender(message, &table.roles()),
            recipients: self.resolver.format_recipients(message, table),
            content: message.content.clone(),
        }
    }
}

/// Handle given to roles so they can publish into their environment
#[derive(Clone)]
pub struct EnvHandle {
    bus: Arc<MessageBus>,
}

impl EnvHandle {
    pub fn new(bus: Arc<MessageBus>) -> Self {
        Self { bus }
    }

    /// Publish through the environment's bus
    pub fn publish(&self, message: Message) -> bool {
        self.bus.publish(message)
    }

    /// Addresses a role currently listens on
    pub fn get_addresses(&self, role_name: &str) -> AddressSet {
        self.bus.get_addresses(role_name)
    }

    pub fn bus(&self) -> &Arc<MessageBus> {
        &self.bus
    }
}
