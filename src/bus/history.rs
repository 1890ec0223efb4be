//! Debug history of published messages. Inspection only; never used for routing.

use crate::message::Message;
use parking_lot::Mutex;

/// Append-only record of published messages
#[derive(Debug, Default)]
pub struct History {
    messages: Mutex<Vec<Message>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, message: Message) {
        self.messages.lock().push(message);
    }

    /// Snapshot in publish order
    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().clone()
    }

    /// Messages whose `sent_from` equals `sender`
    pub fn by_sender(&self, sender: &str) -> Vec<Message> {
        self.messages
            .lock()
            .iter()
            .filter(|m| m.sent_from == sender)
            .cloned()
            .collect()
    }

    pub fn last(&self) -> Option<Message> {
        self.messages.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}
