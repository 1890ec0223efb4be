//! FIFO message buffer for role implementations.

use crate::message::Message;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Pending messages in delivery order
#[derive(Debug, Default)]
pub struct Inbox {
    queue: Mutex<VecDeque<Message>>,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, message: Message) {
        self.queue.lock().push_back(message);
    }

    pub fn pop(&self) -> Option<Message> {
        self.queue.lock().pop_front()
    }

    /// Take every pending message, oldest first
    pub fn drain(&self) -> Vec<Message> {
        self.queue.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}
