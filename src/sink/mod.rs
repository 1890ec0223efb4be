//! Message Log Sinks
//!
//! External collaborators the bus notifies after routing a message. Sinks are
//! fire-and-forget: the bus hands events to a [`SinkWriter`] thread, which
//! swallows every [`SinkError`] and panic and records it only as a local
//! diagnostic.

mod json_file;
mod writer;

pub use json_file::{JsonFileSink, SinkStatus};
pub use writer::SinkWriter;

use crate::error::SinkError;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;

/// Event delivered to a sink
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    /// A routed agent message
    Message {
        sender: String,
        recipients: Vec<String>,
        content: String,
    },
    /// An LLM request/response pair reported by an outer layer
    ApiRequest {
        model: String,
        request: Vec<Value>,
        response: String,
        stream: bool,
    },
}

impl SinkEvent {
    /// Event tag as written to the log
    pub fn kind(&self) -> &'static str {
        match self {
            SinkEvent::Message { .. } => "message",
            SinkEvent::ApiRequest { .. } => "api_request",
        }
    }

    /// Log entry stamped with `at`
    pub fn to_entry(&self, at: DateTime<Utc>) -> Value {
        let timestamp = at.to_rfc3339_opts(SecondsFormat::Micros, true);
        match self {
            SinkEvent::Message {
                sender,
                recipients,
                content,
            } => json!({
                "timestamp": timestamp,
                "event": self.kind(),
                "message": {
                    "sender": sender,
                    "recipients": recipients,
                    "content": content,
                }
            }),
            SinkEvent::ApiRequest {
                model,
                request,
                response,
                stream,
            } => json!({
                "timestamp": timestamp,
                "event": self.kind(),
                "model": model,
                "stream": stream,
                "request": request,
                "response": {
                    "role": "assistant",
                    "content": response,
                }
            }),
        }
    }
}

/// One-way notification target for routed messages
pub trait MessageSink: Send + Sync {
    fn notify(&self, event: &SinkEvent) -> Result<(), SinkError>;
}

/// Sink that discards every event
#[derive(Debug, Default)]
pub struct NullSink;

impl MessageSink for NullSink {
    fn notify(&self, _event: &SinkEvent) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Sink that keeps events in memory, stamped when notified
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<(DateTime<Utc>, SinkEvent)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events
            .lock()
            .iter()
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// Events rendered as log entries with their notification timestamps
    pub fn entries(&self) -> Vec<Value> {
        self.events
            .lock()
            .iter()
            .map(|(at, event)| event.to_entry(*at))
            .collect()
    }
}

impl MessageSink for MemorySink {
    fn notify(&self, event: &SinkEvent) -> Result<(), SinkError> {
        self.events.lock().push((Utc::now(), event.clone()));
        Ok(())
    }
}

/// Forwards each event to several sinks
///
/// Every sink is notified even if an earlier one fails; the first error is
/// returned.
pub struct FanoutSink {
    sinks: Vec<Arc<dyn MessageSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn MessageSink>>) -> Self {
        Self { sinks }
    }
}

impl MessageSink for FanoutSink {
    fn notify(&self, event: &SinkEvent) -> Result<(), SinkError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.notify(event) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
