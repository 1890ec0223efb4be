//! Dedicated writer thread for a message sink.
//!
//! The bus queues events and returns; the writer thread calls the sink in
//! queue order. Sink errors and panics stay on the writer thread.

use super::{MessageSink, SinkEvent};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::debug;

enum SinkCommand {
    Notify(SinkEvent),
    Flush(Sender<()>),
    Shutdown,
}

/// Owns the writer thread and the queue feeding it
pub struct SinkWriter {
    tx: Mutex<Sender<SinkCommand>>,
    handle: Option<JoinHandle<()>>,
}

impl SinkWriter {
    pub fn spawn(sink: Arc<dyn MessageSink>) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel::<SinkCommand>();
        let handle = thread::Builder::new()
            .name("rolebus-sink".into())
            .spawn(move || process_commands(sink.as_ref(), rx))?;
        Ok(Self {
            tx: Mutex::new(tx),
            handle: Some(handle),
        })
    }

    /// Queue an event. Never waits on the sink.
    pub fn submit(&self, event: SinkEvent) {
        if self.tx.lock().send(SinkCommand::Notify(event)).is_err() {
            debug!("Message log writer stopped; event dropped");
        }
    }

    /// Block until every event queued so far has been handed to the sink
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = mpsc::channel();
        if self.tx.lock().send(SinkCommand::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }
}

impl Drop for SinkWriter {
    fn drop(&mut self) {
        let _ = self.tx.lock().send(SinkCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn process_commands(sink: &dyn MessageSink, rx: Receiver<SinkCommand>) {
    for command in rx {
        match command {
            SinkCommand::Notify(event) => deliver(sink, &event),
            SinkCommand::Flush(ack) => {
                let _ = ack.send(());
            }
            SinkCommand::Shutdown => break,
        }
    }
}

fn deliver(sink: &dyn MessageSink, event: &SinkEvent) {
    match panic::catch_unwind(AssertUnwindSafe(|| sink.notify(event))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(event = event.kind(), error = %e, "Message log sink failed"),
        Err(_) => debug!(event = event.kind(), "Message log sink panicked"),
    }
}
