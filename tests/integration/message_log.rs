use crate::support::Coder;
use rolebus::config::{ConfigLoader, MessageLogConfig};
use rolebus::{
    Environment, ExtEnv, JsonFileSink, Message, MessageSink, MessageTarget, Role, RolebusConfig,
    SinkError, SinkEvent,
};
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_published_messages_are_logged_with_labels() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("logs").join("messages.json");
    let sink = Arc::new(JsonFileSink::open(&path).unwrap());

    let env = Environment::with_sink("office", sink.clone());
    env.add_roles([Coder::new("Alice") as Arc<dyn Role>, Coder::new("Bob")]);
    env.publish_message(
        Message::new("please review")
            .from_sender("Alice")
            .to(MessageTarget::to("Bob")),
    )
    .unwrap();
    env.publish_message(Message::new("lost").to(MessageTarget::to("Nobody")))
        .unwrap();
    env.flush_log();

    let entries = sink.read_entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["event"], "message");
    assert_eq!(entries[0]["message"]["sender"], "Alice(Coder)");
    assert_eq!(entries[0]["message"]["recipients"][0], "Bob(Coder)");
    assert_eq!(entries[0]["message"]["content"], "please review");
    assert!(entries[0]["timestamp"].as_str().unwrap().ends_with('Z'));
    assert_eq!(entries[1]["message"]["sender"], "Unknown");
    assert_eq!(entries[1]["message"]["recipients"].as_array().unwrap().len(), 0);
}

#[test]
fn test_environment_from_config_opens_message_log() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("rolebus.json");
    let config = RolebusConfig {
        desc: "configured".to_string(),
        message_log: MessageLogConfig {
            enabled: true,
            file: Some(path.clone()),
        },
        ..ConfigLoader::default()
    };

    let env = Environment::from_config(&config).unwrap();
    assert_eq!(env.desc(), "configured");
    env.add_role(Coder::new("Alice"));
    env.publish_message(Message::new("hello")).unwrap();
    env.flush_log();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written.as_array().unwrap().len(), 1);
}

#[test]
fn test_corrupt_log_file_restarts_array() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("corrupt.json");
    std::fs::write(&path, "{not json").unwrap();

    let sink = Arc::new(JsonFileSink::open(&path).unwrap());
    let env = Environment::with_sink("office", sink.clone());
    env.add_role(Coder::new("Alice"));
    env.publish_message(Message::new("fresh")).unwrap();
    env.flush_log();

    let entries = sink.read_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["message"]["content"], "fresh");
}

#[test]
fn test_api_request_entries() {
    let temp = TempDir::new().unwrap();
    let sink = Arc::new(JsonFileSink::open(temp.path().join("api.json")).unwrap());
    let env = Environment::with_sink("office", sink.clone());

    env.log_api_request(
        "gpt-4o",
        vec![serde_json::json!({"role": "user", "content": "hi"})],
        "hello",
        true,
    );
    env.flush_log();

    let entries = sink.read_entries().unwrap();
    assert_eq!(entries[0]["event"], "api_request");
    assert_eq!(entries[0]["model"], "gpt-4o");
    assert_eq!(entries[0]["response"]["content"], "hello");
    assert_eq!(entries[0]["stream"], true);
}

#[test]
fn test_publish_returns_before_file_is_written() {
    struct Gate {
        open: std::sync::Mutex<bool>,
        cond: std::sync::Condvar,
        inner: JsonFileSink,
    }

    impl MessageSink for Gate {
        fn notify(&self, event: &SinkEvent) -> Result<(), SinkError> {
            let mut open = self.open.lock().unwrap();
            while !*open {
                open = self.cond.wait(open).unwrap();
            }
            self.inner.notify(event)
        }
    }

    let temp = TempDir::new().unwrap();
    let gate = Arc::new(Gate {
        open: std::sync::Mutex::new(false),
        cond: std::sync::Condvar::new(),
        inner: JsonFileSink::open(temp.path().join("gated.json")).unwrap(),
    });
    let env = Environment::with_sink("office", gate.clone());
    let alice = Coder::new("Alice");
    env.add_role(alice.clone());

    // the sink is blocked, yet delivery and history complete
    assert!(env.publish_message(Message::new("queued")).unwrap());
    assert_eq!(alice.contents(), vec!["queued"]);
    assert_eq!(env.history().len(), 1);
    assert!(gate.inner.read_entries().unwrap().is_empty());

    *gate.open.lock().unwrap() = true;
    gate.cond.notify_all();
    env.flush_log();
    assert_eq!(gate.inner.read_entries().unwrap().len(), 1);
}
