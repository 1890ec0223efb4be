use crate::support::{set, Coder, Reviewer};
use rolebus::{AddressSet, Environment, ExtEnv, Message, MessageTarget, Role};
use std::sync::Arc;

fn office() -> (Environment, Arc<Coder>, Arc<Coder>) {
    let env = Environment::new("office");
    let alice = Coder::new("Alice");
    let bob = Coder::new("Bob");
    env.add_roles([alice.clone() as Arc<dyn Role>, bob.clone()]);
    (env, alice, bob)
}

#[test]
fn test_targeted_delivery_exactly_once_in_order() {
    let (env, alice, bob) = office();

    env.publish_message(Message::new("first").to(MessageTarget::to("Alice")))
        .unwrap();
    env.publish_message(Message::new("second").to(MessageTarget::any(["Alice", "Bob"])))
        .unwrap();

    assert_eq!(alice.contents(), vec!["first", "second"]);
    assert_eq!(bob.contents(), vec!["second"]);
}

#[test]
fn test_default_subscriptions_cover_name_and_type_path() {
    let (env, alice, _) = office();
    let addresses = env.get_addresses("Alice");
    assert!(addresses.contains("Alice"));
    assert!(addresses.contains(&alice.canonical_id()));

    env.publish_message(Message::new("by type").to(MessageTarget::to(alice.canonical_id())))
        .unwrap();
    assert_eq!(alice.contents(), vec!["by type"]);
}

#[test]
fn test_broadcast_reaches_roles_without_addresses() {
    let (env, alice, bob) = office();
    let mute = Coder::new("Mute");
    env.add_role(mute.clone());
    env.set_addresses("Mute", AddressSet::new()).unwrap();

    assert!(env.publish_message(Message::new("all hands")).unwrap());
    assert_eq!(alice.contents(), vec!["all hands"]);
    assert_eq!(bob.contents(), vec!["all hands"]);
    assert_eq!(mute.contents(), vec!["all hands"]);
}

#[test]
fn test_zero_recipients_returns_false_and_records_once() {
    let (env, alice, bob) = office();

    let found = env
        .publish_message(Message::new("void").to(MessageTarget::to("Nobody")))
        .unwrap();
    assert!(!found);
    assert_eq!(env.history().len(), 1);
    assert_eq!(env.history().messages()[0].content, "void");
    assert!(alice.contents().is_empty());
    assert!(bob.contents().is_empty());
}

#[test]
fn test_shared_topic_address() {
    let (env, alice, bob) = office();
    env.set_addresses("Alice", set(&["Alice", "dev"])).unwrap();
    env.set_addresses("Bob", set(&["Bob", "dev"])).unwrap();

    env.publish_message(Message::new("standup").to(MessageTarget::to("dev")))
        .unwrap();
    assert_eq!(alice.contents(), vec!["standup"]);
    assert_eq!(bob.contents(), vec!["standup"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_publishers_preserve_history_order_per_recipient() {
    let (env, alice, _) = office();
    let handle = env.handle();

    let mut tasks = Vec::new();
    for sender in 0..4 {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            for i in 0..25 {
                handle.publish(
                    Message::new(format!("{}-{}", sender, i))
                        .from_sender(format!("sender{}", sender))
                        .to(MessageTarget::to("Alice")),
                );
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let history: Vec<String> = env
        .history()
        .messages()
        .into_iter()
        .map(|m| m.content)
        .collect();
    assert_eq!(history.len(), 100);
    assert_eq!(alice.contents(), history);
}

#[test]
fn test_sender_labels() {
    let (env, _, _) = office();
    env.add_role(Reviewer::new("Rita"));
    let bus = env.bus();

    assert_eq!(
        bus.format_sender(&Message::new("x").from_sender("Alice")),
        "Alice(Coder)"
    );
    assert_eq!(
        bus.format_sender(&Message::new("x").from_sender("app.roles.Reviewer")),
        "Rita(Reviewer)"
    );
    // two Coders: the type suffix is ambiguous
    assert_eq!(
        bus.format_sender(&Message::new("x").from_sender("app.roles.Coder")),
        "Unknown(Coder)"
    );
    assert_eq!(bus.format_sender(&Message::new("x")), "Unknown");
    assert_eq!(
        bus.format_sender(&Message::new("x").from_sender("Stranger")),
        "Stranger"
    );
}

#[test]
fn test_type_suffix_resolves_single_match() {
    let env = Environment::new("solo");
    env.add_role(Coder::new("Alice"));
    assert_eq!(
        env.bus()
            .format_sender(&Message::new("x").from_sender("app.roles.Coder")),
        "Alice(Coder)"
    );
}

#[test]
fn test_recipient_labels_follow_routing() {
    let (env, _, _) = office();
    env.add_role(Reviewer::new("Rita"));
    let message = Message::new("x").to(MessageTarget::any(["Bob", "Rita"]));
    assert_eq!(
        env.bus().format_recipients(&message),
        vec!["Bob(Coder)", "Rita(Reviewer)"]
    );
}
