use crate::support::Coder;
use rolebus::config::SchedulerConfig;
use rolebus::{EnvError, Environment, ExtEnv, Message, MessageTarget, Role, RoundPhase};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;
use tokio::time::timeout;

fn send(env: &Environment, to: &str) {
    env.publish_message(Message::new("work").to(MessageTarget::to(to)))
        .unwrap();
}

#[tokio::test]
async fn test_round_dispatches_only_non_idle_roles_concurrently() {
    // Both busy roles must be inside `run` at once to pass the barrier.
    let barrier = Arc::new(Barrier::new(2));
    let a = Coder::builder("A").barrier(barrier.clone()).build();
    let b = Coder::new("B");
    let c = Coder::builder("C").barrier(barrier).build();

    let env = Environment::new("office");
    env.add_roles([a.clone() as Arc<dyn Role>, b.clone(), c.clone()]);
    send(&env, "A");
    send(&env, "C");

    timeout(Duration::from_secs(5), env.run(1))
        .await
        .expect("round deadlocked: roles were not run concurrently")
        .unwrap();

    assert_eq!((a.finished(), b.runs(), c.finished()), (1, 0, 1));
    assert!(env.is_idle());
    assert_eq!(env.scheduler().phase(), RoundPhase::Done);
}

#[tokio::test]
async fn test_failure_surfaces_after_every_dispatched_role_finishes() {
    let barrier = Arc::new(Barrier::new(2));
    let broken = Coder::builder("Broken")
        .barrier(barrier.clone())
        .failing("out of tokens")
        .build();
    let slow = Coder::builder("Slow")
        .barrier(barrier)
        .delay(Duration::from_millis(50))
        .build();

    let env = Environment::new("office");
    env.add_roles([broken.clone() as Arc<dyn Role>, slow.clone()]);
    send(&env, "Broken");
    send(&env, "Slow");

    let err = env.run(1).await.unwrap_err();
    match err {
        EnvError::RoleFailed { role, reason } => {
            assert_eq!(role, "Broken");
            assert_eq!(reason, "out of tokens");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(slow.finished(), 1);
    assert_eq!(broken.finished(), 1);
}

#[tokio::test]
async fn test_first_failure_in_dispatch_order_wins() {
    let first = Coder::builder("First")
        .delay(Duration::from_millis(30))
        .failing("slow failure")
        .build();
    let second = Coder::builder("Second").failing("fast failure").build();

    let env = Environment::new("office");
    env.add_roles([first as Arc<dyn Role>, second]);
    send(&env, "First");
    send(&env, "Second");

    let err = env.run(1).await.unwrap_err();
    assert!(matches!(err, EnvError::RoleFailed { ref role, .. } if role == "First"));
}

#[tokio::test]
async fn test_idle_rounds_still_count() {
    let env = Environment::new("office");
    env.add_role(Coder::new("A"));
    env.run(4).await.unwrap();
    assert_eq!(env.scheduler().rounds_completed(), 4);
}

#[tokio::test]
async fn test_is_idle_is_idempotent() {
    let env = Environment::new("office");
    let a = Coder::new("A");
    env.add_role(a.clone());
    assert!(env.is_idle());
    assert!(env.is_idle());

    send(&env, "A");
    assert!(!env.is_idle());
    assert!(!env.is_idle());
    assert_eq!(a.runs(), 0);
}

#[tokio::test]
async fn test_run_configured_honours_stop_when_idle() {
    let a = Coder::new("A");
    let env = Environment::new("office").with_scheduler_config(SchedulerConfig {
        rounds: 5,
        stop_when_idle: true,
    });
    env.add_role(a.clone());
    send(&env, "A");
    assert_eq!(env.run_configured().await.unwrap(), 1);

    let b = Coder::new("B");
    let env = Environment::new("office").with_scheduler_config(SchedulerConfig {
        rounds: 3,
        stop_when_idle: false,
    });
    env.add_role(b);
    assert_eq!(env.run_configured().await.unwrap(), 3);
    assert_eq!(env.scheduler().rounds_completed(), 3);
}

#[tokio::test]
async fn test_roles_publish_from_run_via_handle() {
    let a = Coder::new("A");
    let b = Coder::new("B");
    let env = Environment::new("office");
    env.add_roles([a.clone() as Arc<dyn Role>, b.clone()]);

    let handle = a.env().expect("attached role has a handle");
    assert!(handle.publish(Message::new("hand-off").from_sender("A").to(MessageTarget::to("B"))));
    env.run(1).await.unwrap();
    assert_eq!(b.contents(), vec!["hand-off"]);
    assert_eq!(b.runs(), 1);
}
