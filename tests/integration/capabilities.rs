use crate::support::Coder;
use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::Mutex;
use rolebus::capability::CapabilityKind;
use rolebus::{
    ApiCall, CapabilityRegistry, CapabilitySchema, EnvError, Environment, ExtEnv, Kwargs, Message,
    MessageTarget, Observation, StepOutcome,
};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Environment with its own doors plus a hosted role environment for messaging
struct Building {
    open: Mutex<BTreeSet<String>>,
    office: Environment,
}

impl Building {
    fn new() -> Self {
        Self {
            open: Mutex::new(BTreeSet::new()),
            office: Environment::new("building"),
        }
    }

    async fn ring(&self, door: String) -> Result<Value, EnvError> {
        tokio::task::yield_now().await;
        Ok(json!(format!("ring at {}", door)))
    }
}

static BUILDING_CAPABILITIES: OnceLock<CapabilityRegistry<Building>> = OnceLock::new();

fn register_building(registry: &mut CapabilityRegistry<Building>) -> Result<(), EnvError> {
    registry
        .write(
            CapabilitySchema::new("open_door")
                .describe("Open a door")
                .param("door", "str"),
            |b: &Building, args| {
                let door: String = args.get("door")?;
                b.open.lock().insert(door.clone());
                Ok(json!(door))
            },
        )?
        .read(CapabilitySchema::new("open_doors"), |b: &Building, _| {
            Ok(json!(*b.open.lock()))
        })?
        .register_async(
            CapabilityKind::Write,
            CapabilitySchema::new("ring").param("door", "str"),
            |b, args| {
                async move {
                    let door: String = args.get("door")?;
                    b.ring(door).await
                }
                .boxed()
            },
        )?;
    Ok(())
}

#[async_trait]
impl ExtEnv for Building {
    type Action = ApiCall;

    fn capabilities() -> Result<&'static CapabilityRegistry<Self>, EnvError> {
        CapabilityRegistry::get_or_build(&BUILDING_CAPABILITIES, register_building)
    }

    async fn reset(
        &self,
        _seed: Option<u64>,
        _options: Option<Kwargs>,
    ) -> Result<(Observation, Kwargs), EnvError> {
        self.open.lock().clear();
        Ok((self.observe(None).await?, Kwargs::new()))
    }

    async fn observe(&self, _params: Option<Kwargs>) -> Result<Observation, EnvError> {
        let open = self.open.lock().clone();
        Ok(json!({ "open": open }))
    }

    async fn step(&self, action: ApiCall) -> Result<StepOutcome, EnvError> {
        let result = self.write_thru_api(action).await?;
        let mut info = Kwargs::new();
        info.insert("result".to_string(), result);
        Ok(StepOutcome {
            observation: self.observe(None).await?,
            reward: 1.0,
            terminated: false,
            truncated: false,
            info,
        })
    }

    fn publish_message(&self, message: Message) -> Result<bool, EnvError> {
        self.office.publish_message(message)
    }
}

#[test]
fn test_duplicate_write_registration_is_rejected() {
    let mut registry = CapabilityRegistry::<Building>::new();
    register_building(&mut registry).unwrap();
    let err = registry
        .write(CapabilitySchema::new("open_door"), |_: &Building, _| {
            Ok(Value::Null)
        })
        .err()
        .unwrap();
    assert!(matches!(
        err,
        EnvError::DuplicateCapability { kind: CapabilityKind::Write, ref name } if name == "open_door"
    ));
}

#[tokio::test]
async fn test_write_only_capability_is_unknown_as_read() {
    let building = Building::new();
    let err = building
        .read_from_api(ApiCall::new("open_door").arg(json!("front")))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EnvError::UnknownCapability { kind: CapabilityKind::Read, ref name } if name == "open_door"
    ));
    assert!(building.open.lock().is_empty());
}

#[tokio::test]
async fn test_sync_and_async_capabilities_invoke_uniformly() {
    let building = Building::new();

    let opened = building
        .write_thru_api(ApiCall::new("open_door").kwarg("door", json!("front")))
        .await
        .unwrap();
    assert_eq!(opened, json!("front"));

    let rang = building
        .write_thru_api(ApiCall::new("ring").arg(json!("back")))
        .await
        .unwrap();
    assert_eq!(rang, json!("ring at back"));

    assert_eq!(
        building.read_from_api("open_doors").await.unwrap(),
        json!(["front"])
    );
}

#[tokio::test]
async fn test_registry_is_shared_across_instances() {
    let first = Building::new();
    let second = Building::new();
    first
        .write_thru_api(ApiCall::new("open_door").arg(json!("front")))
        .await
        .unwrap();

    assert_eq!(
        second.read_from_api("open_doors").await.unwrap(),
        json!([])
    );
    assert!(std::ptr::eq(
        Building::capabilities().unwrap(),
        Building::capabilities().unwrap()
    ));
}

#[test]
fn test_discovery_in_registration_order() {
    let building = Building::new();
    let writes = building
        .get_all_available_apis(CapabilityKind::Write)
        .unwrap();
    let names: Vec<&str> = writes.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["open_door", "ring"]);
    assert_eq!(writes[0].description.as_deref(), Some("Open a door"));
}

#[tokio::test]
async fn test_handler_error_propagates_unchanged() {
    let building = Building::new();
    let err = building
        .write_thru_api(ApiCall::new("open_door"))
        .await
        .unwrap_err();
    assert!(matches!(err, EnvError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_message_write_routes_through_hosted_environment() {
    let building = Building::new();
    let alice = Coder::new("Alice");
    building.office.add_role(alice.clone());

    let delivered = building
        .write_thru_api(Message::new("door is open").to(MessageTarget::to("Alice")))
        .await
        .unwrap();
    assert_eq!(delivered, json!(true));
    assert_eq!(alice.contents(), vec!["door is open"]);
}

#[tokio::test]
async fn test_step_and_reset() {
    let building = Building::new();
    let outcome = building
        .step(ApiCall::new("open_door").arg(json!("side")))
        .await
        .unwrap();
    assert_eq!(outcome.observation, json!({"open": ["side"]}));
    assert_eq!(outcome.info["result"], json!("side"));

    let (observation, _) = building.reset(None, None).await.unwrap();
    assert_eq!(observation, json!({"open": []}));
}
