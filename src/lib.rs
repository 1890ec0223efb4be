//! Rolebus: Address-Routed Messaging for Cooperating Roles
//!
//! Roles publish addressed messages into a shared environment, which fans
//! them out to every subscribed role and drives bounded rounds of concurrent
//! execution. Environments expose named read and write capabilities that can
//! be discovered and invoked by name or by a structured call descriptor.

pub mod bus;
pub mod capability;
pub mod cli;
pub mod config;
pub mod demo;
pub mod env;
pub mod error;
pub mod logging;
pub mod message;
pub mod role;
pub mod sink;
pub mod types;

pub use bus::{EnvHandle, MessageBus, SenderResolver};
pub use capability::{ApiCall, CallArgs, CapabilityKind, CapabilityRegistry, CapabilitySchema};
pub use config::{ConfigLoader, RolebusConfig};
pub use env::{Environment, ExtEnv, RoundPhase, RoundScheduler, StepOutcome, WriteRequest};
pub use error::{EnvError, SinkError};
pub use message::{is_send_to, Message, MessageTarget};
pub use role::{Inbox, Role, RoleRegistry};
pub use sink::{FanoutSink, JsonFileSink, MemorySink, MessageSink, NullSink, SinkEvent};
pub use types::{Address, AddressSet, Kwargs, Observation};
