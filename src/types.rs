//! Core types shared across the bus, registry, and environment.

use std::collections::BTreeSet;

/// Address: opaque subscription token (a role name, type name, or topic)
pub type Address = String;

/// AddressSet: the set of addresses a role listens on
pub type AddressSet = BTreeSet<Address>;

/// Observation or info payload returned by environment lifecycle calls
pub type Observation = serde_json::Value;

/// Keyword arguments for capability calls
pub type Kwargs = serde_json::Map<String, serde_json::Value>;
