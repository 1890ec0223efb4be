//! Capability registry: per-environment-type tables of read and write operations.

use super::call::{ApiCall, CallArgs};
use super::{CapabilityKind, CapabilitySchema, ParamSpec};
use crate::error::EnvError;
use crate::types::Kwargs;
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Synchronous handler bound to a receiver of type `E`
pub type SyncHandler<E> = Arc<dyn Fn(&E, CallArgs) -> Result<Value, EnvError> + Send + Sync>;

/// Asynchronous handler bound to a receiver of type `E`
pub type AsyncHandler<E> =
    Arc<dyn for<'a> Fn(&'a E, CallArgs) -> BoxFuture<'a, Result<Value, EnvError>> + Send + Sync>;

enum Callable<E> {
    Sync(SyncHandler<E>),
    Async(AsyncHandler<E>),
}

/// A registered capability
pub struct CapabilityEntry<E> {
    kind: CapabilityKind,
    schema: CapabilitySchema,
    params: Arc<[ParamSpec]>,
    callable: Callable<E>,
}

impl<E> CapabilityEntry<E> {
    pub fn kind(&self) -> CapabilityKind {
        self.kind
    }

    pub fn schema(&self) -> &CapabilitySchema {
        &self.schema
    }

    pub fn is_async(&self) -> bool {
        matches!(self.callable, Callable::Async(_))
    }

    /// Call bound to `receiver`; async handlers are awaited
    pub async fn call(
        &self,
        receiver: &E,
        args: Vec<Value>,
        kwargs: Kwargs,
    ) -> Result<Value, EnvError> {
        let args = CallArgs::bound(args, kwargs, Arc::clone(&self.params));
        match &self.callable {
            Callable::Sync(f) => f(receiver, args),
            Callable::Async(f) => f(receiver, args).await,
        }
    }
}

struct Namespace<E> {
    entries: Vec<CapabilityEntry<E>>,
    index: HashMap<String, usize>,
}

impl<E> Default for Namespace<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

/// Read and write capability tables for environment type `E`
///
/// Names are unique within each namespace; the same name may exist once as
/// read and once as write.
pub struct CapabilityRegistry<E> {
    read: Namespace<E>,
    write: Namespace<E>,
}

impl<E> Default for CapabilityRegistry<E> {
    fn default() -> Self {
        Self {
            read: Namespace::default(),
            write: Namespace::default(),
        }
    }
}

impl<E> CapabilityRegistry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the registry stored in `cell`, building it on first use.
    ///
    /// `build` runs the registration pass; its error (typically a duplicate
    /// name) is returned and the cell stays empty.
    pub fn get_or_build<F>(
        cell: &'static OnceLock<Self>,
        build: F,
    ) -> Result<&'static Self, EnvError>
    where
        F: FnOnce(&mut Self) -> Result<(), EnvError>,
    {
        if let Some(registry) = cell.get() {
            return Ok(registry);
        }
        let mut registry = Self::new();
        build(&mut registry)?;
        Ok(cell.get_or_init(|| registry))
    }

    fn namespace(&self, kind: CapabilityKind) -> &Namespace<E> {
        match kind {
            CapabilityKind::Read => &self.read,
            CapabilityKind::Write => &self.write,
        }
    }

    fn insert(
        &mut self,
        kind: CapabilityKind,
        schema: CapabilitySchema,
        callable: Callable<E>,
    ) -> Result<&mut Self, EnvError> {
        let namespace = match kind {
            CapabilityKind::Read => &mut self.read,
            CapabilityKind::Write => &mut self.write,
        };
        if namespace.index.contains_key(&schema.name) {
            return Err(EnvError::DuplicateCapability {
                kind,
                name: schema.name,
            });
        }
        debug!(kind = %kind, name = %schema.name, "Registered capability");
        namespace
            .index
            .insert(schema.name.clone(), namespace.entries.len());
        namespace.entries.push(CapabilityEntry {
            kind,
            params: Arc::from(schema.params.clone()),
            schema,
            callable,
        });
        Ok(self)
    }

    /// Register a synchronous handler
    pub fn register<F>(
        &mut self,
        kind: CapabilityKind,
        schema: CapabilitySchema,
        handler: F,
    ) -> Result<&mut Self, EnvError>
    where
        F: Fn(&E, CallArgs) -> Result<Value, EnvError> + Send + Sync + 'static,
    {
        self.insert(kind, schema, Callable::Sync(Arc::new(handler)))
    }

    /// Register an asynchronous handler
    pub fn register_async<F>(
        &mut self,
        kind: CapabilityKind,
        schema: CapabilitySchema,
        handler: F,
    ) -> Result<&mut Self, EnvError>
    where
        F: for<'a> Fn(&'a E, CallArgs) -> BoxFuture<'a, Result<Value, EnvError>>
            + Send
            + Sync
            + 'static,
    {
        self.insert(kind, schema, Callable::Async(Arc::new(handler)))
    }

    /// Register a synchronous read capability
    pub fn read<F>(&mut self, schema: CapabilitySchema, handler: F) -> Result<&mut Self, EnvError>
    where
        F: Fn(&E, CallArgs) -> Result<Value, EnvError> + Send + Sync + 'static,
    {
        self.register(CapabilityKind::Read, schema, handler)
    }

    /// Register a synchronous write capability
    pub fn write<F>(&mut self, schema: CapabilitySchema, handler: F) -> Result<&mut Self, EnvError>
    where
        F: Fn(&E, CallArgs) -> Result<Value, EnvError> + Send + Sync + 'static,
    {
        self.register(CapabilityKind::Write, schema, handler)
    }

    /// Look up an entry
    pub fn resolve(
        &self,
        kind: CapabilityKind,
        name: &str,
    ) -> Result<&CapabilityEntry<E>, EnvError> {
        let namespace = self.namespace(kind);
        namespace
            .index
            .get(name)
            .map(|&idx| &namespace.entries[idx])
            .ok_or_else(|| EnvError::UnknownCapability {
                kind,
                name: name.to_string(),
            })
    }

    pub fn contains(&self, kind: CapabilityKind, name: &str) -> bool {
        self.namespace(kind).index.contains_key(name)
    }

    /// Schemas in registration order
    pub fn list(&self, kind: CapabilityKind) -> Vec<CapabilitySchema> {
        self.namespace(kind)
            .entries
            .iter()
            .map(|e| e.schema.clone())
            .collect()
    }

    /// Invoke `call` against `receiver`.
    ///
    /// Handler errors pass through untouched.
    pub async fn invoke(
        &self,
        kind: CapabilityKind,
        receiver: &E,
        call: ApiCall,
    ) -> Result<Value, EnvError> {
        let entry = self.resolve(kind, &call.api_name)?;
        debug!(
            kind = %kind,
            name = %call.api_name,
            is_async = entry.is_async(),
            "Invoking capability"
        );
        entry.call(receiver, call.args, call.kwargs).await
    }
}
