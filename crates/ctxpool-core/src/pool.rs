//! # Context Pool
//!
//! The broker handle a host creates once and shares (`Arc<ContextPool>`)
//! with every plugin. It owns one `ContextRegistry` and one `TopologyGate`
//! and joins them: lookups only see registrations whose owner the requester
//! is connected to.
//!
//! There is no global instance. Hosts that load several virtual computers
//! create one pool per computer.

use crate::interface::{ContextInterface, ContextObject};
use crate::registry::{ContextRegistry, Registration, RegistryStats};
use crate::schema::ContextSchema;
use crate::topology::{Credential, Topology, TopologyGate};
use crate::types::{OwnerId, PoolError};
use std::sync::Arc;

/// Registry of published contexts, gated by the computer's topology.
#[derive(Debug)]
pub struct ContextPool {
    registry: ContextRegistry,
    gate: TopologyGate,
}

impl ContextPool {
    /// Create an empty pool guarded by the host secret.
    ///
    /// The topology is unbound, so nothing is visible until `bind` succeeds.
    pub fn new(secret: Credential) -> Result<Self, PoolError> {
        Ok(Self {
            registry: ContextRegistry::new(),
            gate: TopologyGate::new(secret)?,
        })
    }

    // -------------------------------------------------------------------------
    // Topology
    // -------------------------------------------------------------------------

    /// Bind the computer topology. See `TopologyGate::bind`.
    pub fn bind(&self, credential: &Credential, topology: Arc<dyn Topology>) -> Result<(), PoolError> {
        self.gate.bind(credential, topology)
    }

    /// Whether a topology has been bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.gate.is_bound()
    }

    /// Whether `requester` can see contexts owned by `owner`.
    #[must_use]
    pub fn is_connected(&self, requester: OwnerId, owner: OwnerId) -> bool {
        self.gate.is_connected(requester, owner)
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Publish `context` as interface `I` on behalf of `owner`.
    ///
    /// ```
    /// use ctxpool_core::{ContextPool, Credential, OwnerId};
    /// use std::sync::Arc;
    ///
    /// ctxpool_core::context_interface! {
    ///     pub trait Timer {
    ///         fn ticks(&self) -> u64;
    ///     }
    /// }
    ///
    /// struct Pit;
    /// impl Timer for Pit {
    ///     fn ticks(&self) -> u64 { 42 }
    /// }
    ///
    /// let pool = ContextPool::new(Credential::new("host-secret-0123456789")).unwrap();
    /// let timer: Arc<dyn Timer> = Arc::new(Pit);
    /// pool.register(OwnerId(1), timer).unwrap();
    /// assert_eq!(pool.stats().registrations, 1);
    /// ```
    ///
    /// # Errors
    /// - `PoolError::InvalidContext` if `I`'s schema is not a valid context
    /// - `PoolError::AlreadyRegistered` if the instance is already published,
    ///   under any interface or owner
    pub fn register<I>(&self, owner: OwnerId, context: Arc<I>) -> Result<(), PoolError>
    where
        I: ?Sized + ContextInterface,
    {
        let object = ContextObject::new(context)?;
        self.registry.register(owner, object, I::schema())
    }

    /// Publish a type-erased context under a runtime schema.
    ///
    /// The object must implement the schema structurally: its fingerprint
    /// has to match, the declaring name does not.
    pub fn register_object(
        &self,
        owner: OwnerId,
        object: ContextObject,
        schema: &ContextSchema,
    ) -> Result<(), PoolError> {
        self.registry.register(owner, object, schema)
    }

    /// Withdraw every context `owner` published as interface `I`.
    ///
    /// Returns the number of registrations removed.
    pub fn unregister<I>(&self, owner: OwnerId) -> Result<usize, PoolError>
    where
        I: ?Sized + ContextInterface,
    {
        self.registry.unregister(owner, I::schema())
    }

    /// Withdraw every context `owner` published under `schema`.
    pub fn unregister_schema(&self, owner: OwnerId, schema: &ContextSchema) -> Result<usize, PoolError> {
        self.registry.unregister(owner, schema)
    }

    /// Withdraw everything `owner` published, e.g. when its plugin unloads.
    pub fn unregister_owner(&self, owner: OwnerId) -> usize {
        self.registry.unregister_owner(owner)
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    /// The `index`-th context under `schema` visible to `requester`.
    ///
    /// Returns `Ok(None)` when nothing matches, including while the topology
    /// is unbound.
    pub fn lookup(
        &self,
        requester: OwnerId,
        schema: &ContextSchema,
        index: usize,
    ) -> Result<Option<ContextObject>, PoolError> {
        self.registry
            .lookup(schema, index, |owner| self.gate.is_connected(requester, owner))
    }

    /// Every registration under `schema` visible to `requester`, in
    /// registration order.
    pub fn visible(&self, requester: OwnerId, schema: &ContextSchema) -> Result<Vec<Registration>, PoolError> {
        self.registry
            .visible(schema, |owner| self.gate.is_connected(requester, owner))
    }

    /// Contexts published by `owner`, regardless of visibility.
    #[must_use]
    pub fn registrations_of(&self, owner: OwnerId) -> Vec<Registration> {
        self.registry.registrations_of(owner)
    }

    /// Registry size counters.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }
}
