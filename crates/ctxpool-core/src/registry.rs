//! # Context Registry
//!
//! Stores registrations keyed by fingerprint and by owner.
//!
//! ## Invariants
//!
//! - An instance (by allocation identity) is registered at most once
//! - The owner of a registration is fixed when it is created
//! - Buckets never stay empty: the last removal drops the bucket
//! - Unregistration only touches the caller's own registrations
//!
//! The registry does not decide visibility. Lookups take a predicate over
//! owners; the pool supplies one backed by the topology gate.

use crate::fingerprint::fingerprint;
use crate::interface::ContextObject;
use crate::schema::ContextSchema;
use crate::types::{Fingerprint, OwnerId, PoolError};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

// =============================================================================
// REGISTRATION
// =============================================================================

/// A published context together with its owner.
#[derive(Debug, Clone)]
pub struct Registration {
    /// The plugin that published the context.
    pub owner: OwnerId,
    /// The published instance.
    pub object: ContextObject,
}

impl Registration {
    /// Fingerprint of the bucket this registration lives in.
    #[must_use]
    pub fn fingerprint(&self) -> &Fingerprint {
        self.object.fingerprint()
    }
}

/// Owner-side index entry.
#[derive(Debug, Clone)]
struct OwnedEntry {
    fingerprint: Fingerprint,
    identity: usize,
}

/// Size counters of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryStats {
    /// Number of non-empty fingerprint buckets.
    pub buckets: usize,
    /// Number of owners with at least one registration.
    pub owners: usize,
    /// Total number of registrations.
    pub registrations: usize,
}

// =============================================================================
// REGISTRY STATE
// =============================================================================

#[derive(Debug, Default)]
struct RegistryState {
    /// Fingerprint -> registrations in registration order.
    by_fingerprint: BTreeMap<Fingerprint, Vec<Registration>>,
    /// Owner -> what it registered.
    by_owner: BTreeMap<OwnerId, Vec<OwnedEntry>>,
    /// Instance identity -> the bucket it is registered in.
    by_identity: BTreeMap<usize, Fingerprint>,
}

impl RegistryState {
    /// Find where an instance is registered, if anywhere.
    fn locate(&self, identity: usize) -> Option<&Fingerprint> {
        self.by_identity.get(&identity)
    }

    /// Drop the owner-side entries of `owner` matching `remove`.
    fn forget_owned(&mut self, owner: OwnerId, remove: impl Fn(&OwnedEntry) -> bool) {
        if let Some(entries) = self.by_owner.get_mut(&owner) {
            entries.retain(|entry| !remove(entry));
            if entries.is_empty() {
                self.by_owner.remove(&owner);
            }
        }
    }
}

// =============================================================================
// CONTEXT REGISTRY
// =============================================================================

/// Thread-safe store of context registrations.
///
/// Lookups share a read lock; registration and removal take the write lock.
/// A poisoned lock is recovered: every mutation below completes its
/// bookkeeping before anything that could panic runs.
#[derive(Debug, Default)]
pub struct ContextRegistry {
    state: RwLock<RegistryState>,
}

impl ContextRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `object` under `schema` on behalf of `owner`.
    ///
    /// # Errors
    /// - `PoolError::InvalidContext` if the schema is not a valid context
    ///   descriptor or `object` does not implement it
    /// - `PoolError::AlreadyRegistered` if the instance is already registered
    ///
    /// The registry is unchanged on error.
    pub fn register(
        &self,
        owner: OwnerId,
        object: ContextObject,
        schema: &ContextSchema,
    ) -> Result<(), PoolError> {
        let fingerprint = fingerprint(schema)?;

        if object.fingerprint() != &fingerprint {
            return Err(PoolError::invalid(format!(
                "{} does not implement {}",
                object.interface(),
                schema.interface
            )));
        }

        let mut guard = self.write();
        let state = &mut *guard;

        if let Some(existing) = state.locate(object.identity()) {
            return Err(PoolError::AlreadyRegistered {
                fingerprint: existing.clone(),
            });
        }

        tracing::debug!(
            owner = %owner,
            interface = %schema.interface,
            fingerprint = fingerprint.short(),
            "context registered"
        );

        state
            .by_identity
            .insert(object.identity(), fingerprint.clone());
        state.by_owner.entry(owner).or_default().push(OwnedEntry {
            fingerprint: fingerprint.clone(),
            identity: object.identity(),
        });
        state
            .by_fingerprint
            .entry(fingerprint)
            .or_default()
            .push(Registration { owner, object });

        Ok(())
    }

    /// Remove every registration of `owner` under `schema`'s fingerprint.
    ///
    /// Returns the number of registrations removed; `0` is not an error.
    ///
    /// # Errors
    /// `PoolError::InvalidContext` if the schema is not a valid context
    /// descriptor.
    pub fn unregister(&self, owner: OwnerId, schema: &ContextSchema) -> Result<usize, PoolError> {
        let fingerprint = fingerprint(schema)?;

        let mut guard = self.write();
        let state = &mut *guard;

        let Some(bucket) = state.by_fingerprint.get_mut(&fingerprint) else {
            return Ok(0);
        };

        let mut released = Vec::new();
        bucket.retain(|registration| {
            let keep = registration.owner != owner;
            if !keep {
                released.push(registration.object.identity());
            }
            keep
        });
        let removed = released.len();

        if bucket.is_empty() {
            state.by_fingerprint.remove(&fingerprint);
        }

        for identity in &released {
            state.by_identity.remove(identity);
        }

        if removed > 0 {
            state.forget_owned(owner, |entry| entry.fingerprint == fingerprint);
            tracing::debug!(
                owner = %owner,
                interface = %schema.interface,
                fingerprint = fingerprint.short(),
                removed,
                "contexts unregistered"
            );
        }

        Ok(removed)
    }

    /// Remove every registration of `owner`, across all fingerprints.
    ///
    /// Used when a plugin is unloaded. Returns the number removed.
    pub fn unregister_owner(&self, owner: OwnerId) -> usize {
        let mut guard = self.write();
        let state = &mut *guard;

        let Some(entries) = state.by_owner.remove(&owner) else {
            return 0;
        };

        for entry in &entries {
            state.by_identity.remove(&entry.identity);
            if let Some(bucket) = state.by_fingerprint.get_mut(&entry.fingerprint) {
                bucket.retain(|registration| registration.object.identity() != entry.identity);
                if bucket.is_empty() {
                    state.by_fingerprint.remove(&entry.fingerprint);
                }
            }
        }

        tracing::debug!(owner = %owner, removed = entries.len(), "owner unregistered");
        entries.len()
    }

    /// Return the `index`-th registration under `schema` whose owner passes
    /// `visible`, in registration order.
    ///
    /// Invisible registrations do not consume an index. Returns `None` if the
    /// bucket is absent or fewer than `index + 1` registrations are visible.
    ///
    /// # Errors
    /// `PoolError::InvalidContext` if the schema is not a valid context
    /// descriptor.
    pub fn lookup(
        &self,
        schema: &ContextSchema,
        index: usize,
        visible: impl Fn(OwnerId) -> bool,
    ) -> Result<Option<ContextObject>, PoolError> {
        let found = self
            .snapshot(schema)?
            .into_iter()
            .filter(|registration| visible(registration.owner))
            .nth(index)
            .map(|registration| registration.object);
        Ok(found)
    }

    /// All registrations under `schema` whose owner passes `visible`, in
    /// registration order.
    pub fn visible(
        &self,
        schema: &ContextSchema,
        visible: impl Fn(OwnerId) -> bool,
    ) -> Result<Vec<Registration>, PoolError> {
        let mut bucket = self.snapshot(schema)?;
        bucket.retain(|registration| visible(registration.owner));
        Ok(bucket)
    }

    /// Registrations published by `owner`, grouped by fingerprint.
    #[must_use]
    pub fn registrations_of(&self, owner: OwnerId) -> Vec<Registration> {
        let state = self.read();
        state
            .by_fingerprint
            .values()
            .flatten()
            .filter(|registration| registration.owner == owner)
            .cloned()
            .collect()
    }

    /// Current size counters.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let state = self.read();
        RegistryStats {
            buckets: state.by_fingerprint.len(),
            owners: state.by_owner.len(),
            registrations: state.by_fingerprint.values().map(Vec::len).sum(),
        }
    }

    /// Copy of the bucket for `schema`.
    ///
    /// Visibility predicates call into the host's topology, so they run on
    /// the copy after the lock is released.
    fn snapshot(&self, schema: &ContextSchema) -> Result<Vec<Registration>, PoolError> {
        let fingerprint = fingerprint(schema)?;
        let state = self.read();
        Ok(state
            .by_fingerprint
            .get(&fingerprint)
            .cloned()
            .unwrap_or_default())
    }
}

// =============================================================================
// TESTS
// =============================================================================
