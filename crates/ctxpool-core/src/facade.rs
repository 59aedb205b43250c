//! # Typed Access
//!
//! Family-checked accessors over `ContextPool::lookup`. The family is part of
//! the interface type (`ContextInterface::Family`), so asking for a memory
//! context through `get_cpu_context` does not compile.
//!
//! A registration published through a structurally identical but distinct
//! trait shares the fingerprint, but cannot be recovered as `I`. Such a
//! match yields `Ok(None)`; `ContextPool::lookup` still returns it untyped.

use crate::interface::{Compiler, ContextInterface, Cpu, Device, Memory};
use crate::pool::ContextPool;
use crate::types::{OwnerId, PoolError};
use std::sync::Arc;

impl ContextPool {
    /// The `index`-th context of interface `I` visible to `requester`.
    pub fn get_context<I>(&self, requester: OwnerId, index: usize) -> Result<Option<Arc<I>>, PoolError>
    where
        I: ?Sized + ContextInterface,
    {
        let Some(object) = self.lookup(requester, I::schema(), index)? else {
            return Ok(None);
        };

        let typed = object.downcast::<I>();
        if typed.is_none() {
            tracing::debug!(
                requester = %requester,
                expected = %I::schema().interface,
                published = object.interface(),
                "context matches structurally but was published as another type"
            );
        }
        Ok(typed)
    }

    /// First CPU context of interface `I` visible to `requester`.
    pub fn get_cpu_context<I>(&self, requester: OwnerId) -> Result<Option<Arc<I>>, PoolError>
    where
        I: ?Sized + ContextInterface<Family = Cpu>,
    {
        self.get_context::<I>(requester, 0)
    }

    /// `index`-th CPU context of interface `I` visible to `requester`.
    pub fn get_cpu_context_at<I>(&self, requester: OwnerId, index: usize) -> Result<Option<Arc<I>>, PoolError>
    where
        I: ?Sized + ContextInterface<Family = Cpu>,
    {
        self.get_context::<I>(requester, index)
    }

    /// First memory context of interface `I` visible to `requester`.
    pub fn get_memory_context<I>(&self, requester: OwnerId) -> Result<Option<Arc<I>>, PoolError>
    where
        I: ?Sized + ContextInterface<Family = Memory>,
    {
        self.get_context::<I>(requester, 0)
    }

    /// `index`-th memory context of interface `I` visible to `requester`.
    pub fn get_memory_context_at<I>(&self, requester: OwnerId, index: usize) -> Result<Option<Arc<I>>, PoolError>
    where
        I: ?Sized + ContextInterface<Family = Memory>,
    {
        self.get_context::<I>(requester, index)
    }

    /// First device context of interface `I` visible to `requester`.
    ///
    /// Machines commonly carry several devices of one kind (serial ports,
    /// disk drives); use `get_device_context_at` to reach the others.
    pub fn get_device_context<I>(&self, requester: OwnerId) -> Result<Option<Arc<I>>, PoolError>
    where
        I: ?Sized + ContextInterface<Family = Device>,
    {
        self.get_context::<I>(requester, 0)
    }

    /// `index`-th device context of interface `I` visible to `requester`.
    pub fn get_device_context_at<I>(&self, requester: OwnerId, index: usize) -> Result<Option<Arc<I>>, PoolError>
    where
        I: ?Sized + ContextInterface<Family = Device>,
    {
        self.get_context::<I>(requester, index)
    }

    /// First compiler context of interface `I` visible to `requester`.
    pub fn get_compiler_context<I>(&self, requester: OwnerId) -> Result<Option<Arc<I>>, PoolError>
    where
        I: ?Sized + ContextInterface<Family = Compiler>,
    {
        self.get_context::<I>(requester, 0)
    }

    /// `index`-th compiler context of interface `I` visible to `requester`.
    pub fn get_compiler_context_at<I>(
        &self,
        requester: OwnerId,
        index: usize,
    ) -> Result<Option<Arc<I>>, PoolError>
    where
        I: ?Sized + ContextInterface<Family = Compiler>,
    {
        self.get_context::<I>(requester, index)
    }
}
