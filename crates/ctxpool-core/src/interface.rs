//! # Context Interfaces and Objects
//!
//! `ContextInterface` is the marker a Rust capability interface must carry
//! to be registrable. It is implemented for the trait object type
//! (`dyn MyContext`) and links the interface to its schema and family.
//! The `context_interface!` macro writes that implementation.
//!
//! `ContextObject` is the type-erased handle the registry stores: the
//! published `Arc<I>`, its allocation identity, and the fingerprint of the
//! interface it was published as.

use crate::fingerprint::fingerprint;
use crate::schema::{ContextFamily, ContextSchema};
use crate::types::{Fingerprint, PoolError};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

// =============================================================================
// CAPABILITY FAMILIES (type-level)
// =============================================================================

mod sealed {
    pub trait Sealed {}
}

/// Type-level capability family tag.
///
/// Used as `ContextInterface::Family` so the typed accessors of the pool can
/// check the family at compile time.
pub trait Family: sealed::Sealed + 'static {
    /// Runtime value of the family.
    const KIND: ContextFamily;
}

macro_rules! family_tag {
    ($(#[$meta:meta])* $name:ident => $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {}

        impl sealed::Sealed for $name {}

        impl Family for $name {
            const KIND: ContextFamily = ContextFamily::$kind;
        }
    };
}

family_tag!(
    /// CPU capability family.
    Cpu => Cpu
);
family_tag!(
    /// Memory capability family.
    Memory => Memory
);
family_tag!(
    /// Device capability family.
    Device => Device
);
family_tag!(
    /// Compiler capability family.
    Compiler => Compiler
);
family_tag!(
    /// Any interface outside the well-known families.
    Generic => Generic
);

// =============================================================================
// CONTEXT INTERFACE MARKER
// =============================================================================

/// Marker for capability interfaces that can be published through the pool.
///
/// Implemented for the trait object type of the interface, e.g.
/// `impl ContextInterface for dyn Z80Context`. Use `context_interface!`
/// rather than implementing it by hand so the schema always matches the
/// trait's declared operations.
pub trait ContextInterface: Send + Sync + 'static {
    /// Capability family of the interface.
    type Family: Family;

    /// Schema describing the interface's operations.
    fn schema() -> &'static ContextSchema;
}

// =============================================================================
// CONTEXT OBJECT
// =============================================================================

/// A published context instance, type-erased.
///
/// Cloning is cheap (reference counted). Two objects are the same instance
/// when they share an allocation, regardless of which interface they were
/// published as.
#[derive(Clone)]
pub struct ContextObject {
    /// Holds the `Arc<I>` the instance was published as.
    instance: Arc<dyn Any + Send + Sync>,
    /// Address of the instance allocation.
    identity: usize,
    /// Fingerprint of the interface the instance implements.
    implements: Fingerprint,
    /// Declaring name of that interface.
    interface: Arc<str>,
}

impl ContextObject {
    /// Wrap a typed instance.
    ///
    /// Fails with `PoolError::InvalidContext` if the interface's schema is
    /// not a valid context descriptor.
    pub fn new<I>(instance: Arc<I>) -> Result<Self, PoolError>
    where
        I: ?Sized + ContextInterface,
    {
        let schema = I::schema();
        let identity = Arc::as_ptr(&instance).cast::<()>() as usize;
        Ok(Self {
            implements: fingerprint(schema)?,
            interface: schema.interface.as_str().into(),
            identity,
            instance: Arc::new(instance),
        })
    }

    /// Wrap an instance described only by a runtime schema.
    ///
    /// Used by hosts that publish contexts from configuration rather than
    /// from a compiled trait. Such objects can be looked up and inspected but
    /// never downcast to a typed interface.
    pub fn declared(
        instance: Arc<dyn Any + Send + Sync>,
        schema: &ContextSchema,
    ) -> Result<Self, PoolError> {
        let identity = Arc::as_ptr(&instance).cast::<()>() as usize;
        Ok(Self {
            implements: fingerprint(schema)?,
            interface: schema.interface.as_str().into(),
            identity,
            instance,
        })
    }

    /// Recover the typed interface.
    ///
    /// Returns `None` if the object was published as a different Rust type,
    /// even a structurally identical one.
    #[must_use]
    pub fn downcast<I>(&self) -> Option<Arc<I>>
    where
        I: ?Sized + ContextInterface,
    {
        self.instance.downcast_ref::<Arc<I>>().cloned()
    }

    /// Fingerprint of the implemented interface.
    #[must_use]
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.implements
    }

    /// Declaring name of the implemented interface.
    #[must_use]
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Whether both handles refer to the same instance.
    #[must_use]
    pub fn same_instance(&self, other: &Self) -> bool {
        self.identity == other.identity
    }

    pub(crate) fn identity(&self) -> usize {
        self.identity
    }
}

impl fmt::Debug for ContextObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextObject")
            .field("interface", &self.interface)
            .field("fingerprint", &self.implements.short())
            .field("identity", &format_args!("{:#x}", self.identity))
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
