//! # ctxpool-core
//!
//! The context broker of an emulation host - THE REGISTRY.
//!
//! Plugins of a virtual computer (CPU, memory, devices, compilers) publish
//! typed capability objects ("contexts") and discover each other's contexts
//! without referring to each other directly.
//!
//! ## Architecture
//!
//! - `fingerprint`: structural identity of an interface, independent of
//!   which crate or module declared it
//! - `registry`: registrations keyed by fingerprint and by owner
//! - `topology`: the host-bound connectivity oracle gating visibility
//! - `pool` + `facade`: the shared handle and its typed accessors
//!
//! ## Architectural Constraints
//!
//! - Visibility is fail-closed: nothing is visible before a topology is bound
//! - "Not found" is never an error
//! - No async, no I/O, no global state

// =============================================================================
// MODULES
// =============================================================================

mod facade;
pub mod family;
pub mod fingerprint;
pub mod interface;
mod macros;
pub mod pool;
pub mod primitives;
pub mod registry;
pub mod schema;
pub mod topology;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{Fingerprint, OwnerId, PoolError};

// =============================================================================
// RE-EXPORTS: Interfaces and Fingerprints
// =============================================================================

pub use family::CpuContext;
pub use fingerprint::{canonical_form, fingerprint, normalize_type_name};
pub use interface::{
    Compiler, ContextInterface, ContextObject, Cpu, Device, Family, Generic, Memory,
};
pub use schema::{ContextFamily, ContextSchema, OperationSig};

// =============================================================================
// RE-EXPORTS: Broker
// =============================================================================

pub use pool::ContextPool;
pub use registry::{ContextRegistry, Registration, RegistryStats};
pub use topology::{ConnectionGraph, Credential, Topology, TopologyGate};
