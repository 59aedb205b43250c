//! # Core Type Definitions
//!
//! This module contains the identifiers and the error taxonomy shared by
//! every part of the broker:
//! - Owner identifiers (`OwnerId`)
//! - Interface fingerprints (`Fingerprint`)
//! - Error types (`PoolError`)
//!
//! All identifiers implement `Ord` so registry buckets can live in
//! `BTreeMap`s and iterate deterministically.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

// =============================================================================
// OWNER IDENTIFIER
// =============================================================================

/// Opaque identifier of a registered component (plugin).
///
/// Owner IDs are handed out by the host's plugin manager. The broker never
/// generates them and only compares them for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub u64);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// FINGERPRINT
// =============================================================================

/// Structural identity of a context interface.
///
/// An upper-case hex BLAKE3 digest of the interface's canonical operation
/// list. Two interfaces with the same operations share a fingerprint even
/// when they were declared separately.
///
/// Clones share the digest string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint(Arc<str>);

impl Fingerprint {
    /// Wrap an already rendered digest string.
    #[must_use]
    pub(crate) fn from_hex(hex: String) -> Self {
        Self(hex.into())
    }

    /// Get the fingerprint as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight hex characters, for log lines.
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from_hex)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the context broker.
///
/// - Validation errors surface immediately; the registry is left unchanged
/// - "Nothing found" is never an error: lookups return `None`
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    /// The descriptor is not a valid context interface, or the instance does
    /// not implement it.
    #[error("Invalid context: {0}")]
    InvalidContext(String),

    /// The instance is already registered.
    #[error("Context already registered under {fingerprint}")]
    AlreadyRegistered {
        /// Fingerprint of the bucket holding the existing registration.
        fingerprint: Fingerprint,
    },

    /// Topology binding attempted with a wrong credential.
    #[error("Invalid credential")]
    InvalidCredential,

    /// A topology is already bound; the first successful bind wins.
    #[error("Topology already bound")]
    TopologyAlreadyBound,

    /// A host configuration file is malformed or inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error occurred while reading host configuration.
    #[error("I/O error: {0}")]
    Io(String),
}

impl PoolError {
    /// Shorthand for building an `InvalidContext` error.
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidContext(reason.into())
    }
}

// =============================================================================
// TESTS
// =============================================================================
