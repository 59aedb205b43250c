//! # Topology Gate
//!
//! Holds the host secret and, once bound, the topology. Visibility is
//! fail-closed: until a topology is bound nothing is connected to anything.
//!
//! ## Binding policy
//!
//! The first bind presenting the correct credential wins. Any later bind is
//! rejected with `PoolError::TopologyAlreadyBound`, even with the correct
//! credential, so an initialized broker cannot be redirected.

use super::Topology;
use crate::primitives::MIN_CREDENTIAL_LENGTH;
use crate::{OwnerId, PoolError};
use std::fmt;
use std::sync::{Arc, OnceLock};
use subtle::ConstantTimeEq;

// =============================================================================
// CREDENTIAL
// =============================================================================

/// A shared secret presented when binding the topology.
///
/// `Debug` never prints the secret. Credentials only compare through
/// [`Credential::matches`]; there is no `==`:
///
/// ```compile_fail
/// use ctxpool_core::Credential;
///
/// let same = Credential::new("host-secret-0123456789") == Credential::new("guess");
/// ```
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    /// Wrap a secret.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Constant-time comparison.
    ///
    /// Both secrets are padded to the same length so `ct_eq` always runs
    /// over the same number of bytes and the comparison time does not leak
    /// the secret's length.
    #[must_use]
    pub fn matches(&self, presented: &Credential) -> bool {
        let expected = self.0.as_bytes();
        let provided = presented.0.as_bytes();

        let max_len = provided.len().max(expected.len());
        let mut padded_provided = vec![0u8; max_len];
        let mut padded_expected = vec![0u8; max_len];
        padded_provided[..provided.len()].copy_from_slice(provided);
        padded_expected[..expected.len()].copy_from_slice(expected);

        let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
        bytes_match && provided.len() == expected.len()
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

// =============================================================================
// TOPOLOGY GATE
// =============================================================================

/// Single authority for context visibility.
pub struct TopologyGate {
    secret: Credential,
    topology: OnceLock<Arc<dyn Topology>>,
}

impl TopologyGate {
    /// Create an unbound gate guarded by the host secret.
    ///
    /// Fails with `PoolError::InvalidCredential` if the secret is shorter
    /// than `MIN_CREDENTIAL_LENGTH`.
    pub fn new(secret: Credential) -> Result<Self, PoolError> {
        if secret.len() < MIN_CREDENTIAL_LENGTH {
            return Err(PoolError::InvalidCredential);
        }
        Ok(Self {
            secret,
            topology: OnceLock::new(),
        })
    }

    /// Bind the topology.
    ///
    /// # Errors
    /// - `PoolError::InvalidCredential` if `credential` is not the host secret
    /// - `PoolError::TopologyAlreadyBound` if a topology is already bound
    ///
    /// The binding state is unchanged on error.
    pub fn bind(&self, credential: &Credential, topology: Arc<dyn Topology>) -> Result<(), PoolError> {
        if !self.secret.matches(credential) {
            tracing::warn!(
                event = "bind_rejected",
                reason = "invalid_credential",
                "Topology bind rejected: invalid credential"
            );
            return Err(PoolError::InvalidCredential);
        }

        if self.topology.set(topology).is_err() {
            tracing::warn!(
                event = "bind_rejected",
                reason = "already_bound",
                "Topology bind rejected: a topology is already bound"
            );
            return Err(PoolError::TopologyAlreadyBound);
        }

        tracing::info!(event = "topology_bound", "Topology bound");
        Ok(())
    }

    /// Whether a topology has been bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.topology.get().is_some()
    }

    /// Whether `requester` may access contexts owned by `owner`.
    ///
    /// Always `false` while unbound.
    #[must_use]
    pub fn is_connected(&self, requester: OwnerId, owner: OwnerId) -> bool {
        self.topology
            .get()
            .is_some_and(|topology| topology.is_connected(requester, owner))
    }
}

impl fmt::Debug for TopologyGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopologyGate")
            .field("bound", &self.is_bound())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
