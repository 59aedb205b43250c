//! # Topology
//!
//! The connectivity oracle that decides which plugin may see which context.
//!
//! The topology is owned by the host (it is the wiring of the virtual
//! computer). The broker only queries it, through the `TopologyGate`, which
//! is the single authority for visibility.

mod gate;

pub use gate::{Credential, TopologyGate};

use crate::OwnerId;
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// TOPOLOGY TRAIT
// =============================================================================

/// Answers whether a requester is connected to the owner of a context.
///
/// Implementations must be cheap and must not block: the broker calls
/// `is_connected` once per candidate registration during a lookup.
pub trait Topology: Send + Sync {
    /// Whether `requester` may access contexts owned by `target`.
    fn is_connected(&self, requester: OwnerId, target: OwnerId) -> bool;
}

impl<F> Topology for F
where
    F: Fn(OwnerId, OwnerId) -> bool + Send + Sync,
{
    fn is_connected(&self, requester: OwnerId, target: OwnerId) -> bool {
        self(requester, target)
    }
}

// =============================================================================
// CONNECTION GRAPH
// =============================================================================

/// A directed connection graph between plugins.
///
/// `connect(a, b)` lets `a` see contexts owned by `b`. Connections are not
/// implicitly symmetric and a plugin is not connected to itself unless an
/// explicit self-edge is added.
///
/// Uses `BTreeMap`/`BTreeSet` so listings are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionGraph {
    /// requester -> owners it may access
    edges: BTreeMap<OwnerId, BTreeSet<OwnerId>>,
}

impl ConnectionGraph {
    /// Create an empty graph (nothing is connected).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from directed edges.
    #[must_use]
    pub fn from_edges(edges: impl IntoIterator<Item = (OwnerId, OwnerId)>) -> Self {
        let mut graph = Self::new();
        for (from, to) in edges {
            graph.connect(from, to);
        }
        graph
    }

    /// Let `from` access contexts owned by `to`.
    ///
    /// Returns `false` if the connection already existed.
    pub fn connect(&mut self, from: OwnerId, to: OwnerId) -> bool {
        self.edges.entry(from).or_default().insert(to)
    }

    /// Connect two plugins in both directions.
    pub fn connect_both(&mut self, a: OwnerId, b: OwnerId) {
        self.connect(a, b);
        self.connect(b, a);
    }

    /// Remove a directed connection. Returns `true` if it existed.
    pub fn disconnect(&mut self, from: OwnerId, to: OwnerId) -> bool {
        let Some(targets) = self.edges.get_mut(&from) else {
            return false;
        };
        let removed = targets.remove(&to);
        if targets.is_empty() {
            self.edges.remove(&from);
        }
        removed
    }

    /// All directed connections, ordered by (from, to).
    pub fn connections(&self) -> impl Iterator<Item = (OwnerId, OwnerId)> + '_ {
        self.edges
            .iter()
            .flat_map(|(from, targets)| targets.iter().map(move |to| (*from, *to)))
    }

    /// Owners `requester` may access.
    pub fn targets_of(&self, requester: OwnerId) -> impl Iterator<Item = OwnerId> + '_ {
        self.edges.get(&requester).into_iter().flatten().copied()
    }

    /// Number of directed connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }
}

impl Topology for ConnectionGraph {
    fn is_connected(&self, requester: OwnerId, target: OwnerId) -> bool {
        self.edges
            .get(&requester)
            .is_some_and(|targets| targets.contains(&target))
    }
}

// =============================================================================
// TESTS
// =============================================================================
