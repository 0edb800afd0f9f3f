// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Node and edge identifiers.
use core::fmt;
use core::hash::Hash;

/// Bound satisfied by every node identifier.
///
/// Nodes are opaque to the engine. `Ord` fixes the deterministic iteration
/// order used to pick "the first node holding a particle" and to lay out the
/// enumeration counter; `Hash` backs the O(1) edge index of each rotor.
pub trait NodeKey: Ord + Hash + Clone + fmt::Debug {}

impl<T> NodeKey for T where T: Ord + Hash + Clone + fmt::Debug {}

/// Directed edge `(tail, head, key)` of a rotor graph.
///
/// `key` tells parallel edges apart: it is the lowest non-negative integer not
/// already used by another edge with the same `(tail, head)` pair when the
/// edge is created.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge<N> {
    /// Node the edge leaves.
    pub tail: N,
    /// Node the edge enters.
    pub head: N,
    /// Disambiguator among parallel edges.
    pub key: u32,
}

impl<N> Edge<N> {
    /// Builds an edge value. This does not add anything to a graph.
    pub fn new(tail: N, head: N, key: u32) -> Self {
        Self { tail, head, key }
    }
}

impl<N: PartialEq> Edge<N> {
    /// Returns `true` when the edge leaves and enters the same node.
    pub fn is_loop(&self) -> bool {
        self.tail == self.head
    }
}

impl<N> From<(N, N, u32)> for Edge<N> {
    fn from((tail, head, key): (N, N, u32)) -> Self {
        Self { tail, head, key }
    }
}

impl<N: fmt::Display> fmt::Display for Edge<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.tail, self.head, self.key)
    }
}
