// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Particle configurations.
use std::collections::BTreeSet;

use crate::graph::RotorGraph;
use crate::ident::NodeKey;
use crate::vector::Vector;

/// Signed particle count per node. Negative counts are antiparticles.
///
/// Any integer is legal at any node, sinks included. Absent nodes hold 0.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[cfg_attr(
    feature = "serde",
    serde(bound(deserialize = "N: serde::Deserialize<'de> + Ord"))
)]
pub struct ParticleConfig<N> {
    counts: Vector<N>,
}

impl<N: NodeKey> ParticleConfig<N> {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self {
            counts: Vector::new(),
        }
    }

    /// One zero entry per node of `graph`.
    pub fn zeroed(graph: &RotorGraph<N>) -> Self {
        Self {
            counts: graph.nodes().map(|n| (n.clone(), 0)).collect(),
        }
    }

    /// Particles at `node`.
    pub fn get(&self, node: &N) -> i64 {
        self.counts.get(node)
    }

    /// Sets the count at `node` to `k`.
    pub fn set_particles(&mut self, node: N, k: i64) {
        self.counts.set(node, k);
    }

    /// Adds `k` particles at `node`.
    pub fn add_particles(&mut self, node: &N, k: i64) {
        self.counts.add_at(node, k);
    }

    /// Removes `k` particles from `node` (the count may go negative).
    pub fn remove_particles(&mut self, node: &N, k: i64) {
        self.counts.add_at(node, -k);
    }

    /// Moves `k` particles from `from` to `to`.
    pub fn transfer_particles(&mut self, from: &N, to: &N, k: i64) {
        self.remove_particles(from, k);
        self.add_particles(to, k);
    }

    /// Sets every stored node to `k`.
    pub fn set_all_particles(&mut self, k: i64) {
        self.counts = self.counts.keys().map(|n| (n.clone(), k)).collect();
    }

    /// Adds `k` at every stored node.
    pub fn add_all_particles(&mut self, k: i64) {
        self.counts = self.counts.add_scalar(k);
    }

    /// First node (in `Ord` order) outside `sinks` holding a positive count.
    pub fn first_node_with_particle(&self, sinks: &BTreeSet<N>) -> Option<&N> {
        self.counts
            .iter()
            .find(|(n, &k)| k > 0 && !sinks.contains(*n))
            .map(|(n, _)| n)
    }

    /// First node (in `Ord` order) outside `sinks` holding a negative count.
    pub fn first_node_with_antiparticle(&self, sinks: &BTreeSet<N>) -> Option<&N> {
        self.counts
            .iter()
            .find(|(n, &k)| k < 0 && !sinks.contains(*n))
            .map(|(n, _)| n)
    }

    /// Nodes holding a non-zero count.
    pub fn occupied_nodes(&self) -> impl Iterator<Item = &N> {
        self.counts.iter().filter(|(_, &k)| k != 0).map(|(n, _)| n)
    }

    /// Returns `true` when every node outside `sinks` holds exactly 0.
    pub fn is_settled(&self, sinks: &BTreeSet<N>) -> bool {
        self.counts
            .iter()
            .all(|(n, &k)| k == 0 || sinks.contains(n))
    }

    /// Sum over all nodes, sinks included. Routing never changes it.
    pub fn total(&self) -> i64 {
        self.counts.total()
    }

    /// Stored entries in ascending node order.
    pub fn iter(&self) -> impl Iterator<Item = (&N, i64)> {
        self.counts.iter().map(|(n, &k)| (n, k))
    }

    /// The counts as a plain vector, for vector arithmetic.
    pub fn as_vector(&self) -> &Vector<N> {
        &self.counts
    }

    /// Consumes the configuration into its vector.
    pub fn into_vector(self) -> Vector<N> {
        self.counts
    }
}

impl<N: NodeKey> Default for ParticleConfig<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Absent nodes compare as 0, so `{a: 0}` equals the empty configuration.
impl<N: NodeKey> PartialEq for ParticleConfig<N> {
    fn eq(&self, other: &Self) -> bool {
        self.counts == other.counts
    }
}

impl<N: NodeKey> Eq for ParticleConfig<N> {}

impl<N: NodeKey> From<Vector<N>> for ParticleConfig<N> {
    fn from(counts: Vector<N>) -> Self {
        Self { counts }
    }
}

impl<N: NodeKey> FromIterator<(N, i64)> for ParticleConfig<N> {
    fn from_iter<I: IntoIterator<Item = (N, i64)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_nodes_skip_sinks_and_follow_node_order() {
        let sigma: ParticleConfig<u8> = [(3, 1), (0, 4), (2, -1), (1, 2)].into_iter().collect();
        let sinks = BTreeSet::from([0]);
        assert_eq!(sigma.first_node_with_particle(&sinks), Some(&1));
        assert_eq!(sigma.first_node_with_antiparticle(&sinks), Some(&2));
        assert_eq!(sigma.first_node_with_particle(&BTreeSet::from([0, 1, 3])), None);
        assert!(!sigma.is_settled(&sinks));
    }

    #[test]
    fn transfer_conserves_total() {
        let mut sigma = ParticleConfig::new();
        sigma.add_particles(&1_u8, 3);
        sigma.transfer_particles(&1, &2, 5);
        assert_eq!(sigma.get(&1), -2);
        assert_eq!(sigma.get(&2), 5);
        assert_eq!(sigma.total(), 3);
        sigma.set_all_particles(1);
        assert_eq!(sigma.total(), 2);
        sigma.add_all_particles(2);
        assert_eq!(sigma.get(&2), 3);
        assert_eq!(sigma.occupied_nodes().count(), 2);
    }

    #[test]
    fn equality_treats_absent_nodes_as_empty() {
        let zeroed: ParticleConfig<u8> = [(1, 0), (2, 3)].into_iter().collect();
        let sparse: ParticleConfig<u8> = [(2, 3)].into_iter().collect();
        assert_eq!(zeroed, sparse);
        assert_ne!(sparse, ParticleConfig::default());
        assert_eq!(ParticleConfig::<u8>::default(), ParticleConfig::new());
    }
}
