// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Rotor configurations, cycle detection and cycle popping.
use std::collections::btree_map::{self, BTreeMap};
use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::error::{RotorError, RotorResult};
use crate::graph::RotorGraph;
use crate::ident::{Edge, NodeKey};

/// Edge each rotor currently points to, keyed by node.
///
/// Seen over its domain the configuration is a functional graph: every
/// configured node has exactly one outgoing (chosen) edge. Entries must satisfy
/// `config[n].tail == n`; [`RotorGraph::check_rotor_config`] verifies that and
/// graph membership.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[cfg_attr(
    feature = "serde",
    serde(bound(deserialize = "N: serde::Deserialize<'de> + Ord"))
)]
pub struct RotorConfig<N> {
    edges: BTreeMap<N, Edge<N>>,
}

impl<N: NodeKey> RotorConfig<N> {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self {
            edges: BTreeMap::new(),
        }
    }

    /// Every non-sink node of `graph` pointing at the first edge of its order.
    pub fn initial(graph: &RotorGraph<N>) -> Self {
        Self::initial_for(graph, &graph.sinks())
    }

    /// Like [`RotorConfig::initial`] with an explicit sink set.
    pub fn initial_for(graph: &RotorGraph<N>, sinks: &BTreeSet<N>) -> Self {
        graph
            .non_sink_nodes(sinks)
            .into_iter()
            .filter_map(|node| {
                let first = graph.out_edges(&node).first()?.clone();
                Some((node, first))
            })
            .collect()
    }

    /// Builds a configuration from an edge indicator vector: every edge with a
    /// non-zero value is chosen for its tail.
    pub fn from_indicator(indicator: &BTreeMap<Edge<N>, i64>) -> Self {
        indicator
            .iter()
            .filter(|(_, &value)| value != 0)
            .map(|(edge, _)| (edge.tail.clone(), edge.clone()))
            .collect()
    }

    /// Edge indicator vector: `1` for every chosen edge.
    pub fn to_indicator(&self) -> BTreeMap<Edge<N>, i64> {
        self.edges.values().map(|edge| (edge.clone(), 1)).collect()
    }

    /// Chosen edge of `node`.
    pub fn get(&self, node: &N) -> Option<&Edge<N>> {
        self.edges.get(node)
    }

    /// Points `node` at `edge`, returning the previous choice.
    ///
    /// No validation happens here; see [`RotorGraph::check_rotor_config`].
    pub fn set(&mut self, node: N, edge: Edge<N>) -> Option<Edge<N>> {
        self.edges.insert(node, edge)
    }

    /// Removes `node` from the configuration.
    pub fn remove(&mut self, node: &N) -> Option<Edge<N>> {
        self.edges.remove(node)
    }

    /// Entries in ascending node order.
    pub fn iter(&self) -> btree_map::Iter<'_, N, Edge<N>> {
        self.edges.iter()
    }

    /// Configured nodes in ascending order.
    pub fn nodes(&self) -> btree_map::Keys<'_, N, Edge<N>> {
        self.edges.keys()
    }

    /// Chosen edges in ascending tail order.
    pub fn edges(&self) -> btree_map::Values<'_, N, Edge<N>> {
        self.edges.values()
    }

    /// Number of configured nodes.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` if no node is configured.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// The chosen edges as a graph of their own. Keys are reassigned by the new
    /// graph and no sink is marked, so only nodes without a chosen edge are sinks.
    pub fn to_graph(&self) -> RotorGraph<N> {
        let mut graph = RotorGraph::new();
        for edge in self.edges.values() {
            graph.add_node(edge.tail.clone());
            graph.add_node(edge.head.clone());
        }
        for edge in self.edges.values() {
            graph.add_edge(edge.tail.clone(), edge.head.clone());
        }
        graph
    }

    /// Simple cycles of the configuration seen as a functional graph.
    ///
    /// Starting from each configured node not yet visited, the chain of chosen
    /// edges is followed until it reaches a node in `sinks`, a node outside the
    /// configuration, or a node already visited. If the chain closed on itself
    /// its tail end is the cycle. Cycles are node-disjoint.
    pub fn find_cycles(&self, sinks: &BTreeSet<N>) -> Vec<Vec<Edge<N>>> {
        let mut visited: BTreeSet<&N> = BTreeSet::new();
        let mut cycles = Vec::new();
        for start in self.edges.keys() {
            let mut chain: Vec<&Edge<N>> = Vec::new();
            let mut node = start;
            while !visited.contains(node) && !sinks.contains(node) {
                let Some(edge) = self.edges.get(node) else {
                    break;
                };
                visited.insert(node);
                chain.push(edge);
                node = &edge.head;
            }
            let Some(last) = chain.last() else {
                continue;
            };
            if let Some(pos) = chain.iter().position(|edge| edge.tail == last.head) {
                cycles.push(chain[pos..].iter().map(|&edge| edge.clone()).collect());
            }
        }
        cycles
    }

    /// Returns `true` when the configuration has no cycle.
    pub fn is_acyclic(&self, sinks: &BTreeSet<N>) -> bool {
        self.find_cycles(sinks).is_empty()
    }

    /// Turns the rotor of every node on `cycle` once.
    pub fn cycle_push(&mut self, graph: &RotorGraph<N>, cycle: &[Edge<N>]) -> RotorResult<(), N> {
        let turned = cycle
            .iter()
            .map(|edge| graph.turn(edge, 1))
            .collect::<RotorResult<Vec<_>, N>>()?;
        for edge in turned {
            self.edges.insert(edge.tail.clone(), edge);
        }
        Ok(())
    }

    /// Pops cycles until none is left, leaving the destination forest.
    ///
    /// Each round pushes every cycle found. The result does not depend on the
    /// order in which cycles are pushed. Returns the number of cycles pushed.
    /// Fails with [`RotorError::SinkUnreachable`] when a configured node cannot
    /// reach `sinks` in `graph`, since popping would then never stop.
    pub fn destination_forest(
        &mut self,
        graph: &RotorGraph<N>,
        sinks: &BTreeSet<N>,
    ) -> RotorResult<usize, N> {
        let reaching = graph.nodes_reaching(sinks);
        if let Some(stuck) = self
            .edges
            .keys()
            .find(|n| !sinks.contains(*n) && !reaching.contains(*n))
        {
            return Err(if sinks.is_empty() {
                RotorError::NoSink
            } else {
                RotorError::SinkUnreachable(stuck.clone())
            });
        }
        let mut pushed = 0;
        let mut rounds = 0_usize;
        loop {
            let cycles = self.find_cycles(sinks);
            if cycles.is_empty() {
                break;
            }
            rounds += 1;
            trace!(round = rounds, cycles = cycles.len(), "popping cycles");
            for cycle in &cycles {
                self.cycle_push(graph, cycle)?;
            }
            pushed += cycles.len();
        }
        debug!(rounds, pushed, "destination forest reached");
        Ok(pushed)
    }
}

impl<N: NodeKey> FromIterator<(N, Edge<N>)> for RotorConfig<N> {
    fn from_iter<I: IntoIterator<Item = (N, Edge<N>)>>(iter: I) -> Self {
        Self {
            edges: iter.into_iter().collect(),
        }
    }
}

impl<'a, N: NodeKey> IntoIterator for &'a RotorConfig<N> {
    type Item = (&'a N, &'a Edge<N>);
    type IntoIter = btree_map::Iter<'a, N, Edge<N>>;

    fn into_iter(self) -> Self::IntoIter {
        self.edges.iter()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn config(edges: &[(u32, u32, u32)]) -> RotorConfig<u32> {
        edges
            .iter()
            .map(|&(t, h, k)| (t, Edge::new(t, h, k)))
            .collect()
    }

    #[test]
    fn two_disjoint_two_cycles_are_found() {
        let rho = config(&[(1, 2, 0), (2, 1, 0), (3, 4, 0), (4, 3, 0)]);
        let cycles = rho.find_cycles(&BTreeSet::new());
        assert_eq!(
            cycles,
            vec![
                vec![Edge::new(1, 2, 0), Edge::new(2, 1, 0)],
                vec![Edge::new(3, 4, 0), Edge::new(4, 3, 0)],
            ]
        );
    }

    #[test]
    fn tails_leading_into_cycles_are_trimmed() {
        // 1 -> 2 -> 3 -> 4 -> 2, plus 5 -> 3 joining an already visited chain.
        let rho = config(&[(1, 2, 0), (2, 3, 0), (3, 4, 0), (4, 2, 0), (5, 3, 0)]);
        let cycles = rho.find_cycles(&BTreeSet::new());
        assert_eq!(
            cycles,
            vec![vec![Edge::new(2, 3, 0), Edge::new(3, 4, 0), Edge::new(4, 2, 0)]]
        );
    }

    #[test]
    fn chains_stop_at_sinks_and_foreign_nodes() {
        let rho = config(&[(1, 0, 0), (2, 1, 0), (3, 9, 0)]);
        assert!(rho.is_acyclic(&BTreeSet::from([0])));
        let self_loop = config(&[(1, 1, 0)]);
        assert_eq!(
            self_loop.find_cycles(&BTreeSet::new()),
            vec![vec![Edge::new(1, 1, 0)]]
        );
    }

    #[test]
    fn destination_forest_pops_until_acyclic() {
        let mut g = RotorGraph::new();
        for node in 1..=2 {
            g.add_edge(node, node + 1);
            g.add_edge(node, node - 1);
        }
        g.set_sink([0, 3]).unwrap();
        // 1 -> 2 and 2 -> 1 form a cycle; one push sends both outwards.
        let mut rho = config(&[(1, 2, 0), (2, 1, 0)]);
        let pushed = rho.destination_forest(&g, &g.sinks()).unwrap();
        assert_eq!(pushed, 1);
        assert_eq!(rho, config(&[(1, 0, 0), (2, 3, 0)]));
    }

    #[test]
    fn destination_forest_refuses_closed_classes() {
        let mut g = RotorGraph::new();
        g.add_edge(1, 2);
        g.add_edge(2, 1);
        g.add_edge(3, 0);
        let mut rho = RotorConfig::initial(&g);
        assert_eq!(
            rho.destination_forest(&g, &g.sinks()),
            Err(RotorError::SinkUnreachable(1))
        );
    }

    #[test]
    fn indicator_round_trip_and_subgraph() {
        let rho = config(&[(1, 0, 0), (2, 1, 1)]);
        assert_eq!(RotorConfig::from_indicator(&rho.to_indicator()), rho);
        let sub = rho.to_graph();
        assert_eq!(sub.edge_count(), 2);
        assert!(sub.contains_edge(&Edge::new(2, 1, 0)));
        assert_eq!(sub.sinks(), BTreeSet::from([0]));
    }
}
