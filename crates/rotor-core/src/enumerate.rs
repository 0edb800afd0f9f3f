// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Enumeration of rotor configurations and the acyclic/recurrent bijection.
use std::collections::BTreeSet;
use std::iter::FusedIterator;

use rustc_hash::FxHashMap;
use tracing::{debug, instrument};

use crate::error::RotorResult;
use crate::graph::RotorGraph;
use crate::ident::NodeKey;
use crate::rotor::RotorConfig;
use crate::union_find::{Checkpoint, RollbackUnionFind};

/// Lazy stream of the acyclic rotor configurations of a graph.
///
/// Each non-sink node is a digit whose radix is its out-degree. Digits are
/// assigned depth-first in ascending node order; choosing the edge `u -> v`
/// is accepted only while `u` and `v` are not yet connected through earlier
/// choices, which is tracked by a [`RollbackUnionFind`]. Backtracking rolls
/// the union-find back to the checkpoint taken before the undone choice.
///
/// Every node picks exactly one out-edge, so an undirected cycle among the
/// chosen edges is always a directed one and the connectivity test rejects
/// exactly the configurations that contain a cycle. Configurations come out
/// in lexicographic order of rotor positions.
#[derive(Debug, Clone)]
pub struct AcyclicConfigs<'g, N> {
    graph: &'g RotorGraph<N>,
    nodes: Vec<N>,
    slots: FxHashMap<N, usize>,
    uf: RollbackUnionFind,
    choice: Vec<usize>,
    marks: Vec<Checkpoint>,
    next_try: usize,
    done: bool,
}

impl<'g, N: NodeKey> AcyclicConfigs<'g, N> {
    fn new(graph: &'g RotorGraph<N>, sinks: &BTreeSet<N>) -> Self {
        let slots: FxHashMap<N, usize> = graph
            .nodes()
            .enumerate()
            .map(|(slot, node)| (node.clone(), slot))
            .collect();
        Self {
            graph,
            nodes: graph.non_sink_nodes(sinks),
            uf: RollbackUnionFind::new(slots.len()),
            slots,
            choice: Vec::new(),
            marks: Vec::new(),
            next_try: 0,
            done: false,
        }
    }

    fn current(&self) -> RotorConfig<N> {
        self.nodes
            .iter()
            .zip(&self.choice)
            .filter_map(|(node, &pos)| {
                let edge = self.graph.out_edges(node).get(pos)?;
                Some((node.clone(), edge.clone()))
            })
            .collect()
    }

    fn backtrack(&mut self) {
        if let (Some(pos), Some(mark)) = (self.choice.pop(), self.marks.pop()) {
            self.uf.rollback(mark);
            self.next_try = pos + 1;
        }
    }
}

impl<N: NodeKey> Iterator for AcyclicConfigs<'_, N> {
    type Item = RotorConfig<N>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let depth = self.choice.len();
            let Some(node) = self.nodes.get(depth) else {
                let config = self.current();
                if self.nodes.is_empty() {
                    self.done = true;
                } else {
                    self.backtrack();
                }
                return Some(config);
            };
            let Some(edge) = self.graph.out_edges(node).get(self.next_try) else {
                if depth == 0 {
                    self.done = true;
                } else {
                    self.backtrack();
                }
                continue;
            };
            let (Some(&tail), Some(&head)) = (self.slots.get(&edge.tail), self.slots.get(&edge.head))
            else {
                self.next_try += 1;
                continue;
            };
            let mark = self.uf.checkpoint();
            if self.uf.union(tail, head) {
                self.choice.push(self.next_try);
                self.marks.push(mark);
                self.next_try = 0;
            } else {
                self.uf.rollback(mark);
                self.next_try += 1;
            }
        }
        None
    }
}

impl<N: NodeKey> FusedIterator for AcyclicConfigs<'_, N> {}

/// Lazy stream of every rotor configuration: a mixed-radix counter over the
/// non-sink nodes, last node varying fastest.
#[derive(Debug, Clone)]
pub struct AllConfigs<'g, N> {
    graph: &'g RotorGraph<N>,
    nodes: Vec<N>,
    digits: Vec<usize>,
    done: bool,
}

impl<N: NodeKey> Iterator for AllConfigs<'_, N> {
    type Item = RotorConfig<N>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let config = self
            .nodes
            .iter()
            .zip(&self.digits)
            .filter_map(|(node, &pos)| {
                let edge = self.graph.out_edges(node).get(pos)?;
                Some((node.clone(), edge.clone()))
            })
            .collect();
        self.done = true;
        for (node, digit) in self.nodes.iter().zip(&mut self.digits).rev() {
            *digit += 1;
            if *digit < self.graph.out_degree(node) {
                self.done = false;
                break;
            }
            *digit = 0;
        }
        Some(config)
    }
}

impl<N: NodeKey> FusedIterator for AllConfigs<'_, N> {}

impl<N: NodeKey> RotorGraph<N> {
    /// Lazily enumerates the acyclic configurations.
    ///
    /// `sinks` replaces the explicit sink marks for this enumeration. There
    /// are exactly `det(reduced Laplacian)` of them.
    pub fn acyclic_configurations(&self, sinks: Option<&BTreeSet<N>>) -> AcyclicConfigs<'_, N> {
        AcyclicConfigs::new(self, &self.effective_sinks(sinks))
    }

    /// All acyclic configurations, collected.
    #[instrument(level = "debug", skip_all)]
    pub fn enum_acyclic_configurations(&self, sinks: Option<&BTreeSet<N>>) -> Vec<RotorConfig<N>> {
        let configs: Vec<_> = self.acyclic_configurations(sinks).collect();
        debug!(count = configs.len(), "acyclic configurations enumerated");
        configs
    }

    /// Lazily enumerates every rotor configuration, acyclic or not.
    pub fn configurations(&self, sinks: Option<&BTreeSet<N>>) -> AllConfigs<'_, N> {
        let nodes = self.non_sink_nodes(&self.effective_sinks(sinks));
        AllConfigs {
            graph: self,
            digits: vec![0; nodes.len()],
            nodes,
            done: false,
        }
    }

    /// Turns every chosen edge once, mapping an acyclic configuration to its
    /// recurrent counterpart.
    pub fn recurrent_from_acyclic(&self, acyclic: &RotorConfig<N>) -> RotorResult<RotorConfig<N>, N> {
        acyclic
            .iter()
            .map(|(node, edge)| self.turn(edge, 1).map(|turned| (node.clone(), turned)))
            .collect()
    }

    /// Inverse of [`RotorGraph::recurrent_from_acyclic`].
    pub fn acyclic_from_recurrent(&self, recurrent: &RotorConfig<N>) -> RotorResult<RotorConfig<N>, N> {
        recurrent
            .iter()
            .map(|(node, edge)| {
                self.reverse_turn(edge, 1)
                    .map(|turned| (node.clone(), turned))
            })
            .collect()
    }

    /// The recurrent configurations, one per acyclic configuration and in the
    /// same order.
    pub fn recurrent_configurations(
        &self,
        sinks: Option<&BTreeSet<N>>,
    ) -> RotorResult<Vec<RotorConfig<N>>, N> {
        self.acyclic_configurations(sinks)
            .map(|acyclic| self.recurrent_from_acyclic(&acyclic))
            .collect()
    }

    /// Pairs every recurrent configuration with its destination forest.
    ///
    /// The forests are exactly the acyclic configurations, each appearing
    /// once.
    #[instrument(level = "debug", skip_all)]
    pub fn recurrent_and_acyclic(
        &self,
        sinks: Option<&BTreeSet<N>>,
    ) -> RotorResult<Vec<(RotorConfig<N>, RotorConfig<N>)>, N> {
        let sinks = self.effective_sinks(sinks);
        let mut pairs = Vec::new();
        for acyclic in self.acyclic_configurations(Some(&sinks)) {
            let recurrent = self.recurrent_from_acyclic(&acyclic)?;
            let mut forest = recurrent.clone();
            forest.destination_forest(self, &sinks)?;
            pairs.push((recurrent, forest));
        }
        debug!(count = pairs.len(), "recurrent configurations reduced");
        Ok(pairs)
    }

    /// Every configuration reachable from `recurrent` by pushing one cycle at
    /// a time, `recurrent` included.
    #[instrument(level = "debug", skip_all)]
    pub fn all_config_from_recurrent(
        &self,
        recurrent: &RotorConfig<N>,
        sinks: Option<&BTreeSet<N>>,
    ) -> RotorResult<BTreeSet<RotorConfig<N>>, N> {
        let sinks = self.effective_sinks(sinks);
        let mut seen = BTreeSet::from([recurrent.clone()]);
        let mut work = vec![recurrent.clone()];
        while let Some(config) = work.pop() {
            for cycle in config.find_cycles(&sinks) {
                let mut pushed = config.clone();
                pushed.cycle_push(self, &cycle)?;
                if seen.insert(pushed.clone()) {
                    work.push(pushed);
                }
            }
        }
        debug!(count = seen.len(), "cycle-push class explored");
        Ok(seen)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::ident::Edge;

    fn path(interior: u32) -> RotorGraph<u32> {
        let mut g = RotorGraph::new();
        for node in 1..=interior {
            g.add_edge(node, node - 1);
            g.add_edge(node, node + 1);
        }
        g
    }

    #[test]
    fn path_acyclic_configurations_are_left_right_splits() {
        let g = path(3);
        let configs = g.enum_acyclic_configurations(None);
        // Acyclic means no `i -> i+1` directly followed by `i+1 -> i`: some
        // prefix points left and the rest points right.
        assert_eq!(configs.len(), 4);
        let first = &configs[0];
        assert!(first.edges().all(|e| e.head < e.tail));
        let last = &configs[3];
        assert!(last.edges().all(|e| e.head > e.tail));
        assert!(configs.iter().all(|c| c.is_acyclic(&g.sinks())));
    }

    #[test]
    fn configurations_count_the_full_product() {
        let g = path(3);
        assert_eq!(g.configurations(None).count(), 8);
        let empty: RotorGraph<u32> = RotorGraph::new();
        assert_eq!(empty.configurations(None).count(), 1);
        assert_eq!(empty.acyclic_configurations(None).count(), 1);
    }

    #[test]
    fn self_loops_are_never_chosen() {
        let mut g = RotorGraph::new();
        g.add_edge(1, 1);
        g.add_edge(1, 0);
        g.add_edge(1, 1);
        let configs = g.enum_acyclic_configurations(None);
        assert_eq!(
            configs,
            vec![[(1, Edge::new(1, 0, 0))].into_iter().collect::<RotorConfig<u32>>()]
        );
    }

    #[test]
    fn closed_graph_has_no_acyclic_configuration() {
        let mut g = RotorGraph::new();
        g.add_edge(0, 1);
        g.add_edge(1, 0);
        assert_eq!(g.acyclic_configurations(None).count(), 0);
        assert_eq!(
            g.reduced_laplacian_matrix(None).determinant(),
            Some(num_bigint::BigInt::from(0))
        );
    }

    #[test]
    fn recurrent_pairs_reduce_to_every_acyclic_configuration() {
        let g = path(3);
        let pairs = g.recurrent_and_acyclic(None).unwrap();
        let forests: BTreeSet<_> = pairs.iter().map(|(_, f)| f.clone()).collect();
        let acyclic: BTreeSet<_> = g.acyclic_configurations(None).collect();
        assert_eq!(pairs.len(), 4);
        assert_eq!(forests, acyclic);
        for (recurrent, _) in &pairs {
            let back = g.acyclic_from_recurrent(recurrent).unwrap();
            assert_eq!(g.recurrent_from_acyclic(&back).unwrap(), *recurrent);
        }
    }

    #[test]
    fn cycle_push_class_of_two_cycle() {
        // 1 <-> 2 between sinks 0 and 3, both pointing inwards.
        let g = path(2);
        let start: RotorConfig<u32> = [(1, Edge::new(1, 2, 0)), (2, Edge::new(2, 1, 0))]
            .into_iter()
            .collect();
        let class = g.all_config_from_recurrent(&start, None).unwrap();
        let popped: RotorConfig<u32> = [(1, Edge::new(1, 0, 0)), (2, Edge::new(2, 3, 0))]
            .into_iter()
            .collect();
        assert_eq!(class, BTreeSet::from([start, popped]));
    }
}
