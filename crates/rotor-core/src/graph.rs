// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Rotor graph topology store.
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{RotorError, RotorResult};
use crate::ident::{Edge, NodeKey};
use crate::laplacian::Laplacian;
use crate::rotor::RotorConfig;

/// Cyclic order of a node's outgoing edges together with its position index.
///
/// The sequence and the `edge -> position` index live in one value and every
/// mutation rebuilds both, so a lookup through the index always agrees with
/// the sequence.
#[derive(Debug, Clone)]
pub struct RotorOrder<N> {
    edges: Vec<Edge<N>>,
    index: FxHashMap<Edge<N>, usize>,
}

impl<N: NodeKey> RotorOrder<N> {
    fn from_edges(edges: Vec<Edge<N>>) -> Self {
        let index = edges
            .iter()
            .enumerate()
            .map(|(pos, edge)| (edge.clone(), pos))
            .collect();
        Self { edges, index }
    }

    fn push(&mut self, edge: Edge<N>) {
        self.index.insert(edge.clone(), self.edges.len());
        self.edges.push(edge);
    }

    fn remove(&mut self, edge: &Edge<N>) -> bool {
        let Some(pos) = self.index.remove(edge) else {
            return false;
        };
        self.edges.remove(pos);
        for (shifted, moved) in self.edges.iter().enumerate().skip(pos) {
            self.index.insert(moved.clone(), shifted);
        }
        true
    }

    fn reverse(&mut self) {
        self.edges.reverse();
        let len = self.edges.len();
        for pos in self.index.values_mut() {
            *pos = len - 1 - *pos;
        }
    }

    /// Edges in rotor order.
    pub fn edges(&self) -> &[Edge<N>] {
        &self.edges
    }

    /// Position of `edge` in the order, if it belongs to it.
    pub fn position(&self, edge: &Edge<N>) -> Option<usize> {
        self.index.get(edge).copied()
    }

    /// Number of edges in the order (the node's out-degree).
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` when the node has no outgoing edge.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Edge `k` positions after `edge`, cyclically; `k` may be negative.
    fn offset(&self, edge: &Edge<N>, k: i64) -> Option<&Edge<N>> {
        let pos = self.position(edge)?;
        let len = self.edges.len();
        let modulus = i64::try_from(len).ok()?;
        let shift = usize::try_from(k.rem_euclid(modulus)).ok()?;
        self.edges.get((pos + shift) % len)
    }
}

/// Directed multigraph with a rotor order on every node and a set of sinks.
///
/// A node with no outgoing edge is always a sink (an *implicit* sink); other
/// nodes become sinks when marked with [`RotorGraph::set_sink`]. Mutating the
/// topology needs `&mut self`, so no routing or enumeration borrowing the
/// graph can observe a half-updated rotor order.
#[derive(Debug, Clone)]
pub struct RotorGraph<N> {
    nodes: BTreeSet<N>,
    rotors: BTreeMap<N, RotorOrder<N>>,
    sinks: BTreeSet<N>,
}

impl<N: NodeKey> Default for RotorGraph<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: NodeKey> RotorGraph<N> {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            nodes: BTreeSet::new(),
            rotors: BTreeMap::new(),
            sinks: BTreeSet::new(),
        }
    }

    /// Adds `node`; returns `false` if it was already present.
    pub fn add_node(&mut self, node: N) -> bool {
        self.nodes.insert(node)
    }

    /// Adds a directed edge `tail -> head` and returns its key.
    ///
    /// Missing endpoints are added. The edge is appended to the end of the
    /// tail's rotor order.
    pub fn add_edge(&mut self, tail: N, head: N) -> u32 {
        self.nodes.insert(tail.clone());
        self.nodes.insert(head.clone());
        let order = self
            .rotors
            .entry(tail.clone())
            .or_insert_with(|| RotorOrder::from_edges(Vec::new()));
        let used: BTreeSet<u32> = order
            .edges
            .iter()
            .filter(|edge| edge.head == head)
            .map(|edge| edge.key)
            .collect();
        let key = (0..).find(|k| !used.contains(k)).unwrap_or_default();
        order.push(Edge::new(tail, head, key));
        key
    }

    /// Removes `edge` from the graph and from its tail's rotor order.
    ///
    /// A node left without outgoing edges becomes an implicit sink.
    pub fn remove_edge(&mut self, edge: &Edge<N>) -> RotorResult<(), N> {
        let order = self
            .rotors
            .get_mut(&edge.tail)
            .ok_or_else(|| RotorError::UnknownEdge(edge.clone()))?;
        if !order.remove(edge) {
            return Err(RotorError::UnknownEdge(edge.clone()));
        }
        if order.is_empty() {
            self.rotors.remove(&edge.tail);
            debug!(node = ?edge.tail, "node lost its last out-edge and is now a sink");
        }
        Ok(())
    }

    /// Marks `nodes` as sinks. Fails without marking anything if one of them
    /// is unknown.
    pub fn set_sink<I>(&mut self, nodes: I) -> RotorResult<(), N>
    where
        I: IntoIterator<Item = N>,
    {
        let nodes: Vec<N> = nodes.into_iter().collect();
        if let Some(missing) = nodes.iter().find(|n| !self.nodes.contains(*n)) {
            return Err(RotorError::UnknownNode(missing.clone()));
        }
        self.sinks.extend(nodes);
        Ok(())
    }

    /// Adds `nodes` where missing and marks them as sinks. Cannot fail.
    pub(crate) fn add_sinks<I>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = N>,
    {
        for node in nodes {
            self.add_node(node.clone());
            self.sinks.insert(node);
        }
    }

    /// Removes the explicit sink mark from `nodes`.
    ///
    /// A node without outgoing edges stays a sink regardless.
    pub fn unset_sink<'a, I>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = &'a N>,
        N: 'a,
    {
        for node in nodes {
            self.sinks.remove(node);
        }
    }

    /// Nodes explicitly marked as sinks.
    pub fn explicit_sinks(&self) -> &BTreeSet<N> {
        &self.sinks
    }

    /// Effective sinks: explicit sinks plus nodes without outgoing edges.
    pub fn sinks(&self) -> BTreeSet<N> {
        self.effective_sinks(None)
    }

    /// Effective sinks when `explicit` replaces the graph's own sink marks.
    ///
    /// Nodes without outgoing edges are sinks in every case.
    pub fn effective_sinks(&self, explicit: Option<&BTreeSet<N>>) -> BTreeSet<N> {
        let mut sinks = explicit.unwrap_or(&self.sinks).clone();
        sinks.extend(self.nodes.iter().filter(|n| self.out_degree(n) == 0).cloned());
        sinks
    }

    /// Returns `true` if `node` is an effective sink of the graph.
    pub fn is_sink(&self, node: &N) -> bool {
        self.sinks.contains(node) || self.out_degree(node) == 0
    }

    /// Nodes that carry a rotor: not in `sinks` and with at least one out-edge.
    pub fn non_sink_nodes(&self, sinks: &BTreeSet<N>) -> Vec<N> {
        self.rotors
            .keys()
            .filter(|n| !sinks.contains(*n))
            .cloned()
            .collect()
    }

    /// All nodes in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.nodes.iter()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All edges, grouped by tail (ascending) and in rotor order within a tail.
    pub fn edges(&self) -> impl Iterator<Item = &Edge<N>> {
        self.rotors.values().flat_map(|order| order.edges.iter())
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.rotors.values().map(RotorOrder::len).sum()
    }

    /// Returns `true` if `node` is part of the graph.
    pub fn contains_node(&self, node: &N) -> bool {
        self.nodes.contains(node)
    }

    /// Returns `true` if `edge` is part of the graph.
    pub fn contains_edge(&self, edge: &Edge<N>) -> bool {
        self.rotors
            .get(&edge.tail)
            .is_some_and(|order| order.position(edge).is_some())
    }

    /// Number of edges leaving `node` (0 for unknown nodes).
    pub fn out_degree(&self, node: &N) -> usize {
        self.rotors.get(node).map_or(0, RotorOrder::len)
    }

    /// Outgoing edges of `node` in rotor order.
    pub fn out_edges(&self, node: &N) -> &[Edge<N>] {
        self.rotors.get(node).map_or(&[], RotorOrder::edges)
    }

    /// Rotor order of `node`, if it has outgoing edges.
    pub fn rotor_order(&self, node: &N) -> Option<&RotorOrder<N>> {
        self.rotors.get(node)
    }

    /// Number of parallel edges `from -> to`.
    pub fn edge_multiplicity(&self, from: &N, to: &N) -> usize {
        self.out_edges(from).iter().filter(|e| &e.head == to).count()
    }

    /// Returns `true` if at least one edge `from -> to` exists.
    pub fn has_edge_between(&self, from: &N, to: &N) -> bool {
        self.out_edges(from).iter().any(|e| &e.head == to)
    }

    /// Head of `edge`, if the edge belongs to the graph.
    pub fn head<'a>(&self, edge: &'a Edge<N>) -> RotorResult<&'a N, N> {
        self.require_edge(edge)?;
        Ok(&edge.head)
    }

    /// Tail of `edge`, if the edge belongs to the graph.
    pub fn tail<'a>(&self, edge: &'a Edge<N>) -> RotorResult<&'a N, N> {
        self.require_edge(edge)?;
        Ok(&edge.tail)
    }

    fn require_edge(&self, edge: &Edge<N>) -> RotorResult<(), N> {
        if self.contains_edge(edge) {
            Ok(())
        } else {
            Err(RotorError::UnknownEdge(edge.clone()))
        }
    }

    /// Replaces the rotor order of every node listed in `new_order`.
    ///
    /// Validation covers the whole map before anything changes: each node must
    /// exist, each edge must belong to the graph and be tailed at its node, and
    /// each list must name every outgoing edge exactly once.
    pub fn set_rotor_order(&mut self, new_order: BTreeMap<N, Vec<Edge<N>>>) -> RotorResult<(), N> {
        for (node, edges) in &new_order {
            if !self.nodes.contains(node) {
                return Err(RotorError::UnknownNode(node.clone()));
            }
            let mut seen = BTreeSet::new();
            for edge in edges {
                self.require_edge(edge)?;
                if &edge.tail != node {
                    return Err(RotorError::TailMismatch {
                        node: node.clone(),
                        edge: edge.clone(),
                    });
                }
                if !seen.insert(edge) {
                    return Err(RotorError::DuplicateRotorEdge {
                        node: node.clone(),
                        edge: edge.clone(),
                    });
                }
            }
            let expected = self.out_degree(node);
            if seen.len() != expected {
                return Err(RotorError::IncompleteRotorOrder {
                    node: node.clone(),
                    expected,
                    found: seen.len(),
                });
            }
        }
        for (node, edges) in new_order {
            if !edges.is_empty() {
                self.rotors.insert(node, RotorOrder::from_edges(edges));
            }
        }
        Ok(())
    }

    /// Reverses the rotor order of every node.
    pub fn invert_rotor_order(&mut self) {
        for order in self.rotors.values_mut() {
            order.reverse();
        }
    }

    /// Edge `k` positions after `edge` in its tail's rotor order.
    ///
    /// Negative `k` walks backwards. The edge is returned unchanged when the
    /// order has a single edge or `k` is a multiple of its length.
    pub fn turn(&self, edge: &Edge<N>, k: i64) -> RotorResult<Edge<N>, N> {
        self.rotors
            .get(&edge.tail)
            .and_then(|order| order.offset(edge, k))
            .cloned()
            .ok_or_else(|| RotorError::UnknownEdge(edge.clone()))
    }

    /// Inverse of [`RotorGraph::turn`]: `turn(reverse_turn(e, k), k) == e`.
    pub fn reverse_turn(&self, edge: &Edge<N>, k: i64) -> RotorResult<Edge<N>, N> {
        // Reduce first: `-i64::MIN` does not exist.
        let len = i64::try_from(self.out_degree(&edge.tail))
            .unwrap_or(i64::MAX)
            .max(1);
        self.turn(edge, -(k.rem_euclid(len)))
    }

    /// Checks that `config` only maps graph nodes to graph edges tailed at them.
    pub fn check_rotor_config(&self, config: &RotorConfig<N>) -> RotorResult<(), N> {
        for (node, edge) in config.iter() {
            if !self.nodes.contains(node) {
                return Err(RotorError::UnknownNode(node.clone()));
            }
            self.require_edge(edge)?;
            if &edge.tail != node {
                return Err(RotorError::TailMismatch {
                    node: node.clone(),
                    edge: edge.clone(),
                });
            }
        }
        Ok(())
    }

    /// Laplacian with a row per non-sink node and a column per node.
    pub fn laplacian_matrix(&self, sinks: Option<&BTreeSet<N>>) -> Laplacian<N> {
        Laplacian::full(self, &self.effective_sinks(sinks))
    }

    /// Laplacian restricted to non-sink nodes in both dimensions.
    pub fn reduced_laplacian_matrix(&self, sinks: Option<&BTreeSet<N>>) -> Laplacian<N> {
        Laplacian::reduced(self, &self.effective_sinks(sinks))
    }

    /// Nodes from which some node of `targets` can be reached (targets included).
    pub fn nodes_reaching(&self, targets: &BTreeSet<N>) -> BTreeSet<N> {
        let mut predecessors: BTreeMap<&N, Vec<&N>> = BTreeMap::new();
        for edge in self.edges() {
            predecessors.entry(&edge.head).or_default().push(&edge.tail);
        }
        let mut reached: BTreeSet<N> = targets.clone();
        let mut queue: VecDeque<&N> = targets.iter().collect();
        while let Some(node) = queue.pop_front() {
            for &pred in predecessors.get(node).into_iter().flatten() {
                if reached.insert(pred.clone()) {
                    queue.push_back(pred);
                }
            }
        }
        reached
    }

    /// Nodes reachable from `starts`, without leaving through a node in `stop`.
    pub fn reachable_from<'a, I>(&self, starts: I, stop: &BTreeSet<N>) -> BTreeSet<N>
    where
        I: IntoIterator<Item = &'a N>,
        N: 'a,
    {
        let mut reached = BTreeSet::new();
        let mut queue = VecDeque::new();
        for start in starts {
            if reached.insert(start.clone()) {
                queue.push_back(start.clone());
            }
        }
        while let Some(node) = queue.pop_front() {
            if stop.contains(&node) {
                continue;
            }
            for edge in self.out_edges(&node) {
                if reached.insert(edge.head.clone()) {
                    queue.push_back(edge.head.clone());
                }
            }
        }
        reached
    }

    /// Fails with [`RotorError::SinkUnreachable`] if some node reachable from
    /// `starts` cannot reach any of `sinks`.
    pub(crate) fn ensure_sinks_reachable<'a, I>(
        &self,
        starts: I,
        sinks: &BTreeSet<N>,
    ) -> RotorResult<(), N>
    where
        I: IntoIterator<Item = &'a N>,
        N: 'a,
    {
        if sinks.is_empty() {
            return Err(RotorError::NoSink);
        }
        let reaching = self.nodes_reaching(sinks);
        match self
            .reachable_from(starts, sinks)
            .into_iter()
            .find(|node| !reaching.contains(node))
        {
            Some(stuck) => Err(RotorError::SinkUnreachable(stuck)),
            None => Ok(()),
        }
    }
}
