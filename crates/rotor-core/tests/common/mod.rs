// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared fixtures and proptest strategies for rotor-core integration tests.
#![allow(dead_code)]

use proptest::prelude::*;
use rotor_core::{ParticleConfig, RotorConfig, RotorGraph};

/// Upper bound on nodes in generated graphs; keeps enumeration cheap.
pub const MAX_NODES: u32 = 5;

/// Small random multigraph over `0..n` where node 0 is the only sink.
///
/// Every node `i > 0` has one edge to some node below it (inserted at a
/// random position of its rotor order) plus up to two arbitrary extra edges,
/// self-loops and parallel edges included. Every node therefore reaches the
/// sink.
pub fn rotor_graph() -> impl Strategy<Value = RotorGraph<u32>> {
    (2_u32..=MAX_NODES).prop_flat_map(|n| {
        (1..n)
            .map(move |i| (prop::collection::vec(0..n, 0..=2), 0..i, 0_usize..=2))
            .collect::<Vec<_>>()
            .prop_map(move |nodes| build_graph(n, nodes))
    })
}

fn build_graph(n: u32, nodes: Vec<(Vec<u32>, u32, usize)>) -> RotorGraph<u32> {
    let mut graph = RotorGraph::new();
    for node in 0..n {
        graph.add_node(node);
    }
    for (tail, (mut heads, down, pos)) in (1..n).zip(nodes) {
        let pos = pos.min(heads.len());
        heads.insert(pos, down);
        for head in heads {
            graph.add_edge(tail, head);
        }
    }
    graph
}

/// Graph plus per-node seeds for rotor positions and particle counts.
pub fn graph_with_state() -> impl Strategy<Value = (RotorGraph<u32>, Vec<u8>, Vec<i64>)> {
    rotor_graph().prop_flat_map(|graph| {
        let n = graph.node_count();
        (
            Just(graph),
            prop::collection::vec(any::<u8>(), n),
            prop::collection::vec(-3_i64..=3, n),
        )
    })
}

/// Rotor configuration choosing, at node `i`, the edge `seeds[i] mod degree`.
pub fn rotated(graph: &RotorGraph<u32>, seeds: &[u8]) -> RotorConfig<u32> {
    let mut rotors = RotorConfig::initial(graph);
    let nodes: Vec<u32> = rotors.nodes().copied().collect();
    for node in nodes {
        let edges = graph.out_edges(&node);
        let seed = seeds.get(node as usize).copied().unwrap_or(0);
        let edge = edges[usize::from(seed) % edges.len()];
        rotors.set(node, edge);
    }
    rotors
}

/// Particle configuration with `counts[i]` at node `i`.
pub fn particles(graph: &RotorGraph<u32>, counts: &[i64]) -> ParticleConfig<u32> {
    graph
        .nodes()
        .zip(counts.iter().copied().chain(std::iter::repeat(0)))
        .map(|(&node, k)| (node, k))
        .collect()
}

/// Path `0 - 1 - 2` whose interior node points right first.
pub fn right_first_path() -> RotorGraph<u32> {
    let mut graph = RotorGraph::new();
    graph.add_edge(1, 2);
    graph.add_edge(1, 0);
    graph
}
