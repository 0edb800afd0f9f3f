// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ready-made graph shapes over `u64` nodes.
//!
//! Every builder adds edges in a fixed order, so the default rotor order of
//! each node is part of the shape's contract.
use crate::graph::RotorGraph;

/// Which nodes of a grid become sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GridSinks {
    /// No node is marked; the caller picks sinks later.
    #[default]
    None,
    /// The four corner nodes.
    Corners,
}

impl RotorGraph<u64> {
    /// Path `0 - 1 - ... - (n-1)` with sinks at both ends.
    ///
    /// Every interior node points left first, then right. Paths shorter than
    /// three nodes have no interior, so every node is an implicit sink.
    pub fn simple_path(n: u64) -> Self {
        let mut graph = Self::new();
        for node in 0..n {
            graph.add_node(node);
        }
        for node in 1..n.saturating_sub(1) {
            graph.add_edge(node, node - 1);
            graph.add_edge(node, node + 1);
        }
        graph
    }

    /// Path with `n` interior nodes `1..=n` between sinks `0` and `n + 1`.
    ///
    /// Each interior node has `left` parallel edges to its left neighbour
    /// followed by `right` parallel edges to its right neighbour. A node with
    /// `left + right == 0` is an implicit sink.
    pub fn weighted_path(n: u64, left: u32, right: u32) -> Self {
        let mut graph = Self::new();
        for node in 0..n.saturating_add(2) {
            graph.add_node(node);
        }
        for node in 1..=n {
            for _ in 0..left {
                graph.add_edge(node, node - 1);
            }
            for _ in 0..right {
                graph.add_edge(node, node + 1);
            }
        }
        graph
    }

    /// `rows x cols` grid, node `r * cols + c`, edges to the four neighbours
    /// in the order up, right, down, left.
    pub fn grid(rows: u64, cols: u64, sinks: GridSinks) -> Self {
        let mut graph = Self::new();
        for node in 0..rows.saturating_mul(cols) {
            graph.add_node(node);
        }
        for r in 0..rows {
            for c in 0..cols {
                let node = r * cols + c;
                if r > 0 {
                    graph.add_edge(node, node - cols);
                }
                if c + 1 < cols {
                    graph.add_edge(node, node + 1);
                }
                if r + 1 < rows {
                    graph.add_edge(node, node + cols);
                }
                if c > 0 {
                    graph.add_edge(node, node - 1);
                }
            }
        }
        if sinks == GridSinks::Corners && rows > 0 && cols > 0 {
            let last = rows * cols - 1;
            let corners = [0, cols - 1, last - (cols - 1), last];
            // Corners coincide on degenerate grids.
            graph.add_sinks(corners);
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::ident::Edge;

    #[test]
    fn simple_path_points_left_first() {
        let g = RotorGraph::simple_path(5);
        assert_eq!(g.node_count(), 5);
        assert_eq!(g.sinks(), BTreeSet::from([0, 4]));
        assert_eq!(g.out_edges(&2), &[Edge::new(2, 1, 0), Edge::new(2, 3, 0)]);
        assert_eq!(RotorGraph::simple_path(2).sinks(), BTreeSet::from([0, 1]));
    }

    #[test]
    fn weighted_path_has_parallel_edges() {
        let g = RotorGraph::weighted_path(2, 1, 2);
        assert_eq!(g.sinks(), BTreeSet::from([0, 3]));
        assert_eq!(g.out_degree(&1), 3);
        assert_eq!(g.edge_multiplicity(&2, &3), 2);
        assert_eq!(
            g.out_edges(&1),
            &[Edge::new(1, 0, 0), Edge::new(1, 2, 0), Edge::new(1, 2, 1)]
        );
    }

    #[test]
    fn grid_orders_up_right_down_left() {
        let g = RotorGraph::grid(3, 3, GridSinks::Corners);
        assert_eq!(
            g.out_edges(&4),
            &[
                Edge::new(4, 1, 0),
                Edge::new(4, 5, 0),
                Edge::new(4, 7, 0),
                Edge::new(4, 3, 0)
            ]
        );
        assert_eq!(g.out_edges(&0), &[Edge::new(0, 1, 0), Edge::new(0, 3, 0)]);
        assert_eq!(g.sinks(), BTreeSet::from([0, 2, 6, 8]));
        assert!(RotorGraph::grid(2, 2, GridSinks::None).sinks().is_empty());
    }

    #[test]
    fn degenerate_grids_mark_shared_corners_once() {
        let row = RotorGraph::grid(1, 3, GridSinks::Corners);
        assert_eq!(row.explicit_sinks(), &BTreeSet::from([0, 2]));
        assert_eq!(row.node_count(), 3);
        let single = RotorGraph::grid(1, 1, GridSinks::Corners);
        assert_eq!(single.explicit_sinks(), &BTreeSet::from([0]));
        assert_eq!(single.node_count(), 1);
        assert!(RotorGraph::grid(0, 3, GridSinks::Corners).explicit_sinks().is_empty());
    }
}
