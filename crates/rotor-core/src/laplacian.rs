// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph Laplacians keyed by node.
use std::collections::{BTreeMap, BTreeSet};

use num_bigint::BigInt;

use crate::graph::RotorGraph;
use crate::ident::NodeKey;

/// Laplacian matrix stored densely as `row -> column -> entry`.
///
/// Rows are the non-sink nodes. The diagonal holds the out-degree minus the
/// number of self-loops, and `L[u][v]` for `u != v` is minus the number of
/// edges `u -> v`. Firing every edge of `u` once changes a particle vector by
/// `-L[u]`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[cfg_attr(
    feature = "serde",
    serde(bound(deserialize = "N: serde::Deserialize<'de> + Ord"))
)]
pub struct Laplacian<N> {
    rows: BTreeMap<N, BTreeMap<N, i64>>,
}

impl<N: NodeKey> Laplacian<N> {
    /// Rows for the non-sink nodes, columns for every node of `graph`.
    pub(crate) fn full(graph: &RotorGraph<N>, sinks: &BTreeSet<N>) -> Self {
        let columns: Vec<&N> = graph.nodes().collect();
        Self::build(graph, sinks, &columns)
    }

    /// Rows and columns for the non-sink nodes only.
    pub(crate) fn reduced(graph: &RotorGraph<N>, sinks: &BTreeSet<N>) -> Self {
        let columns: Vec<&N> = graph.nodes().filter(|n| !sinks.contains(*n)).collect();
        Self::build(graph, sinks, &columns)
    }

    fn build(graph: &RotorGraph<N>, sinks: &BTreeSet<N>, columns: &[&N]) -> Self {
        let rows = graph
            .nodes()
            .filter(|u| !sinks.contains(*u))
            .map(|u| {
                let mut row: BTreeMap<N, i64> =
                    columns.iter().map(|&v| (v.clone(), 0)).collect();
                for edge in graph.out_edges(u) {
                    if let Some(entry) = row.get_mut(u) {
                        *entry += 1;
                    }
                    if let Some(entry) = row.get_mut(&edge.head) {
                        *entry -= 1;
                    }
                }
                (u.clone(), row)
            })
            .collect();
        Self { rows }
    }

    /// Entry at `(u, v)`; 0 outside the matrix.
    pub fn get(&self, u: &N, v: &N) -> i64 {
        self.rows
            .get(u)
            .and_then(|row| row.get(v))
            .copied()
            .unwrap_or(0)
    }

    /// Row of `u`, if `u` is a row of the matrix.
    pub fn row(&self, u: &N) -> Option<&BTreeMap<N, i64>> {
        self.rows.get(u)
    }

    /// Rows in ascending node order.
    pub fn rows(&self) -> impl Iterator<Item = (&N, &BTreeMap<N, i64>)> {
        self.rows.iter()
    }

    /// `(row count, column count)`.
    pub fn dimension(&self) -> (usize, usize) {
        let cols = self.rows.values().next().map_or(0, BTreeMap::len);
        (self.rows.len(), cols)
    }

    /// Underlying map.
    pub fn as_map(&self) -> &BTreeMap<N, BTreeMap<N, i64>> {
        &self.rows
    }

    /// Exact determinant by fraction-free (Bareiss) elimination.
    ///
    /// Returns `None` when the matrix is not square or its rows and columns
    /// are not indexed by the same nodes. The empty matrix has determinant 1.
    /// For the reduced Laplacian this is the number of acyclic rotor
    /// configurations, which outgrows every fixed-width integer on modest
    /// grids.
    pub fn determinant(&self) -> Option<BigInt> {
        let order: Vec<&N> = self.rows.keys().collect();
        let mut m: Vec<Vec<BigInt>> = Vec::with_capacity(order.len());
        for row in self.rows.values() {
            if row.len() != order.len() || !order.iter().all(|n| row.contains_key(*n)) {
                return None;
            }
            m.push(order.iter().map(|n| BigInt::from(row[*n])).collect());
        }
        Some(bareiss(m))
    }
}

fn bareiss(mut m: Vec<Vec<BigInt>>) -> BigInt {
    let zero = BigInt::from(0);
    let n = m.len();
    let mut negate = false;
    let mut prev = BigInt::from(1);
    for k in 0..n {
        if m[k][k] == zero {
            let Some(swap) = (k + 1..n).find(|&i| m[i][k] != zero) else {
                return zero;
            };
            m.swap(k, swap);
            negate = !negate;
        }
        for i in k + 1..n {
            for j in k + 1..n {
                // Exact: Bareiss keeps every entry a minor of the input.
                let entry = (&m[i][j] * &m[k][k] - &m[i][k] * &m[k][j]) / &prev;
                m[i][j] = entry;
            }
        }
        prev = m[k][k].clone();
    }
    // The last pivot is the determinant up to the sign of the row swaps.
    if negate {
        -prev
    } else {
        prev
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn path_with_middle_loop() -> RotorGraph<u32> {
        let mut g = RotorGraph::new();
        for node in 1..=3 {
            g.add_edge(node, node - 1);
            g.add_edge(node, node + 1);
        }
        g.add_edge(2, 2);
        g.add_edge(2, 3);
        g
    }

    #[test]
    fn entries_count_multiplicity_and_self_loops() {
        let g = path_with_middle_loop();
        let l = g.laplacian_matrix(None);
        assert_eq!(l.dimension(), (3, 5));
        // Out-degree 4 at node 2, one of them a self-loop.
        assert_eq!(l.get(&2, &2), 3);
        assert_eq!(l.get(&2, &3), -2);
        assert_eq!(l.get(&2, &1), -1);
        assert_eq!(l.get(&1, &0), -1);
        assert_eq!(l.get(&0, &0), 0);
        let row_sum: i64 = l.row(&2).map(|r| r.values().sum()).unwrap_or_default();
        assert_eq!(row_sum, 0);
    }

    #[test]
    fn reduced_determinant_of_path() {
        // Interior of a path with n nodes: tridiagonal [2, -1], det = n + 1.
        let mut g = RotorGraph::new();
        for node in 1..=4 {
            g.add_edge(node, node - 1);
            g.add_edge(node, node + 1);
        }
        let l = g.reduced_laplacian_matrix(None);
        assert_eq!(l.dimension(), (4, 4));
        assert_eq!(l.determinant(), Some(BigInt::from(5)));
        assert_eq!(g.laplacian_matrix(None).determinant(), None);
    }

    #[test]
    fn determinant_handles_pivoting_and_empty() {
        let empty: Laplacian<u8> = Laplacian {
            rows: BTreeMap::new(),
        };
        assert_eq!(empty.determinant(), Some(BigInt::from(1)));
        let swapped = Laplacian {
            rows: BTreeMap::from([
                (0_u8, BTreeMap::from([(0, 0), (1, 2)])),
                (1, BTreeMap::from([(0, 3), (1, 1)])),
            ]),
        };
        assert_eq!(swapped.determinant(), Some(BigInt::from(-6)));
        let g = path_with_middle_loop();
        // [[2,-1,0],[-1,3,-2],[0,-1,2]] -> 2*(6-2) + 1*(-2) = 6
        assert_eq!(
            g.reduced_laplacian_matrix(None).determinant(),
            Some(BigInt::from(6))
        );
    }

    #[test]
    fn large_grid_determinant_is_exact() {
        use crate::builders::GridSinks;
        let g = RotorGraph::grid(11, 11, GridSinks::Corners);
        let det = g.reduced_laplacian_matrix(None).determinant().unwrap();
        assert!(det > BigInt::from(i128::MAX));
        let expected: BigInt = "531211842227292031795877941559192899165556129560264704"
            .parse()
            .unwrap();
        assert_eq!(det, expected);
    }
}
