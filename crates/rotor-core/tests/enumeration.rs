// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs, clippy::unwrap_used)]
//! Acyclic enumeration, recurrent classes and the matrix-tree count on the
//! built-in shapes.

use std::collections::BTreeSet;

use rotor_core::{BigInt, GridSinks, RotorGraph};

#[test]
fn grid_with_corner_sinks_matches_determinant() {
    let g = RotorGraph::grid(3, 3, GridSinks::Corners);
    let det = g.reduced_laplacian_matrix(None).determinant().unwrap();
    let count = g.acyclic_configurations(None).count();
    assert_eq!(BigInt::from(count), det);
    assert_eq!(count, 216);
}

#[test]
fn weighted_path_counts() {
    // Tridiagonal with diagonal x + y and off-diagonals -x, -y.
    let g = RotorGraph::weighted_path(3, 2, 1);
    let det = g.reduced_laplacian_matrix(None).determinant().unwrap();
    assert_eq!(det, BigInt::from(3 * (9 - 2) - 2 * 3));
    assert_eq!(g.enum_acyclic_configurations(None).len(), 15);
    assert_eq!(g.configurations(None).count(), 27);
}

#[test]
fn sink_override_changes_the_count() {
    let g = RotorGraph::simple_path(5);
    let middle = BTreeSet::from([2]);
    // Two independent one-node paths, each with two choices.
    assert_eq!(g.acyclic_configurations(Some(&middle)).count(), 4);
    assert_eq!(
        g.reduced_laplacian_matrix(Some(&middle)).determinant(),
        Some(BigInt::from(4))
    );
}

#[test]
fn cycle_push_class_shares_one_destination_forest() {
    let g = RotorGraph::weighted_path(3, 1, 1);
    let sinks = g.sinks();
    for recurrent in g.recurrent_configurations(None).unwrap() {
        let mut forest = recurrent.clone();
        forest.destination_forest(&g, &sinks).unwrap();
        let class = g.all_config_from_recurrent(&recurrent, None).unwrap();
        assert!(class.contains(&recurrent));
        assert!(class.contains(&forest));
        for member in &class {
            let mut reduced = member.clone();
            reduced.destination_forest(&g, &sinks).unwrap();
            assert_eq!(reduced, forest);
        }
    }
}

#[test]
fn recurrent_configurations_round_trip() {
    let g = RotorGraph::grid(2, 3, GridSinks::Corners);
    let acyclic = g.enum_acyclic_configurations(None);
    let recurrent = g.recurrent_configurations(None).unwrap();
    assert_eq!(acyclic.len(), recurrent.len());
    for (a, r) in acyclic.iter().zip(&recurrent) {
        assert_eq!(&g.acyclic_from_recurrent(r).unwrap(), a);
    }
}
