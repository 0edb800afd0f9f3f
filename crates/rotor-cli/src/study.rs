// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Longest single-particle routing over every rotor configuration.
use std::cmp::Ordering;

use anyhow::Result;
use rotor_core::{RotorConfig, RouteOrder, Router};
use tracing::{debug, instrument};

use crate::config::Session;

/// Outcome of [`max_steps`].
#[derive(Debug, Default)]
pub struct MaxSteps {
    /// Largest step count seen.
    pub steps: u64,
    /// Start node and rotor configuration of every run reaching `steps`.
    pub witnesses: Vec<(u64, RotorConfig<u64>)>,
    /// Number of runs performed.
    pub runs: u64,
}

/// Routes one particle from every non-sink node under every rotor
/// configuration and keeps the longest runs.
#[instrument(level = "info", skip_all, fields(order = ?order))]
pub fn max_steps(session: &Session, order: RouteOrder) -> Result<MaxSteps> {
    let graph = &session.graph;
    let sinks = session.effective_sinks();
    let starts = graph.non_sink_nodes(&sinks);
    let mut best = MaxSteps::default();
    for config in graph.configurations(Some(&sinks)) {
        for &node in &starts {
            let mut router = Router::new(graph).with_sinks(&sinks).with_order(order);
            let (_, stats) = router.route_one_particle(&node, &config)?;
            best.runs += 1;
            match stats.steps().cmp(&best.steps) {
                Ordering::Greater => {
                    best.steps = stats.steps();
                    best.witnesses = vec![(node, config.clone())];
                }
                Ordering::Equal => best.witnesses.push((node, config.clone())),
                Ordering::Less => {}
            }
        }
    }
    debug!(runs = best.runs, steps = best.steps, "max-steps study finished");
    Ok(best)
}

/// Closed form of the maximum for a path with `n` interior nodes, each
/// having `left` edges to the left and `right` edges to the right, under
/// [`RouteOrder::MoveThenTurn`].
pub fn expected_max_steps(n: u64, left: u64, right: u64) -> u64 {
    if left == right {
        let x = left;
        if n % 2 == 0 {
            (x * n * n + n) / 2
        } else {
            (x * n * n - x + n + 1) / 2
        }
    } else {
        let m = left.min(right);
        (n + 2 * n * m).saturating_sub(2 * m)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use rotor_core::RotorGraph;

    use super::*;

    fn session(n: u64, left: u32, right: u32) -> Session {
        Session {
            graph: RotorGraph::weighted_path(n, left, right),
            sinks: None,
            shape: Some((n, u64::from(left), u64::from(right))),
        }
    }

    #[test]
    fn closed_form_matches_small_paths() {
        let table = [
            (2, 1, 1, 3),
            (3, 1, 1, 6),
            (4, 1, 1, 10),
            (2, 1, 2, 4),
            (3, 2, 1, 7),
            (4, 1, 2, 10),
            (2, 2, 2, 5),
            (3, 2, 2, 10),
            (4, 2, 2, 18),
            (1, 2, 1, 1),
        ];
        for (n, left, right, expected) in table {
            assert_eq!(expected_max_steps(n, left, right), expected, "n={n} x={left} y={right}");
        }
    }

    #[test]
    fn study_agrees_with_closed_form() {
        for (n, left, right) in [(1, 1, 1), (2, 1, 2), (3, 1, 1), (3, 2, 2)] {
            let result = max_steps(&session(n, left, right), RouteOrder::MoveThenTurn).unwrap();
            assert_eq!(
                result.steps,
                expected_max_steps(n, u64::from(left), u64::from(right))
            );
            assert!(!result.witnesses.is_empty());
        }
    }

    #[test]
    fn counts_every_start_and_configuration() {
        // Three interior nodes with two rotor positions each.
        let result = max_steps(&session(3, 1, 1), RouteOrder::MoveThenTurn).unwrap();
        assert_eq!(result.runs, 8 * 3);
    }
}
