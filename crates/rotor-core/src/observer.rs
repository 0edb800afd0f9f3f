// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Observer hooks for routing runs and the statistics collector built on them.
use std::collections::{BTreeMap, BTreeSet};

use crate::graph::RotorGraph;
use crate::ident::{Edge, NodeKey};
use crate::particle::ParticleConfig;
use crate::rotor::RotorConfig;

/// Direction of a routing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StepKind {
    /// A particle moved from `node` along `edge`.
    Particle,
    /// A unit of debt moved from `node` to the head of `edge`.
    Antiparticle,
}

/// One firing of a rotor, reported after the configurations were updated.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepEvent<N> {
    /// Zero-based index of the step within the router's lifetime.
    pub index: u64,
    /// Node that fired.
    pub node: N,
    /// Edge the unit travelled along.
    pub edge: Edge<N>,
    /// Particle or antiparticle step.
    pub kind: StepKind,
}

/// Receives routing events. Every hook defaults to doing nothing, and the
/// engine behaves identically with or without an observer.
pub trait RoutingObserver<N> {
    /// Called once before a multi-step run starts.
    fn on_start(&mut self, _particles: &ParticleConfig<N>, _rotors: &RotorConfig<N>) {}

    /// Called after every step with the configurations as they now stand.
    fn on_step(
        &mut self,
        _event: &StepEvent<N>,
        _particles: &ParticleConfig<N>,
        _rotors: &RotorConfig<N>,
    ) {
    }
}

impl<N> RoutingObserver<N> for () {}

/// Statistics gathered over a routing run.
#[derive(Debug, Clone)]
pub struct RunStats<N> {
    steps: u64,
    edge_visits: BTreeMap<Edge<N>, u64>,
    node_visits: BTreeMap<N, u64>,
    last_visit: BTreeMap<N, u64>,
    sink_particles: BTreeMap<N, i64>,
    history: Option<Vec<(RotorConfig<N>, ParticleConfig<N>)>>,
}

impl<N: NodeKey> RunStats<N> {
    /// Collector for `graph` that keeps counters only.
    pub fn new(graph: &RotorGraph<N>) -> Self {
        Self::with_sinks(graph, &graph.sinks())
    }

    /// Collector whose sink totals track `sinks` instead of the graph's own.
    pub fn with_sinks(graph: &RotorGraph<N>, sinks: &BTreeSet<N>) -> Self {
        Self {
            steps: 0,
            edge_visits: graph.edges().map(|e| (e.clone(), 0)).collect(),
            node_visits: graph.nodes().map(|n| (n.clone(), 0)).collect(),
            last_visit: BTreeMap::new(),
            sink_particles: sinks.iter().map(|s| (s.clone(), 0)).collect(),
            history: None,
        }
    }

    /// Also record every intermediate `(rotors, particles)` pair.
    pub fn with_history(mut self) -> Self {
        self.history = Some(Vec::new());
        self
    }

    /// Number of steps observed.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Times each edge was travelled.
    pub fn edge_visits(&self) -> &BTreeMap<Edge<N>, u64> {
        &self.edge_visits
    }

    /// Times each node fired.
    pub fn node_visits(&self) -> &BTreeMap<N, u64> {
        &self.node_visits
    }

    /// Index of the last step fired at each node that fired at all.
    pub fn last_visit(&self) -> &BTreeMap<N, u64> {
        &self.last_visit
    }

    /// Particle count at each sink as of the last observed step.
    pub fn sink_particles(&self) -> &BTreeMap<N, i64> {
        &self.sink_particles
    }

    /// Recorded configurations, starting with the initial pair.
    pub fn history(&self) -> Option<&[(RotorConfig<N>, ParticleConfig<N>)]> {
        self.history.as_deref()
    }

    fn refresh_sinks(&mut self, particles: &ParticleConfig<N>) {
        for (sink, count) in &mut self.sink_particles {
            *count = particles.get(sink);
        }
    }
}

impl<N: NodeKey> RoutingObserver<N> for RunStats<N> {
    fn on_start(&mut self, particles: &ParticleConfig<N>, rotors: &RotorConfig<N>) {
        self.refresh_sinks(particles);
        if let Some(history) = &mut self.history {
            if history.is_empty() {
                history.push((rotors.clone(), particles.clone()));
            }
        }
    }

    fn on_step(
        &mut self,
        event: &StepEvent<N>,
        particles: &ParticleConfig<N>,
        rotors: &RotorConfig<N>,
    ) {
        self.steps += 1;
        *self.edge_visits.entry(event.edge.clone()).or_insert(0) += 1;
        *self.node_visits.entry(event.node.clone()).or_insert(0) += 1;
        self.last_visit.insert(event.node.clone(), event.index);
        if let Some(count) = self.sink_particles.get_mut(&event.edge.head) {
            *count = particles.get(&event.edge.head);
        }
        if let Some(history) = &mut self.history {
            history.push((rotors.clone(), particles.clone()));
        }
    }
}
