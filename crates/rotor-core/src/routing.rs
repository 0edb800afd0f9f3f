// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Particle and antiparticle routing.
use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, instrument};

use crate::error::{RotorError, RotorResult};
use crate::graph::RotorGraph;
use crate::ident::NodeKey;
use crate::observer::{RoutingObserver, RunStats, StepEvent, StepKind};
use crate::particle::ParticleConfig;
use crate::rotor::RotorConfig;

/// Whether a step moves along the current rotor edge or the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RouteOrder {
    /// Transfer along the current edge, then advance the rotor.
    #[default]
    MoveThenTurn,
    /// Advance the rotor, then transfer along the new edge.
    TurnThenMove,
}

/// Routing engine bound to one graph.
///
/// The router holds the effective sink set and the step order for a run and
/// counts the steps it has fired. Configurations are passed in by the caller
/// and mutated in place. Node selection is deterministic: when no node is
/// given, the smallest non-sink node (by `Ord`) with the right sign fires.
#[derive(Debug, Clone)]
pub struct Router<'g, N> {
    graph: &'g RotorGraph<N>,
    sinks: BTreeSet<N>,
    order: RouteOrder,
    steps: u64,
}

impl<'g, N: NodeKey> Router<'g, N> {
    /// Router using the graph's own sinks and [`RouteOrder::MoveThenTurn`].
    pub fn new(graph: &'g RotorGraph<N>) -> Self {
        Self {
            graph,
            sinks: graph.sinks(),
            order: RouteOrder::default(),
            steps: 0,
        }
    }

    /// Replaces the explicit sinks for this router. Nodes without outgoing
    /// edges remain sinks.
    pub fn with_sinks(mut self, sinks: &BTreeSet<N>) -> Self {
        self.sinks = self.graph.effective_sinks(Some(sinks));
        self
    }

    /// Sets the step order.
    pub fn with_order(mut self, order: RouteOrder) -> Self {
        self.order = order;
        self
    }

    /// Graph being routed.
    pub fn graph(&self) -> &'g RotorGraph<N> {
        self.graph
    }

    /// Effective sinks of this router.
    pub fn sinks(&self) -> &BTreeSet<N> {
        &self.sinks
    }

    /// Step order in use.
    pub fn order(&self) -> RouteOrder {
        self.order
    }

    /// Steps fired since the router was created.
    pub fn steps_taken(&self) -> u64 {
        self.steps
    }

    /// Fires one particle step.
    ///
    /// With `node == None` the first non-sink node holding a positive count
    /// fires; if there is none nothing happens and `Ok(None)` is returned. An
    /// explicit node fires whatever its count.
    pub fn step<O>(
        &mut self,
        particles: &mut ParticleConfig<N>,
        rotors: &mut RotorConfig<N>,
        node: Option<&N>,
        observer: &mut O,
    ) -> RotorResult<Option<StepEvent<N>>, N>
    where
        O: RoutingObserver<N> + ?Sized,
    {
        let node = match node {
            Some(node) => self.require_node(node)?.clone(),
            None => match particles.first_node_with_particle(&self.sinks) {
                Some(node) => node.clone(),
                None => return Ok(None),
            },
        };
        self.fire(node, StepKind::Particle, particles, rotors, observer)
            .map(Some)
    }

    /// Fires one antiparticle step.
    ///
    /// Selection mirrors [`Router::step`] with negative counts. One unit is
    /// taken from the head of the chosen edge and given to the firing node, so
    /// the node's debt moves along the edge. The rotor advances forward
    /// exactly as in [`Router::step`].
    pub fn reverse_step<O>(
        &mut self,
        particles: &mut ParticleConfig<N>,
        rotors: &mut RotorConfig<N>,
        node: Option<&N>,
        observer: &mut O,
    ) -> RotorResult<Option<StepEvent<N>>, N>
    where
        O: RoutingObserver<N> + ?Sized,
    {
        let node = match node {
            Some(node) => self.require_node(node)?.clone(),
            None => match particles.first_node_with_antiparticle(&self.sinks) {
                Some(node) => node.clone(),
                None => return Ok(None),
            },
        };
        self.fire(node, StepKind::Antiparticle, particles, rotors, observer)
            .map(Some)
    }

    /// Steps until no non-sink node holds a positive count. Returns the number
    /// of steps fired.
    ///
    /// Fails before moving anything with [`RotorError::NoSink`] when there is
    /// no sink, [`RotorError::SinkUnreachable`] when particles could get
    /// trapped away from every sink, and with the error of
    /// [`RotorGraph::check_rotor_config`] or [`RotorError::MissingRotor`] when
    /// `rotors` cannot drive the run.
    #[instrument(level = "debug", skip_all, fields(order = ?self.order))]
    pub fn legal_routing<O>(
        &mut self,
        particles: &mut ParticleConfig<N>,
        rotors: &mut RotorConfig<N>,
        observer: &mut O,
    ) -> RotorResult<u64, N>
    where
        O: RoutingObserver<N> + ?Sized,
    {
        self.ensure_terminates(particles, rotors, |k| k > 0)?;
        observer.on_start(particles, rotors);
        let start = self.steps;
        while let Some(node) = particles.first_node_with_particle(&self.sinks).cloned() {
            self.fire(node, StepKind::Particle, particles, rotors, observer)?;
        }
        let steps = self.steps - start;
        debug!(steps, "legal routing finished");
        Ok(steps)
    }

    /// Antiparticle analogue of [`Router::legal_routing`]: reverse-steps until
    /// no non-sink node holds a negative count.
    #[instrument(level = "debug", skip_all, fields(order = ?self.order))]
    pub fn antiparticle_routing<O>(
        &mut self,
        particles: &mut ParticleConfig<N>,
        rotors: &mut RotorConfig<N>,
        observer: &mut O,
    ) -> RotorResult<u64, N>
    where
        O: RoutingObserver<N> + ?Sized,
    {
        self.ensure_terminates(particles, rotors, |k| k < 0)?;
        observer.on_start(particles, rotors);
        let start = self.steps;
        while let Some(node) = particles.first_node_with_antiparticle(&self.sinks).cloned() {
            self.fire(node, StepKind::Antiparticle, particles, rotors, observer)?;
        }
        let steps = self.steps - start;
        debug!(steps, "antiparticle routing finished");
        Ok(steps)
    }

    /// Legal routing followed by antiparticle routing. Afterwards every
    /// non-sink node holds exactly 0.
    pub fn complete_routing<O>(
        &mut self,
        particles: &mut ParticleConfig<N>,
        rotors: &mut RotorConfig<N>,
        observer: &mut O,
    ) -> RotorResult<u64, N>
    where
        O: RoutingObserver<N> + ?Sized,
    {
        self.ensure_terminates(particles, rotors, |k| k != 0)?;
        let forward = self.legal_routing(particles, rotors, observer)?;
        let backward = self.antiparticle_routing(particles, rotors, observer)?;
        Ok(forward + backward)
    }

    /// Routes a single particle placed at `node` to a sink, starting from
    /// `rotors`. Returns the final rotor configuration and the run statistics.
    pub fn route_one_particle(
        &mut self,
        node: &N,
        rotors: &RotorConfig<N>,
    ) -> RotorResult<(RotorConfig<N>, RunStats<N>), N> {
        self.require_node(node)?;
        let mut particles = ParticleConfig::zeroed(self.graph);
        particles.set_particles(node.clone(), 1);
        let mut rotors = rotors.clone();
        let mut stats = RunStats::with_sinks(self.graph, &self.sinks);
        self.legal_routing(&mut particles, &mut rotors, &mut stats)?;
        Ok((rotors, stats))
    }

    /// Fires each node `u` of `visits` the requested number of times.
    ///
    /// Every whole turn of `u`'s rotor sends one unit along each out-edge and
    /// leaves the rotor where it was, so `k / d` turns (with `d` the
    /// out-degree) are applied at once by subtracting that multiple of the
    /// Laplacian row of `u`. The remaining `k % d` firings are explicit steps
    /// and are the only ones reported to `observer`. Sinks and unknown nodes
    /// are skipped. A malformed `rotors`, or a firing node without a rotor,
    /// is rejected before anything moves.
    pub fn vector_routing<O>(
        &mut self,
        particles: &mut ParticleConfig<N>,
        rotors: &mut RotorConfig<N>,
        visits: &BTreeMap<N, u32>,
        observer: &mut O,
    ) -> RotorResult<(), N>
    where
        O: RoutingObserver<N> + ?Sized,
    {
        self.graph.check_rotor_config(rotors)?;
        let firing = visits
            .iter()
            .filter(|&(u, &k)| k > 0 && self.graph.out_degree(u) > 0)
            .map(|(u, _)| u);
        self.ensure_rotors(firing, rotors)?;
        let laplacian = self.graph.laplacian_matrix(Some(&self.sinks));
        for (u, &k) in visits {
            let Some(row) = laplacian.row(u) else {
                continue;
            };
            let degree = u32::try_from(self.graph.out_degree(u)).unwrap_or(u32::MAX);
            if degree == 0 {
                continue;
            }
            let turns = i64::from(k / degree);
            if turns > 0 {
                for (v, &entry) in row {
                    particles.add_particles(v, -turns * entry);
                }
            }
            for _ in 0..k % degree {
                self.fire(u.clone(), StepKind::Particle, particles, rotors, observer)?;
            }
        }
        Ok(())
    }

    fn require_node<'n>(&self, node: &'n N) -> RotorResult<&'n N, N> {
        if self.graph.contains_node(node) {
            Ok(node)
        } else {
            Err(RotorError::UnknownNode(node.clone()))
        }
    }

    fn ensure_terminates(
        &self,
        particles: &ParticleConfig<N>,
        rotors: &RotorConfig<N>,
        eligible: impl Fn(i64) -> bool,
    ) -> RotorResult<(), N> {
        self.graph.check_rotor_config(rotors)?;
        let starts: Vec<&N> = particles
            .iter()
            .filter(|&(n, k)| eligible(k) && !self.sinks.contains(n))
            .map(|(n, _)| n)
            .collect();
        self.graph
            .ensure_sinks_reachable(starts.iter().copied(), &self.sinks)?;
        let reached = self.graph.reachable_from(starts, &self.sinks);
        self.ensure_rotors(&reached, rotors)
    }

    /// Every non-sink node in `nodes` must have a rotor entry.
    fn ensure_rotors<'a, I>(&self, nodes: I, rotors: &RotorConfig<N>) -> RotorResult<(), N>
    where
        I: IntoIterator<Item = &'a N>,
        N: 'a,
    {
        match nodes
            .into_iter()
            .find(|n| !self.sinks.contains(*n) && rotors.get(n).is_none())
        {
            Some(missing) => Err(RotorError::MissingRotor(missing.clone())),
            None => Ok(()),
        }
    }

    fn fire<O>(
        &mut self,
        node: N,
        kind: StepKind,
        particles: &mut ParticleConfig<N>,
        rotors: &mut RotorConfig<N>,
        observer: &mut O,
    ) -> RotorResult<StepEvent<N>, N>
    where
        O: RoutingObserver<N> + ?Sized,
    {
        let current = rotors
            .get(&node)
            .cloned()
            .ok_or_else(|| RotorError::MissingRotor(node.clone()))?;
        if current.tail != node {
            return Err(RotorError::TailMismatch {
                node,
                edge: current,
            });
        }
        let next = self.graph.turn(&current, 1)?;
        let edge = match self.order {
            RouteOrder::MoveThenTurn => current,
            RouteOrder::TurnThenMove => next.clone(),
        };
        match kind {
            StepKind::Particle => particles.transfer_particles(&node, &edge.head, 1),
            StepKind::Antiparticle => particles.transfer_particles(&edge.head, &node, 1),
        }
        rotors.set(node.clone(), next);
        let event = StepEvent {
            index: self.steps,
            node,
            edge,
            kind,
        };
        self.steps += 1;
        observer.on_step(&event, particles, rotors);
        Ok(event)
    }
}
