// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `rotor`: command-line experiments with rotor-routing.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]
// The CLI is expected to print to stdout/stderr.
#![allow(clippy::print_stdout, clippy::print_stderr)]
#![allow(clippy::module_name_repetitions, clippy::missing_const_for_fn)]

mod config;
mod render;
mod study;

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rotor_core::{
    ParticleConfig, RotorConfig, RotorGraph, RouteOrder, Router, RoutingObserver, RunStats,
    StepEvent, StepKind,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{parse_particles, parse_visits, GraphOptions, Session};

#[derive(Parser, Debug)]
#[command(author, version, about = "Rotor-routing on directed multigraphs")]
struct Cli {
    #[command(flatten)]
    graph: GraphOptions,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Route particles until every one sits in a sink.
    Route {
        /// Initial particles as NODE=COUNT; negative counts are antiparticles.
        #[arg(long = "particles", value_name = "NODE=COUNT", value_parser = parse_particles)]
        particles: Vec<(u64, i64)>,
        /// Step order.
        #[arg(long, value_enum, default_value_t = OrderArg::MoveThenTurn)]
        order: OrderArg,
        /// Route antiparticles too, leaving every non-sink node empty.
        #[arg(long)]
        complete: bool,
        /// Print every step.
        #[arg(long)]
        trace: bool,
        /// Print visit statistics.
        #[arg(long)]
        stats: bool,
        /// Print the final configurations as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Fire nodes a given number of times each.
    Fire {
        /// Firings as NODE=COUNT.
        #[arg(long = "visits", value_name = "NODE=COUNT", value_parser = parse_visits)]
        visits: Vec<(u64, u32)>,
        /// Initial particles as NODE=COUNT.
        #[arg(long = "particles", value_name = "NODE=COUNT", value_parser = parse_particles)]
        particles: Vec<(u64, i64)>,
        /// Step order.
        #[arg(long, value_enum, default_value_t = OrderArg::MoveThenTurn)]
        order: OrderArg,
    },
    /// Route a single particle from the initial rotor configuration.
    RouteOne {
        /// Start node.
        #[arg(long)]
        node: u64,
        /// Step order.
        #[arg(long, value_enum, default_value_t = OrderArg::MoveThenTurn)]
        order: OrderArg,
        /// Print visit statistics.
        #[arg(long)]
        stats: bool,
    },
    /// List the acyclic rotor configurations.
    Enumerate {
        /// List their recurrent counterparts instead.
        #[arg(long)]
        recurrent: bool,
    },
    /// Pair every recurrent configuration with its destination forest.
    Classes {
        /// Also count the configurations reachable by cycle pushes.
        #[arg(long)]
        explore: bool,
    },
    /// Longest single-particle routing over every rotor configuration.
    MaxSteps {
        /// Step order.
        #[arg(long, value_enum, default_value_t = OrderArg::MoveThenTurn)]
        order: OrderArg,
        /// Print at most this many witnesses.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print the Laplacian and its determinant.
    Laplacian {
        /// Drop the sink columns.
        #[arg(long)]
        reduced: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OrderArg {
    MoveThenTurn,
    TurnThenMove,
}

impl From<OrderArg> for RouteOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::MoveThenTurn => Self::MoveThenTurn,
            OrderArg::TurnThenMove => Self::TurnThenMove,
        }
    }
}

/// Collects statistics and optionally prints each step.
struct Console<'a> {
    graph: &'a RotorGraph<u64>,
    sinks: &'a BTreeSet<u64>,
    stats: RunStats<u64>,
    trace: bool,
}

impl RoutingObserver<u64> for Console<'_> {
    fn on_start(&mut self, particles: &ParticleConfig<u64>, rotors: &RotorConfig<u64>) {
        self.stats.on_start(particles, rotors);
        if self.trace {
            println!(
                "start: {}",
                render::path_line(self.graph, self.sinks, particles, rotors)
            );
        }
    }

    fn on_step(
        &mut self,
        event: &StepEvent<u64>,
        particles: &ParticleConfig<u64>,
        rotors: &RotorConfig<u64>,
    ) {
        self.stats.on_step(event, particles, rotors);
        if self.trace {
            let sign = match event.kind {
                StepKind::Particle => '+',
                StepKind::Antiparticle => '-',
            };
            println!(
                "step {} {sign} {}: {}",
                event.index,
                render::edge(&event.edge),
                render::path_line(self.graph, self.sinks, particles, rotors)
            );
        }
    }
}

#[derive(Serialize)]
struct RouteReport<'a> {
    steps: u64,
    particles: &'a ParticleConfig<u64>,
    rotors: &'a RotorConfig<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let session = cli.graph.load()?;
    match cli.command {
        Command::Route {
            particles,
            order,
            complete,
            trace,
            stats,
            json,
        } => route(&session, &particles, order, complete, trace, stats, json),
        Command::Fire {
            visits,
            particles,
            order,
        } => fire(&session, &visits, &particles, order),
        Command::RouteOne { node, order, stats } => route_one(&session, node, order, stats),
        Command::Enumerate { recurrent } => enumerate(&session, recurrent),
        Command::Classes { explore } => classes(&session, explore),
        Command::MaxSteps { order, limit } => max_steps(&session, order, limit),
        Command::Laplacian { reduced } => laplacian(&session, reduced),
    }
}

fn initial_particles(session: &Session, counts: &[(u64, i64)]) -> Result<ParticleConfig<u64>> {
    let mut particles = ParticleConfig::zeroed(&session.graph);
    for &(node, count) in counts {
        if !session.graph.contains_node(&node) {
            bail!("particle node {node} is not in the graph");
        }
        particles.add_particles(&node, count);
    }
    Ok(particles)
}

fn print_sinks(sinks: &BTreeSet<u64>, particles: &ParticleConfig<u64>) {
    for sink in sinks {
        println!("sink {sink}: {}", particles.get(sink));
    }
}

#[allow(clippy::fn_params_excessive_bools)]
fn route(
    session: &Session,
    counts: &[(u64, i64)],
    order: OrderArg,
    complete: bool,
    trace: bool,
    stats: bool,
    json: bool,
) -> Result<()> {
    let graph = &session.graph;
    let sinks = session.effective_sinks();
    let mut particles = initial_particles(session, counts)?;
    let mut rotors = RotorConfig::initial_for(graph, &sinks);
    let mut router = Router::new(graph).with_sinks(&sinks).with_order(order.into());
    let mut console = Console {
        graph,
        sinks: &sinks,
        stats: RunStats::with_sinks(graph, &sinks),
        trace,
    };
    let steps = if complete {
        router.complete_routing(&mut particles, &mut rotors, &mut console)
    } else {
        router.legal_routing(&mut particles, &mut rotors, &mut console)
    }
    .context("routing failed")?;
    info!(steps, "routing finished");
    if json {
        let report = RouteReport {
            steps,
            particles: &particles,
            rotors: &rotors,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("steps: {steps}");
    print_sinks(&sinks, &particles);
    println!(
        "{}",
        render::configuration_table(graph, &sinks, &particles, &rotors)
    );
    if stats {
        println!("{}", render::stats_table(graph, &console.stats));
    }
    Ok(())
}

fn fire(
    session: &Session,
    visits: &[(u64, u32)],
    counts: &[(u64, i64)],
    order: OrderArg,
) -> Result<()> {
    let graph = &session.graph;
    let sinks = session.effective_sinks();
    let mut particles = initial_particles(session, counts)?;
    let mut rotors = RotorConfig::initial_for(graph, &sinks);
    let mut plan = BTreeMap::new();
    for &(node, count) in visits {
        *plan.entry(node).or_insert(0_u32) += count;
    }
    let mut router = Router::new(graph).with_sinks(&sinks).with_order(order.into());
    router
        .vector_routing(&mut particles, &mut rotors, &plan, &mut ())
        .context("firing failed")?;
    println!("explicit steps: {}", router.steps_taken());
    print_sinks(&sinks, &particles);
    println!(
        "{}",
        render::configuration_table(graph, &sinks, &particles, &rotors)
    );
    Ok(())
}

fn route_one(session: &Session, node: u64, order: OrderArg, stats: bool) -> Result<()> {
    let graph = &session.graph;
    let sinks = session.effective_sinks();
    if sinks.contains(&node) {
        bail!("node {node} is a sink");
    }
    let rotors = RotorConfig::initial_for(graph, &sinks);
    let mut router = Router::new(graph).with_sinks(&sinks).with_order(order.into());
    let (rotors, run) = router
        .route_one_particle(&node, &rotors)
        .context("routing failed")?;
    println!("steps: {}", run.steps());
    if let Some((sink, _)) = run.sink_particles().iter().find(|&(_, &k)| k > 0) {
        println!("absorbed at: {sink}");
    }
    println!("rotors: {}", render::rotors(&rotors));
    if stats {
        println!("{}", render::stats_table(graph, &run));
    }
    Ok(())
}

fn enumerate(session: &Session, recurrent: bool) -> Result<()> {
    let graph = &session.graph;
    let sinks = session.effective_sinks();
    let configs = if recurrent {
        graph.recurrent_configurations(Some(&sinks))?
    } else {
        graph.enum_acyclic_configurations(Some(&sinks))
    };
    for config in &configs {
        println!("{}", render::rotors(config));
    }
    println!("count: {}", configs.len());
    if let Some(det) = graph.reduced_laplacian_matrix(Some(&sinks)).determinant() {
        println!("determinant: {det}");
    }
    Ok(())
}

fn classes(session: &Session, explore: bool) -> Result<()> {
    let graph = &session.graph;
    let sinks = session.effective_sinks();
    let pairs = graph
        .recurrent_and_acyclic(Some(&sinks))
        .context("reducing recurrent configurations")?;
    for (recurrent, forest) in &pairs {
        let line = format!("{} => {}", render::rotors(recurrent), render::rotors(forest));
        if explore {
            let class = graph.all_config_from_recurrent(recurrent, Some(&sinks))?;
            println!("{line} (class of {})", class.len());
        } else {
            println!("{line}");
        }
    }
    println!("classes: {}", pairs.len());
    Ok(())
}

fn max_steps(session: &Session, order: OrderArg, limit: usize) -> Result<()> {
    let result = study::max_steps(session, order.into())?;
    println!("max steps: {}", result.steps);
    println!("runs: {}", result.runs);
    for (node, config) in result.witnesses.iter().take(limit) {
        println!("from {node}: {}", render::rotors(config));
    }
    if let (Some((n, left, right)), OrderArg::MoveThenTurn) = (session.shape, order) {
        if left + right > 0 {
            println!("expected: {}", study::expected_max_steps(n, left, right));
        }
    }
    Ok(())
}

fn laplacian(session: &Session, reduced: bool) -> Result<()> {
    let graph = &session.graph;
    let sinks = session.sinks.as_ref();
    let matrix = if reduced {
        graph.reduced_laplacian_matrix(sinks)
    } else {
        graph.laplacian_matrix(sinks)
    };
    println!("{}", render::laplacian_table(&matrix));
    if let Some(det) = matrix.determinant() {
        println!("determinant: {det}");
    }
    Ok(())
}
