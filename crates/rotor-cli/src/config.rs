// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph sources: a JSON description on disk or one of the built-in shapes.
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use rotor_core::{Edge, GridSinks, RotorGraph};
use serde::Deserialize;
use tracing::info;

/// JSON graph description accepted by `--graph`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphFile {
    /// Extra nodes; endpoints of `edges` are added automatically.
    #[serde(default)]
    pub nodes: Vec<u64>,
    /// Edges `[tail, head]`, in default rotor order.
    pub edges: Vec<(u64, u64)>,
    /// Explicit sinks.
    #[serde(default)]
    pub sinks: Vec<u64>,
    /// Replacement rotor orders, `node -> [[tail, head, key], ...]`.
    #[serde(default)]
    pub rotor_order: BTreeMap<u64, Vec<(u64, u64, u32)>>,
    /// Reverse every rotor order after loading.
    #[serde(default)]
    pub invert: bool,
}

impl GraphFile {
    /// Reads and parses `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("reading graph file {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing graph file {}", path.display()))
    }

    /// Builds the described graph.
    pub fn build(&self) -> Result<RotorGraph<u64>> {
        let mut graph = RotorGraph::new();
        for &node in &self.nodes {
            graph.add_node(node);
        }
        for &(tail, head) in &self.edges {
            graph.add_edge(tail, head);
        }
        graph
            .set_sink(self.sinks.iter().copied())
            .context("marking sinks")?;
        if !self.rotor_order.is_empty() {
            let order = self
                .rotor_order
                .iter()
                .map(|(&node, edges)| (node, edges.iter().copied().map(Edge::from).collect()))
                .collect();
            graph.set_rotor_order(order).context("installing rotor order")?;
        }
        if self.invert {
            graph.invert_rotor_order();
        }
        Ok(graph)
    }
}

/// Exactly one graph source.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct GraphSource {
    /// JSON graph description.
    #[arg(long, value_name = "FILE")]
    pub graph: Option<PathBuf>,
    /// Path of N nodes; the two ends are sinks.
    #[arg(long, value_name = "N")]
    pub path: Option<u64>,
    /// Path of N interior nodes, each with X edges left and Y edges right.
    #[arg(long, num_args = 3, value_names = ["N", "X", "Y"])]
    pub weighted_path: Option<Vec<u64>>,
    /// R x C grid with rotors turning up, right, down, left.
    #[arg(long, num_args = 2, value_names = ["R", "C"])]
    pub grid: Option<Vec<u64>>,
}

/// Graph source plus the options that adjust it.
#[derive(Args, Debug, Clone)]
pub struct GraphOptions {
    #[command(flatten)]
    pub source: GraphSource,
    /// Mark the four grid corners as sinks.
    #[arg(long)]
    pub grid_corners: bool,
    /// Use these sinks instead of the graph's own (nodes without out-edges
    /// stay sinks).
    #[arg(long, value_delimiter = ',', value_name = "NODES")]
    pub sinks: Vec<u64>,
    /// Reverse every rotor order.
    #[arg(long)]
    pub invert: bool,
}

/// Shape parameters of a weighted path, `(interior nodes, left, right)`.
pub type PathShape = (u64, u64, u64);

/// A loaded graph and the sink override chosen on the command line.
#[derive(Debug)]
pub struct Session {
    /// The graph under study.
    pub graph: RotorGraph<u64>,
    /// Replacement sinks, when `--sinks` was given.
    pub sinks: Option<BTreeSet<u64>>,
    /// Set when the graph is a (weighted) path built from the command line.
    pub shape: Option<PathShape>,
}

impl Session {
    /// Sinks in force: the override (or explicit sinks) plus implicit ones.
    pub fn effective_sinks(&self) -> BTreeSet<u64> {
        self.graph.effective_sinks(self.sinks.as_ref())
    }
}

impl GraphOptions {
    /// Loads the graph selected by the options.
    pub fn load(&self) -> Result<Session> {
        let mut shape = None;
        let mut graph = if let Some(file) = &self.source.graph {
            GraphFile::load(file)?.build()?
        } else if let Some(n) = self.source.path {
            if n >= 3 {
                shape = Some((n - 2, 1, 1));
            }
            RotorGraph::simple_path(n)
        } else if let Some(params) = &self.source.weighted_path {
            let &[n, left, right] = params.as_slice() else {
                bail!("--weighted-path takes N X Y");
            };
            shape = Some((n, left, right));
            let left = u32::try_from(left).context("X is too large")?;
            let right = u32::try_from(right).context("Y is too large")?;
            RotorGraph::weighted_path(n, left, right)
        } else if let Some(dims) = &self.source.grid {
            let &[rows, cols] = dims.as_slice() else {
                bail!("--grid takes R C");
            };
            let sinks = if self.grid_corners {
                GridSinks::Corners
            } else {
                GridSinks::None
            };
            RotorGraph::grid(rows, cols, sinks)
        } else {
            bail!("no graph given; use --graph, --path, --weighted-path or --grid");
        };
        if self.invert {
            graph.invert_rotor_order();
            shape = None;
        }
        let sinks = if self.sinks.is_empty() {
            None
        } else {
            for node in &self.sinks {
                if !graph.contains_node(node) {
                    bail!("sink {node} is not a node of the graph");
                }
            }
            shape = None;
            Some(self.sinks.iter().copied().collect())
        };
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "graph loaded"
        );
        Ok(Session {
            graph,
            sinks,
            shape,
        })
    }
}

/// Parses `NODE=COUNT` with a signed count.
pub fn parse_particles(arg: &str) -> Result<(u64, i64)> {
    let (node, count) = split_assignment(arg)?;
    let count = count
        .parse()
        .with_context(|| format!("invalid particle count in {arg:?}"))?;
    Ok((node, count))
}

/// Parses `NODE=COUNT` with a non-negative count.
pub fn parse_visits(arg: &str) -> Result<(u64, u32)> {
    let (node, count) = split_assignment(arg)?;
    let count = count
        .parse()
        .with_context(|| format!("invalid visit count in {arg:?}"))?;
    Ok((node, count))
}

fn split_assignment(arg: &str) -> Result<(u64, &str)> {
    let Some((node, count)) = arg.split_once('=') else {
        bail!("expected NODE=COUNT, got {arg:?}");
    };
    let node = node
        .trim()
        .parse()
        .with_context(|| format!("invalid node in {arg:?}"))?;
    Ok((node, count.trim()))
}
