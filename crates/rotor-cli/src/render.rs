// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Text and table output.
use std::collections::BTreeSet;
use std::fmt::Write as _;

use comfy_table::{presets, Table};
use rotor_core::{Edge, Laplacian, ParticleConfig, RotorConfig, RotorGraph, RunStats};

/// `tail>head`, with `#key` for parallel edges after the first.
pub fn edge(edge: &Edge<u64>) -> String {
    if edge.key == 0 {
        format!("{}>{}", edge.tail, edge.head)
    } else {
        format!("{}>{}#{}", edge.tail, edge.head, edge.key)
    }
}

/// One line listing every rotor.
pub fn rotors(config: &RotorConfig<u64>) -> String {
    config
        .edges()
        .map(edge)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Line drawing meant for paths: sinks as `[k]`, other nodes as the count
/// followed by `<`, `>` or `o` for a rotor pointing left, right or at itself.
pub fn path_line(
    graph: &RotorGraph<u64>,
    sinks: &BTreeSet<u64>,
    particles: &ParticleConfig<u64>,
    rotors: &RotorConfig<u64>,
) -> String {
    let mut line = String::new();
    for node in graph.nodes() {
        if !line.is_empty() {
            line.push(' ');
        }
        let count = particles.get(node);
        if sinks.contains(node) {
            let _ = write!(line, "[{count}]");
            continue;
        }
        let glyph = match rotors.get(node) {
            Some(e) if e.head < *node => '<',
            Some(e) if e.head > *node => '>',
            Some(_) => 'o',
            None => '?',
        };
        let _ = write!(line, "{count}{glyph}");
    }
    line
}

fn table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::ASCII_MARKDOWN);
    table
}

/// Per-node particles and rotors.
pub fn configuration_table(
    graph: &RotorGraph<u64>,
    sinks: &BTreeSet<u64>,
    particles: &ParticleConfig<u64>,
    rotors: &RotorConfig<u64>,
) -> Table {
    let mut table = table();
    table.set_header(vec!["node", "particles", "rotor"]);
    for node in graph.nodes() {
        let rotor = if sinks.contains(node) {
            "sink".to_owned()
        } else {
            rotors.get(node).map_or_else(|| "-".to_owned(), edge)
        };
        table.add_row(vec![
            node.to_string(),
            particles.get(node).to_string(),
            rotor,
        ]);
    }
    table
}

/// Visit counters of a run.
pub fn stats_table(graph: &RotorGraph<u64>, stats: &RunStats<u64>) -> Table {
    let mut table = table();
    table.set_header(vec!["node", "visits", "last visit", "absorbed"]);
    for node in graph.nodes() {
        let cell = |value: Option<String>| value.unwrap_or_default();
        table.add_row(vec![
            node.to_string(),
            cell(stats.node_visits().get(node).map(u64::to_string)),
            cell(stats.last_visit().get(node).map(u64::to_string)),
            cell(stats.sink_particles().get(node).map(i64::to_string)),
        ]);
    }
    table
}

/// Matrix with node labels on both axes.
pub fn laplacian_table(laplacian: &Laplacian<u64>) -> Table {
    let mut table = table();
    let columns: Vec<u64> = laplacian
        .rows()
        .next()
        .map(|(_, row)| row.keys().copied().collect())
        .unwrap_or_default();
    let mut header = vec![String::new()];
    header.extend(columns.iter().map(u64::to_string));
    table.set_header(header);
    for (node, row) in laplacian.rows() {
        let mut cells = vec![node.to_string()];
        cells.extend(row.values().map(i64::to_string));
        table.add_row(cells);
    }
    table
}
