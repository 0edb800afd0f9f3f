// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use core::fmt;

use thiserror::Error;

use crate::ident::Edge;

/// Errors raised by graph, configuration and routing operations.
///
/// Every error is a local precondition violation detected before any state is
/// mutated; nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RotorError<N: fmt::Debug> {
    /// The node is not part of the graph.
    #[error("unknown node: {0:?}")]
    UnknownNode(N),
    /// The edge is not part of the graph.
    #[error("unknown edge: {0:?}")]
    UnknownEdge(Edge<N>),
    /// An edge was attached to a node that is not its tail.
    #[error("edge {edge:?} is not tailed at node {node:?}")]
    TailMismatch {
        /// Node the edge was attached to.
        node: N,
        /// Offending edge.
        edge: Edge<N>,
    },
    /// A replacement rotor order does not list every outgoing edge.
    #[error("rotor order for node {node:?} lists {found} of its {expected} outgoing edges")]
    IncompleteRotorOrder {
        /// Node whose order was replaced.
        node: N,
        /// Out-degree of the node.
        expected: usize,
        /// Number of distinct edges supplied.
        found: usize,
    },
    /// A replacement rotor order lists the same edge twice.
    #[error("rotor order for node {node:?} repeats edge {edge:?}")]
    DuplicateRotorEdge {
        /// Node whose order was replaced.
        node: N,
        /// Repeated edge.
        edge: Edge<N>,
    },
    /// The rotor configuration has no entry for a node that must fire.
    #[error("no rotor position recorded for node {0:?}")]
    MissingRotor(N),
    /// Routing was requested on a graph without any sink.
    #[error("routing needs at least one sink")]
    NoSink,
    /// A node involved in a run cannot reach any sink, so the run would not stop.
    #[error("node {0:?} cannot reach any sink")]
    SinkUnreachable(N),
    /// Integer division of a vector by zero.
    #[error("division by zero")]
    DivisionByZero,
}

/// Result alias used across the crate.
pub type RotorResult<T, N> = Result<T, RotorError<N>>;
