// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! rotor-core: rotor-routing on directed multigraphs.
//!
//! A [`RotorGraph`] fixes, for every node, a cyclic order of its outgoing
//! edges. A [`RotorConfig`] says which edge each rotor currently points to and
//! a [`ParticleConfig`] holds signed particle counts. The [`Router`] moves
//! particles (and antiparticles) one step at a time until every particle sits
//! in a sink. Rotor configurations can be reduced to their destination forest
//! by cycle popping, and the acyclic configurations of a graph can be
//! enumerated; their number is the determinant of the reduced [`Laplacian`].
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
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

/// Path and grid constructors used by experiments and tests.
pub mod builders;
mod enumerate;
mod error;
mod graph;
mod ident;
mod laplacian;
mod observer;
mod particle;
mod rotor;
mod routing;
/// Union-find with checkpoint/rollback, used by the acyclic enumerator.
pub mod union_find;
mod vector;

/// Graph shapes offered by [`builders`].
pub use builders::GridSinks;
/// Lazy enumerators over rotor configurations.
pub use enumerate::{AcyclicConfigs, AllConfigs};
/// Error type shared by every fallible operation.
pub use error::{RotorError, RotorResult};
/// Rotor graph topology store and its per-node rotor order.
pub use graph::{RotorGraph, RotorOrder};
/// Node and edge identifiers.
pub use ident::{Edge, NodeKey};
/// Laplacian matrices (full and reduced) with an exact determinant.
pub use laplacian::Laplacian;
/// Arbitrary-precision integer returned by [`Laplacian::determinant`].
pub use num_bigint::BigInt;
/// Observer hooks and the statistics collector built on them.
pub use observer::{RoutingObserver, RunStats, StepEvent, StepKind};
/// Signed particle counts per node.
pub use particle::ParticleConfig;
/// Rotor positions per node, cycle detection and cycle popping.
pub use rotor::RotorConfig;
/// Particle and antiparticle routing.
pub use routing::{RouteOrder, Router};
/// Generic integer vector indexed by node.
pub use vector::Vector;
