// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs, clippy::unwrap_used)]
use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn rotor() -> Command {
    Command::cargo_bin("rotor").unwrap()
}

fn graph_file(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

#[test]
fn routes_three_particles_through_a_fork() {
    let file = graph_file(r#"{"edges": [[1, 2], [1, 0]]}"#);
    rotor()
        .arg("--graph")
        .arg(file.path())
        .args(["route", "--particles", "1=3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("steps: 3"))
        .stdout(predicate::str::contains("sink 0: 1"))
        .stdout(predicate::str::contains("sink 2: 2"));
}

#[test]
fn route_report_as_json() {
    let file = graph_file(r#"{"edges": [[1, 2], [1, 0]]}"#);
    let output = rotor()
        .arg("--graph")
        .arg(file.path())
        .args(["route", "--particles", "1=3", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["steps"], 3);
    assert_eq!(report["particles"]["2"], 2);
    assert_eq!(report["particles"]["1"], 0);
    // Three turns of a two-edge rotor leave it one step past the start.
    assert_eq!(report["rotors"]["1"]["head"], 0);
}

#[test]
fn trace_prints_every_step() {
    rotor()
        .args(["--path", "4", "route", "--particles", "1=1", "--trace"])
        .assert()
        .success()
        .stdout(predicate::str::contains("start: [0] 1< 0< [0]"))
        .stdout(predicate::str::contains("step 0 + 1>0: [1] 0> 0< [0]"));
}

#[test]
fn routing_without_sinks_fails() {
    let file = graph_file(r#"{"edges": [[1, 2], [2, 1]]}"#);
    rotor()
        .arg("--graph")
        .arg(file.path())
        .args(["route", "--particles", "1=1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("needs at least one sink"));
}

#[test]
fn particles_must_name_graph_nodes() {
    rotor()
        .args(["--path", "4", "route", "--particles", "9=1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not in the graph"));
}

#[test]
fn a_graph_source_is_required() {
    rotor().args(["route"]).assert().code(2);
}

#[test]
fn route_one_reports_absorbing_sink() {
    rotor()
        .args(["--path", "5", "route-one", "--node", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("steps: 2"))
        .stdout(predicate::str::contains("absorbed at: 0"));
}

#[test]
fn whole_turns_take_no_explicit_steps() {
    rotor()
        .args(["--path", "5", "fire", "--visits", "2=4", "--particles", "2=4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("explicit steps: 0"));
}

#[test]
fn enumeration_count_matches_determinant() {
    rotor()
        .args(["--path", "5", "enumerate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("count: 4"))
        .stdout(predicate::str::contains("determinant: 4"));
    rotor()
        .args(["--grid", "3", "3", "--grid-corners", "enumerate", "--recurrent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("count: 216"))
        .stdout(predicate::str::contains("determinant: 216"));
}

#[test]
fn classes_pair_recurrent_with_forests() {
    rotor()
        .args(["--path", "4", "classes", "--explore"])
        .assert()
        .success()
        .stdout(predicate::str::contains("classes: 3"));
}

#[test]
fn max_steps_matches_closed_form() {
    rotor()
        .args(["--weighted-path", "3", "2", "2", "max-steps"])
        .assert()
        .success()
        .stdout(predicate::str::contains("max steps: 10"))
        .stdout(predicate::str::contains("expected: 10"));
    rotor()
        .args(["--path", "5", "max-steps"])
        .assert()
        .success()
        .stdout(predicate::str::contains("max steps: 6"));
}

#[test]
fn reduced_laplacian_determinant() {
    rotor()
        .args(["--path", "4", "laplacian", "--reduced"])
        .assert()
        .success()
        .stdout(predicate::str::contains("determinant: 3"));
}

#[test]
fn sink_override_changes_routing() {
    rotor()
        .args(["--path", "5", "--sinks", "2", "route-one", "--node", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("steps: 1"))
        .stdout(predicate::str::contains("absorbed at: 2"));
}
