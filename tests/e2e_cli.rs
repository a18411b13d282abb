//! End-to-end tests for the dbt-select binary.
#![cfg(feature = "cli")]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

const GRAPH: &str = r#"{"models": [
    {"name": "stg_orders", "tags": ["staging"], "schema": "staging"},
    {"name": "fct_orders", "materialized": "incremental", "depends_on": ["stg_orders"]},
    {"name": "rpt_orders", "materialized": "table", "schema": "reporting", "depends_on": ["fct_orders"]}
]}"#;

fn write_graph(dir: &Path) -> PathBuf {
    let path = dir.join("graph.json");
    std::fs::write(&path, GRAPH).unwrap();
    path
}

fn dbt_select(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dbt-select"))
        .env_remove("DBT_SELECT_GRAPH")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run dbt-select")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_list() {
    let tmp = TempDir::new().unwrap();
    let graph = write_graph(tmp.path());

    let output = dbt_select(&["list", "--graph", graph.to_str().unwrap(), "--select", "+stg_orders,!rpt_orders"]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        stdout(&output),
        "Selected 2 model(s) using '+stg_orders,!rpt_orders':\n\
         1. stg_orders (view, staging)\n\
         2. fct_orders (incremental, -)\n"
    );
}

#[test]
fn test_list_nothing_selected() {
    let tmp = TempDir::new().unwrap();
    let graph = write_graph(tmp.path());

    let output = dbt_select(&["ls", "-g", graph.to_str().unwrap(), "-s", "tag:missing"]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout(&output), "No models selected using 'tag:missing'\n");
}

#[test]
fn test_list_json_with_exclude() {
    let tmp = TempDir::new().unwrap();
    let graph = write_graph(tmp.path());

    let output = dbt_select(&["list", "--graph", graph.to_str().unwrap(), "--exclude", "stg_orders", "--json"]);
    assert!(output.status.success(), "{output:?}");
    let names: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(names, vec!["fct_orders", "rpt_orders"]);
}

#[test]
fn test_graph_from_env() {
    let tmp = TempDir::new().unwrap();
    let graph = write_graph(tmp.path());

    let output = Command::new(env!("CARGO_BIN_EXE_dbt-select"))
        .env("DBT_SELECT_GRAPH", &graph)
        .args(["list", "--select", "@fct_orders", "--json"])
        .output()
        .expect("failed to run dbt-select");
    assert!(output.status.success(), "{output:?}");
    let names: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(names, vec!["stg_orders", "fct_orders"]);
}

#[test]
fn test_invalid_selector_exits_non_zero() {
    let tmp = TempDir::new().unwrap();
    let graph = write_graph(tmp.path());

    let output = dbt_select(&["list", "--graph", graph.to_str().unwrap(), "--select", "config.materialized:snapshot"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown materialization kind"));
}

#[test]
fn test_missing_graph_exits_non_zero() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.json");

    let output = dbt_select(&["list", "--graph", missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("loading graph from"));
}

#[test]
fn test_parse_prints_json() {
    let output = dbt_select(&["parse", "!+2@tag:marts"]);
    assert!(output.status.success(), "{output:?}");

    let expr: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let clause = &expr["clauses"][0];
    assert_eq!(clause["method"], serde_json::json!({"method": "tag", "value": "marts"}));
    assert_eq!(clause["children"], serde_json::json!({"max": 2}));
    assert_eq!(clause["parents"], "unbounded");
    assert_eq!(clause["negated"], true);
}
