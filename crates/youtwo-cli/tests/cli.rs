//! End-to-end tests for the `youtwo` binary
//!
//! Every test points HOME and XDG_CONFIG_HOME at a temp dir so a developer's
//! own config file never leaks in.

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const FRIENDS: &str = r#"{
    "entities": [
        {"name": "Alice", "entityType": "person"},
        {"name": "Bob", "entityType": "person"},
        {"name": "Acme", "entityType": "organization"}
    ],
    "relations": [
        {"from": "Alice", "to": "Bob", "relationType": "knows"},
        {"source": "Bob", "target": "Acme", "relationType": "works_at"}
    ]
}"#;

fn youtwo(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("youtwo").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("CONVEX_URL")
        .env_remove("YOUTWO_OUTPUT_DIR")
        .env_remove("RUST_LOG");
    cmd
}

fn graph_file(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("graph.json");
    fs::write(&path, FRIENDS).unwrap();
    path
}

#[test]
fn test_help_lists_subcommands() {
    let temp = TempDir::new().unwrap();
    youtwo(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("visualize"))
        .stdout(predicate::str::contains("pipeline"))
        .stdout(predicate::str::contains("functions"));
}

#[test]
fn test_version() {
    let temp = TempDir::new().unwrap();
    youtwo(temp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_visualize_json_with_builtin_svg() {
    let temp = TempDir::new().unwrap();
    let graph = graph_file(temp.path());
    let out = temp.path().join("out");

    youtwo(temp.path())
        .args(["visualize", "--builtin", "--format", "svg", "--save-data"])
        .arg("--json")
        .arg(&graph)
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("knowledge_graph.svg"))
        .stdout(predicate::str::contains("knowledge_graph_data.json"));

    let svg = fs::read_to_string(out.join("knowledge_graph.svg")).unwrap();
    assert!(svg.starts_with("<svg") || svg.starts_with("<?xml"));
    assert!(svg.contains("Alice"));

    let data: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("knowledge_graph_data.json")).unwrap())
            .unwrap();
    assert_eq!(data["entities"].as_array().unwrap().len(), 3);
    assert_eq!(data["relations"][1]["from"], "Bob");
}

#[test]
fn test_visualize_dot_honors_limits() {
    let temp = TempDir::new().unwrap();
    let graph = graph_file(temp.path());

    youtwo(temp.path())
        .args(["visualize", "--format", "dot", "--max-nodes", "2", "--filename", "small"])
        .arg("--json")
        .arg(&graph)
        .arg("--output-dir")
        .arg(temp.path())
        .assert()
        .success();

    let dot = fs::read_to_string(temp.path().join("small.dot")).unwrap();
    assert!(dot.contains("Alice"));
    assert!(dot.contains("Bob"));
    assert!(!dot.contains("Acme"));
    assert!(!dot.contains("works_at"));
}

#[test]
fn test_visualize_missing_file_fails() {
    let temp = TempDir::new().unwrap();
    youtwo(temp.path())
        .args(["visualize", "--builtin", "--format", "svg", "--json", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("missing.json"));

    assert!(!temp.path().join("data").exists());
}

#[test]
fn test_visualize_without_source_needs_convex_url() {
    let temp = TempDir::new().unwrap();
    youtwo(temp.path())
        .args(["visualize", "--builtin", "--format", "svg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONVEX_URL"));
}

#[test]
fn test_pipeline_text_report() {
    let temp = TempDir::new().unwrap();
    let graph = graph_file(temp.path());

    youtwo(temp.path())
        .args(["pipeline", "--topic", "Friends"])
        .arg("--json")
        .arg(&graph)
        .arg("--cache-dir")
        .arg(temp.path().join("cache"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Validation report"))
        .stdout(predicate::str::contains("nodes:     3"))
        .stdout(predicate::str::contains("edges:     2"));
}

#[test]
fn test_pipeline_json_report() {
    let temp = TempDir::new().unwrap();
    let graph = graph_file(temp.path());
    let cache = temp.path().join("cache");

    let output = youtwo(temp.path())
        .args(["pipeline", "--no-frozen", "--format", "json"])
        .arg("--json")
        .arg(&graph)
        .arg("--cache-dir")
        .arg(&cache)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["report"]["num_nodes"], 3);
    assert_eq!(report["report"]["num_edges"], 2);
    assert_eq!(report["report"]["is_connected"], true);
    assert_eq!(report["report"]["has_cycles"], false);
    assert_eq!(report["stages"].as_array().unwrap().last().unwrap(), "done");

    // the fetched snapshot was cached
    assert_eq!(fs::read_dir(&cache).unwrap().count(), 1);
}

#[test]
fn test_call_rejects_bad_args() {
    let temp = TempDir::new().unwrap();
    youtwo(temp.path())
        .args(["call", "view_graph", "--args", "[1, 2]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("JSON object"));
}

#[test]
fn test_config_init_then_show() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("youtwo.toml");

    youtwo(temp.path())
        .args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config file at"));
    assert!(config_path.exists());

    fs::write(&config_path, "[output]\nformat = \"svg\"\n").unwrap();
    youtwo(temp.path())
        .args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"))
        .stderr(predicate::str::contains("--force"));
    assert!(fs::read_to_string(&config_path).unwrap().contains("svg"));

    youtwo(temp.path())
        .args(["config", "init", "--force", "--path"])
        .arg(&config_path)
        .assert()
        .success();

    youtwo(temp.path())
        .arg("-C")
        .arg(&config_path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[output]"))
        .stdout(predicate::str::contains("rankdir"));
}

#[test]
fn test_config_show_applies_environment() {
    let temp = TempDir::new().unwrap();
    youtwo(temp.path())
        .env("CONVEX_URL", "https://happy-otter-123.convex.cloud")
        .args(["config", "show", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("happy-otter-123.convex.cloud"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let temp = TempDir::new().unwrap();
    youtwo(temp.path())
        .args(["-C", "nope.toml", "config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}
