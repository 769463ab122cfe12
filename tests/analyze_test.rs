use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("python")
        .join(name)
}

fn pysurvey() -> Command {
    Command::cargo_bin("pysurvey").unwrap()
}

#[test]
fn analyze_webshop_json() {
    let output = pysurvey()
        .args(["analyze", fixture_path("webshop").to_str().unwrap(), "--quiet"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["metadata"]["files_parsed"], 4);
    assert_eq!(value["metadata"]["files_failed"], 0);
    assert_eq!(value["report"]["totals"]["endpoints"], 4);
    assert_eq!(value["report"]["totals"]["client_calls"], 3);
    assert_eq!(value["report"]["files"][0]["path"], "app.py");
    assert_eq!(value["report"]["files"][0]["endpoints"][0]["framework"], "flask");
}

#[test]
fn analyze_webshop_text() {
    pysurvey()
        .args([
            "analyze",
            fixture_path("webshop").to_str().unwrap(),
            "--format",
            "text",
            "--quiet",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("pysurvey Analysis Report"))
        .stdout(predicate::str::contains("Endpoints:    4"))
        .stdout(predicate::str::contains("services/inventory.py"));
}

#[test]
fn analyze_dot_emits_call_graph() {
    pysurvey()
        .args([
            "analyze",
            fixture_path("webshop").to_str().unwrap(),
            "--format",
            "dot",
            "--quiet",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("digraph calls"))
        .stdout(predicate::str::contains(
            "\"app.py::items\" -> \"app.py::_bump\"",
        ));
}

#[test]
fn analyze_single_file() {
    let file = fixture_path("orders_api").join("main.py");
    let output = pysurvey()
        .args(["analyze", file.to_str().unwrap(), "--quiet", "--jobs", "1"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["report"]["files"][0]["path"], "main.py");
    assert_eq!(value["report"]["totals"]["endpoints"], 4);
}

#[test]
fn analyze_exclude_pattern() {
    let output = pysurvey()
        .args([
            "analyze",
            fixture_path("webshop").to_str().unwrap(),
            "--exclude",
            "tests/**",
            "--quiet",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["metadata"]["files_parsed"], 3);
    assert_eq!(value["report"]["totals"]["tests"], 0);
}

#[test]
fn broken_files_still_exit_zero() {
    let output = pysurvey()
        .args(["analyze", fixture_path("broken").to_str().unwrap(), "--quiet"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["metadata"]["files_failed"], 1);
    let diagnostics = value["report"]["diagnostics"].as_array().unwrap();
    assert!(diagnostics
        .iter()
        .any(|d| d["file"] == "binary.py" && d["kind"] == "file_level"));
}

#[test]
fn summary_goes_to_stderr_unless_quiet() {
    pysurvey()
        .args(["analyze", fixture_path("orders_api").to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("Analyzed 1 files"));
}

#[test]
fn empty_directory_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    pysurvey()
        .args(["analyze", tmp.path().to_str().unwrap(), "--quiet"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No Python files found"));
}

#[test]
fn missing_path_is_an_error() {
    pysurvey()
        .args(["analyze", "/nonexistent/pysurvey/project", "--quiet"])
        .assert()
        .failure();
}

#[test]
fn graph_json_export() {
    let output = pysurvey()
        .args([
            "graph",
            fixture_path("webshop").to_str().unwrap(),
            "--format",
            "json",
            "--quiet",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let edges = value["edges"].as_array().unwrap();
    assert!(edges
        .iter()
        .any(|e| e["from"] == "services/inventory.py::InventoryClient.stock"
            && e["to"] == "httpx.AsyncClient"));
}

#[test]
fn graph_defaults_to_dot() {
    pysurvey()
        .args(["graph", fixture_path("orders_api").to_str().unwrap(), "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("digraph calls"));
}
