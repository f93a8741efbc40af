//! Integration tests for the `tuneflow-cli dataset` commands.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

fn cli(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tuneflow-cli").unwrap();
    cmd.current_dir(dir).env("HOME", dir).env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

fn add(dir: &Path, prompt: &str) -> String {
    let output = cli(dir)
        .args(["dataset", "add", "--prompt", prompt, "--response-a", "first", "--response-b", "second", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    value["id"].as_str().unwrap().to_string()
}

fn read_dataset(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_add_creates_dataset_file() {
    let temp_dir = TempDir::new().unwrap();
    add(temp_dir.path(), "  What is DPO?  ");

    let data = read_dataset(&temp_dir.path().join("preference_dataset.json"));
    let records = data.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["prompt"], "What is DPO?");
    assert_eq!(records[0]["responseA"], "first");
    assert!(records[0].get("preference").is_none());
}

#[test]
fn test_add_rejects_blank_prompt() {
    let temp_dir = TempDir::new().unwrap();
    cli(temp_dir.path())
        .args(["dataset", "add", "--prompt", "   ", "--response-a", "a", "--response-b", "b"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("validation error"));

    assert!(!temp_dir.path().join("preference_dataset.json").exists());
}

#[test]
fn test_remove_and_missing_id() {
    let temp_dir = TempDir::new().unwrap();
    let id = add(temp_dir.path(), "one");
    add(temp_dir.path(), "two");

    cli(temp_dir.path())
        .args(["dataset", "remove", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed comparison"));

    cli(temp_dir.path())
        .args(["dataset", "remove", &id, "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"removed\":false"));

    let data = read_dataset(&temp_dir.path().join("preference_dataset.json"));
    assert_eq!(data.as_array().unwrap().len(), 1);
    assert_eq!(data[0]["prompt"], "two");
}

#[test]
fn test_list_empty_dataset() {
    let temp_dir = TempDir::new().unwrap();
    cli(temp_dir.path())
        .args(["dataset", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Comparisons (0)"))
        .stdout(predicate::str::contains("No comparisons"));
}

#[test]
fn test_samples_then_stats() {
    let temp_dir = TempDir::new().unwrap();
    cli(temp_dir.path()).args(["dataset", "samples"]).assert().success();

    let output = cli(temp_dir.path()).args(["dataset", "stats", "--json"]).output().unwrap();
    assert!(output.status.success());
    let stats: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["annotated"], 0);
    assert_eq!(stats["unannotated"], 3);
}

#[test]
fn test_import_appends_and_rejects_malformed() {
    let temp_dir = TempDir::new().unwrap();
    add(temp_dir.path(), "existing");

    let source = temp_dir.path().join("incoming.json");
    std::fs::write(
        &source,
        r#"[{"id":"x1","prompt":"p","responseA":"a","responseB":"b","preference":"A","reasoning":"clearer","created":"2024-05-01T10:00:00Z"}]"#,
    )
    .unwrap();
    cli(temp_dir.path())
        .args(["dataset", "import", source.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 comparisons"));

    let bad = temp_dir.path().join("bad.json");
    std::fs::write(&bad, r#"[{"id":"x2","prompt":"p"}]"#).unwrap();
    cli(temp_dir.path()).args(["dataset", "import", bad.to_str().unwrap()]).assert().failure();

    let data = read_dataset(&temp_dir.path().join("preference_dataset.json"));
    let records = data.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["id"], "x1");
    assert_eq!(records[1]["preference"], "A");
}

#[test]
fn test_export_to_explicit_path() {
    let temp_dir = TempDir::new().unwrap();
    add(temp_dir.path(), "exported");

    let out = temp_dir.path().join("exports").join("snapshot.json");
    cli(temp_dir.path())
        .args(["dataset", "export", "--out", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 comparisons"));

    assert_eq!(read_dataset(&out), read_dataset(&temp_dir.path().join("preference_dataset.json")));
}

#[test]
fn test_export_default_file_name() {
    let temp_dir = TempDir::new().unwrap();
    add(temp_dir.path(), "exported");

    cli(temp_dir.path()).args(["dataset", "export"]).assert().success();

    let exported: Vec<_> = std::fs::read_dir(temp_dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| name.starts_with("dpo_dataset_") && name.ends_with(".json"))
        .collect();
    assert_eq!(exported.len(), 1);
}
