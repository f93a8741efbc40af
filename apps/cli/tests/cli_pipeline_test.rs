//! Integration tests for the `tuneflow-cli pipeline` commands.

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

fn run_json(cmd: &mut Command) -> Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_list_builtin_pipelines() {
    let temp_dir = TempDir::new().unwrap();
    let pipelines = run_json(cli(temp_dir.path()).args(["pipeline", "list", "--json"]));

    assert_eq!(pipelines[0]["name"], "dpo");
    assert_eq!(pipelines[0]["steps"], 6);
    assert_eq!(pipelines[1]["name"], "rlhf");
    assert_eq!(pipelines[1]["steps"], 5);
}

#[test]
fn test_show_default_pipeline() {
    let temp_dir = TempDir::new().unwrap();
    cli(temp_dir.path())
        .args(["pipeline", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Direct Preference Optimization"))
        .stdout(predicate::str::contains("Running"))
        .stdout(predicate::str::contains("33%"))
        .stdout(predicate::str::contains("2 of 6 steps completed"))
        .stdout(predicate::str::contains("Processing batch 342/500"));
}

#[test]
fn test_show_rlhf_json() {
    let temp_dir = TempDir::new().unwrap();
    let view = run_json(cli(temp_dir.path()).args(["pipeline", "show", "rlhf", "--json"]));

    assert_eq!(view["title"], "Reinforcement Learning from Human Feedback");
    assert_eq!(view["completionPercent"], 40);
    assert_eq!(view["running"], true);
    assert_eq!(view["steps"][2]["currentStatus"], "in-progress");
}

#[test]
fn test_set_step_statuses() {
    let temp_dir = TempDir::new().unwrap();
    let view = run_json(cli(temp_dir.path()).args([
        "pipeline",
        "show",
        "dpo",
        "--set",
        "preference-modeling=completed",
        "--set",
        "dpo-optimization=in-progress",
        "--paused",
        "--json",
    ]));

    assert_eq!(view["completionPercent"], 50);
    assert_eq!(view["running"], false);
    assert_eq!(view["counts"]["inProgress"], 1);
    assert_eq!(view["steps"][3]["currentStatus"], "in-progress");
    assert!(view["steps"][3]["startedAt"].is_string());
}

#[test]
fn test_reset_restores_initial_statuses() {
    let temp_dir = TempDir::new().unwrap();
    let view = run_json(cli(temp_dir.path()).args(["pipeline", "show", "--reset", "--json"]));
    assert_eq!(view["completionPercent"], 33);
    assert_eq!(view["counts"]["completed"], 2);
    assert_eq!(view["counts"]["pending"], 3);
}

#[test]
fn test_unknown_pipeline_and_step() {
    let temp_dir = TempDir::new().unwrap();
    cli(temp_dir.path())
        .args(["pipeline", "show", "ppo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pipeline not found: ppo"));

    cli(temp_dir.path())
        .args(["pipeline", "show", "--set", "nope=completed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("step 'nope' not found"));

    cli(temp_dir.path()).args(["pipeline", "show", "--set", "evaluation=paused"]).assert().failure();
}

#[test]
fn test_custom_catalogue_from_config() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("pipelines.toml"),
        r#"
[[pipelines]]
name = "sft"
title = "Supervised Fine-tuning"

[[pipelines.steps]]
id = "collect"
title = "Collect demonstrations"
description = "Gather instruction data"
status = "completed"

[[pipelines.steps]]
id = "train"
title = "Train"
description = "Fine-tune the base model"
"#,
    )
    .unwrap();
    std::fs::write(temp_dir.path().join(".tuneflowrc"), "catalogue = \"pipelines.toml\"\n").unwrap();

    let view = run_json(cli(temp_dir.path()).args(["pipeline", "show", "--json"]));
    assert_eq!(view["name"], "sft");
    assert_eq!(view["completionPercent"], 50);

    cli(temp_dir.path())
        .args(["pipeline", "show", "dpo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pipeline not found: dpo"));
}
