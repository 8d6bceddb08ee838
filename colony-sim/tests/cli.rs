// The cargo_bin! macro requires build script setup that's overkill for simple tests.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command as AssertCommand;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

#[test]
fn test_help_flag() {
    let mut cmd = Command::new(cargo_bin("colony-sim"));
    let output = cmd.arg("--help").output().expect("failed to execute");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("--turns"));
    assert!(stdout.contains("--events"));
}

#[test]
fn test_short_run_logs_each_turn() {
    AssertCommand::new(cargo_bin("colony-sim"))
        .args(["-t", "3", "--seed", "7"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Turn 3 |"))
        .stderr(predicate::str::contains("Simulation finished"));
}

#[test]
fn test_missing_config_fails() {
    let output = Command::new(cargo_bin("colony-sim"))
        .args(["--config", "/nonexistent/colony.json", "-t", "1"])
        .output()
        .expect("failed to execute process");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("/nonexistent/colony.json"),
        "Should name the config path. Stderr: {}",
        stderr
    );
}

#[test]
fn test_config_file_is_accepted() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "growth_multiplier": 2.0 }}"#).unwrap();

    AssertCommand::new(cargo_bin("colony-sim"))
        .arg("--config")
        .arg(file.path())
        .args(["-t", "2"])
        .assert()
        .success();
}

#[test]
fn test_events_written_as_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");

    // A raid large enough to carry the capital on the first turn
    AssertCommand::new(cargo_bin("colony-sim"))
        .arg("--events")
        .arg(&path)
        .args(["-t", "2", "--invasion-turn", "1", "--invasion-size", "500"])
        .assert()
        .success()
        .stderr(predicate::str::contains("invasion"));

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(!text.is_empty());
    for line in text.lines() {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(value.is_object());
    }
}
