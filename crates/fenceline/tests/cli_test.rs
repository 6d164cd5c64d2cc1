//! Integration tests for the `fenceline` binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! and config handling — all without requiring a live power device.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `fenceline` binary with env isolation.
///
/// Clears all `FENCELINE_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn fenceline_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("fenceline");
    cmd.env("HOME", "/tmp/fenceline-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/fenceline-test-nonexistent")
        .env_remove("FENCELINE_PROFILE")
        .env_remove("FENCELINE_IP")
        .env_remove("FENCELINE_USERNAME")
        .env_remove("FENCELINE_PASSWORD")
        .env_remove("FENCELINE_OUTLET")
        .env_remove("FENCELINE_TIMEOUT");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = fenceline_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(
        text.contains("Usage"),
        "Expected 'Usage' in output:\n{text}"
    );
}

#[test]
fn test_help_names_both_device_families() {
    fenceline_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("panel")
            .and(predicate::str::contains("console"))
            .and(predicate::str::contains("power")),
    );
}

#[test]
fn test_version_flag() {
    fenceline_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fenceline"));
}

// ── Action validation ───────────────────────────────────────────────

#[test]
fn test_unknown_action_is_rejected_before_any_io() {
    // "explode" is outside the fixed action set; clap rejects it with a
    // usage error and nothing ever touches the network.
    fenceline_cmd()
        .args(["panel", "explode", "-a", "192.0.2.1", "-l", "admin", "-n", "7"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("explode"));
}

#[test]
fn test_panel_requires_a_device_address() {
    // No ip anywhere: a usage-class failure, not a connection attempt.
    fenceline_cmd()
        .args(["panel", "status"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--ip"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    fenceline_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Config management ───────────────────────────────────────────────

#[test]
fn test_config_init_writes_a_starter_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    fenceline_cmd()
        .args(["config", "init", "--config"])
        .arg(&path)
        .assert()
        .success();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("[profiles."));

    // A second init must refuse to clobber the file.
    fenceline_cmd()
        .args(["config", "init", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_config_path_prints_a_location() {
    fenceline_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_profile_supplies_device_options() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
default_profile = "lab"

[profiles.lab]
ip = "127.0.0.1:1"
username = "admin"
password = "secret"
outlet = "7"
"#,
    )
    .unwrap();

    // The profile resolves fully; the command then fails at the
    // connection stage (exit 7, nothing listens on port 1), not at
    // option validation (exit 2).
    fenceline_cmd()
        .args(["panel", "status", "--config"])
        .arg(&path)
        .args(["--timeout", "2"])
        .assert()
        .failure()
        .code(7);
}
