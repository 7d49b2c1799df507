//! CLI end-to-end tests
//!
//! Tests for the mama command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the mama binary
#[allow(deprecated)]
fn mama_cmd() -> Command {
    Command::cargo_bin("mama").unwrap()
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = mama_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = mama_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("mama "));
}

#[test]
fn test_cli_start_help() {
    let mut cmd = mama_cmd();
    cmd.args(["start", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Serve the configured directory"));
}

#[test]
fn test_cli_start_invalid_port() {
    let mut cmd = mama_cmd();
    cmd.args(["start", "--port", "not-a-port"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_cli_check_tools_command() {
    let mut cmd = mama_cmd();
    cmd.arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffmpeg"));
}

#[test]
fn test_cli_tag_then_untag() {
    let temp = tempdir().unwrap();
    let file = temp.path().join("holiday.jpg");
    fs::write(&file, b"not much of a photo").unwrap();

    let output = mama_cmd().arg("tag").arg(&file).output().unwrap();
    assert!(output.status.success());
    let stored = String::from_utf8(output.stdout).unwrap().trim().to_string();
    assert!(stored.starts_with("holiday."));
    assert!(stored.ends_with(".jpg"));
    assert_ne!(stored, "holiday.jpg");

    mama_cmd()
        .args(["untag", &stored])
        .assert()
        .success()
        .stdout("holiday.jpg\n");
}

#[test]
fn test_cli_tag_nonexistent_file() {
    let mut cmd = mama_cmd();
    cmd.args(["tag", "/nonexistent/path/photo.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open"));
}

#[test]
fn test_cli_untag_plain_name() {
    let mut cmd = mama_cmd();
    cmd.args(["untag", "plain.txt"])
        .assert()
        .success()
        .stdout("plain.txt\n");
}

#[test]
fn test_cli_config_validation() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("config.toml");

    fs::write(
        &config_file,
        r#"
[server]
host = "127.0.0.1"
port = 8080

[auth]
users = ["admin:admin"]
"#,
    )
    .unwrap();

    let mut cmd = mama_cmd();
    cmd.args(["validate", config_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("Auth enabled: true"));
}

#[test]
fn test_cli_config_validation_failure() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("config.toml");
    fs::write(&config_file, "[server]\nport = 0\n").unwrap();

    let mut cmd = mama_cmd();
    cmd.args(["validate", config_file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("port cannot be 0"));
}
