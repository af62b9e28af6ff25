//! Smoke tests for the macrolog binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn macrolog(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("macrolog").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("MACROLOG_CONFIG")
        .env_remove("MACROLOG_API_URL")
        .env_remove("MACROLOG_ENV")
        .env_remove("RUST_LOG")
        .env("MACROLOG_SESSION_FILE", dir.path().join("session.json"));
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    macrolog(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("entries"))
        .stdout(predicate::str::contains("notifications"));
}

#[test]
fn test_status_logged_out_json() {
    let dir = TempDir::new().unwrap();
    macrolog(&dir)
        .args(["--format", "json", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"state\": \"logged_out\""));
}

#[test]
fn test_status_reads_stored_session() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("session.json"),
        r#"{"auth.access_token": "A1", "auth.refresh_token": "R1"}"#,
    )
    .unwrap();

    macrolog(&dir)
        .args(["--format", "json", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"state\": \"authenticated\""));
}

#[test]
fn test_entries_without_session_hints_login() {
    let dir = TempDir::new().unwrap();
    // Unroutable backend: the command must fail before any request is sent.
    macrolog(&dir)
        .args(["--api-url", "http://127.0.0.1:9", "entries", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Session expired"))
        .stderr(predicate::str::contains("macrolog login"));
}

#[test]
fn test_missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    macrolog(&dir)
        .args(["--config", "does-not-exist.toml", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_invalid_meal_rejected() {
    let dir = TempDir::new().unwrap();
    macrolog(&dir)
        .args(["entries", "add", "toast", "--meal", "brunch"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown meal type"));
}

#[test]
fn test_update_without_fields_fails() {
    let dir = TempDir::new().unwrap();
    macrolog(&dir)
        .args(["entries", "update", "e1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to update"));
}
