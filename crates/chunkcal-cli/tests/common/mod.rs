//! Common utilities for CLI E2E tests.
//!
//! Every test gets its own `CHUNKCAL_HOME`, so config and database never
//! leak between tests or into the real data directory.

#![allow(dead_code)]

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

pub fn home() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp home")
}

/// Invoke a CLI command and return (stdout, stderr, exit code).
pub fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_chunkcal"))
        .args(args)
        .env("CHUNKCAL_HOME", home)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

/// Invoke a CLI command and expect success.
pub fn run_cli_success(home: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "CLI command failed: {args:?}\nstderr: {stderr}");
    stdout
}

/// Invoke a CLI command and expect failure; returns stderr.
pub fn run_cli_failure(home: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert!(code != 0, "CLI command unexpectedly succeeded: {args:?}\nstdout: {stdout}");
    stderr
}

/// Id from a "<Thing> created: <id>" first line.
pub fn created_id(stdout: &str) -> String {
    stdout
        .lines()
        .next()
        .and_then(|line| line.split(": ").nth(1))
        .expect("Missing 'created: <id>' line")
        .trim()
        .to_string()
}

/// Parse JSON output from CLI.
pub fn parse_json(json: &str) -> serde_json::Value {
    serde_json::from_str(json).expect("Failed to parse JSON output")
}

/// Create a project and a task, returning the task id.
pub fn seed_task(home: &Path) -> String {
    let project = created_id(&run_cli_success(home, &["project", "create", "Launch"]));
    created_id(&run_cli_success(home, &["task", "create", &project, "Write post"]))
}

/// Add a chunk and return its id.
pub fn add_chunk(home: &Path, task_id: &str, title: &str, energy: &str, order: i32) -> String {
    let order = order.to_string();
    created_id(&run_cli_success(
        home,
        &["chunk", "add", task_id, title, "--energy", energy, "--order", &order],
    ))
}
