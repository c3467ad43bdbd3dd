// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests driving the `hearth` binary as separate processes.
//!
//! Each test writes its own config into a temp directory, so store, lock,
//! and bus never collide between tests.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};

use serde_json::{Value, json};
use tempfile::TempDir;

struct Host {
    dir: TempDir,
    config: PathBuf,
}

impl Host {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("hearth.toml");
        std::fs::write(&config, config_toml(dir.path())).unwrap();
        Self { dir, config }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_hearth"));
        cmd.arg("--config").arg(&self.config);
        cmd.env("RUST_LOG", "hearth=warn");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command().args(args).output().unwrap()
    }

    fn exec_json(&self, args: &[&str]) -> (Value, String) {
        let mut full = vec!["exec"];
        full.extend_from_slice(args);
        let out = self.run(&full);
        let stderr = String::from_utf8_lossy(&out.stderr).to_string();
        assert!(out.status.success(), "exec failed: {stderr}");
        (serde_json::from_slice(&out.stdout).unwrap(), stderr)
    }

    fn owner_alive(&self) -> bool {
        let out = self.run(&["status", "--json"]);
        assert!(out.status.success());
        let status: Value = serde_json::from_slice(&out.stdout).unwrap();
        status["owner_alive"].as_bool().unwrap()
    }

    fn spawn_serve(&self) -> ServeGuard {
        let child = self
            .command()
            .arg("serve")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();
        ServeGuard(child)
    }
}

/// Kills the serving process even when an assertion fails.
struct ServeGuard(Child);

impl Drop for ServeGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

fn config_toml(root: &Path) -> String {
    format!(
        r#"
[storage]
database_path = "{db}"

[election]
lock_dir = "{run}"
reelection_delay_ms = 10

[bus]
directory = "{bus}"
query_timeout_ms = 3000
"#,
        db = root.join("hearth.db").display(),
        run = root.join("run").display(),
        bus = root.join("bus").display(),
    )
}

fn wait_until(mut ready: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !ready() {
        assert!(Instant::now() < deadline, "timed out waiting for condition");
        std::thread::sleep(Duration::from_millis(50));
    }
}

#[test]
fn exec_on_fresh_store_sees_seed_data() {
    let host = Host::new();
    let (row, stderr) = host.exec_json(&["SELECT value FROM counter", "--mode", "first"]);
    assert_eq!(row, json!({"value": 42}));
    assert!(stderr.contains("role: owner"), "stderr: {stderr}");
    assert!(host.dir.path().join("hearth.db").exists());
}

#[test]
fn exec_writes_persist_between_invocations() {
    let host = Host::new();
    let (run, _) = host.exec_json(&[
        "UPDATE counter SET value = value + ? WHERE id = 1",
        "--param",
        "8",
        "--mode",
        "run",
    ]);
    assert_eq!(run["meta"]["changes"], json!(1));

    let (row, _) = host.exec_json(&["SELECT value FROM counter", "--mode", "first"]);
    assert_eq!(row, json!({"value": 50}));
}

#[test]
fn exec_reports_statement_errors_with_nonzero_exit() {
    let host = Host::new();
    let out = host.run(&["exec", "SELECT * FROM missing_table"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("statement failed"), "stderr: {stderr}");
}

#[test]
fn status_without_owner() {
    let host = Host::new();
    assert!(!host.owner_alive());
}

#[cfg(unix)]
#[test]
fn exec_routes_through_a_serving_owner() {
    let host = Host::new();
    let _serve = host.spawn_serve();
    wait_until(|| host.owner_alive());

    let (run, stderr) = host.exec_json(&[
        "INSERT INTO notes (text) VALUES (?)",
        "-p",
        "from a proxy",
        "--mode",
        "run",
    ]);
    assert!(stderr.contains("role: proxy"), "stderr: {stderr}");
    assert_eq!(run["meta"]["changes"], json!(1));

    let (all, _) = host.exec_json(&["SELECT text FROM notes ORDER BY id"]);
    let texts: Vec<&str> = all["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts.len(), 4);
    assert_eq!(texts[3], "from a proxy");
}

#[cfg(unix)]
#[test]
fn next_process_takes_over_after_owner_dies() {
    let host = Host::new();
    {
        let _serve = host.spawn_serve();
        wait_until(|| host.owner_alive());
        let (_, stderr) = host.exec_json(&["UPDATE counter SET value = 7", "--mode", "run"]);
        assert!(stderr.contains("role: proxy"));
    }
    wait_until(|| !host.owner_alive());

    let (row, stderr) = host.exec_json(&["SELECT value FROM counter", "--mode", "first"]);
    assert!(stderr.contains("role: owner"), "stderr: {stderr}");
    assert_eq!(row, json!({"value": 7}));
}

#[test]
fn invalid_config_exits_with_error() {
    let host = Host::new();
    std::fs::write(&host.config, "[bus]\nquery_timout_ms = 5\n").unwrap();
    let out = host.run(&["status"]);
    assert_eq!(out.status.code(), Some(1));
}
