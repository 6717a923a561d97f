// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI integration tests
//!
//! The daemon runs in-process on a private runtime; `bell` is the real binary
//! pointed at the same state directory.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(deprecated)]

use std::sync::Arc;

use assert_cmd::Command;
use bell_daemon::{lifecycle, server, Config};
use predicates::prelude::*;
use tempfile::TempDir;
use tokio::sync::Notify;

struct TestDaemon {
    dir: TempDir,
    shutdown: Arc<Notify>,
    runtime: tokio::runtime::Runtime,
}

impl TestDaemon {
    fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::for_state_dir(dir.path().to_path_buf()).unwrap();
        let runtime = tokio::runtime::Runtime::new().unwrap();

        let daemon = runtime.block_on(lifecycle::startup(&config)).unwrap();
        let shutdown = Arc::clone(&daemon.context.shutdown);
        runtime.spawn(async move {
            let mut daemon = daemon;
            server::serve(&daemon.listener, &daemon.context).await;
            let _ = daemon.shutdown();
        });

        Self {
            dir,
            shutdown,
            runtime,
        }
    }

    fn bell(&self) -> Command {
        let mut cmd = Command::cargo_bin("bell").unwrap();
        cmd.env("BELL_STATE_DIR", self.dir.path())
            .env("BELL_TIMEOUT_IPC_MS", "5000");
        cmd
    }

    fn bell_json(&self, args: &[&str]) -> serde_json::Value {
        let output = self
            .bell()
            .args(["--output", "json"])
            .args(args)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "bell {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    fn create(&self) -> String {
        let blast = self.bell_json(&[
            "blast",
            "create",
            "--household",
            "h-1",
            "--member",
            "alice",
            "--category",
            "Kitchen",
            "--event",
            "Dishwasher",
        ]);
        assert_eq!(blast["status"], "OPEN");
        assert_eq!(blast["urgency"], "whenever");
        blast["id"].as_str().unwrap().to_string()
    }
}

impl Drop for TestDaemon {
    fn drop(&mut self) {
        self.shutdown.notify_one();
        // Give the serve task a moment to remove its files
        self.runtime
            .block_on(async { tokio::time::sleep(std::time::Duration::from_millis(50)).await });
    }
}

#[test]
fn help_lists_commands() {
    Command::cargo_bin("bell")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("blast"))
        .stdout(predicate::str::contains("daemon"));
}

#[test]
fn commands_fail_without_daemon() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("bell")
        .unwrap()
        .env("BELL_STATE_DIR", dir.path())
        .args(["blast", "list", "--household", "h-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: Daemon not running"));
}

#[test]
fn stop_without_daemon_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("bell")
        .unwrap()
        .env("BELL_STATE_DIR", dir.path())
        .args(["daemon", "stop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Daemon not running"));
}

#[test]
fn claim_and_done_through_the_cli() {
    let daemon = TestDaemon::start();
    let id = daemon.create();

    let reacted = daemon.bell_json(&["blast", "react", &id, "--member", "bob", "--kind", "MINE"]);
    assert_eq!(reacted["reaction"]["kind"], "MINE");
    assert_eq!(reacted["blast"]["status"], "CLAIMED");
    assert_eq!(reacted["blast"]["claimedByMemberId"], "bob");

    daemon
        .bell()
        .args(["blast", "done", &id, "--member", "carol"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "error: Only the person who claimed this can mark it done (403)",
        ));

    let done = daemon.bell_json(&["blast", "done", &id, "--member", "bob"]);
    assert_eq!(done["status"], "DONE");
    assert_eq!(done["doneByMemberId"], "bob");

    daemon
        .bell()
        .args(["blast", "show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Status: DONE"))
        .stdout(predicate::str::contains("bob MINE"));
}

#[test]
fn list_filters_and_validation_errors() {
    let daemon = TestDaemon::start();
    let first = daemon.create();
    let _second = daemon.create();
    daemon.bell_json(&["blast", "react", &first, "--member", "bob", "--kind", "ON_IT"]);

    let claimed = daemon.bell_json(&["blast", "list", "--household", "h-1", "--status", "CLAIMED"]);
    let claimed = claimed.as_array().unwrap();
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0]["id"], first.as_str());

    daemon
        .bell()
        .args(["blast", "list", "--household", "h-1", "--status", "LATER"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: Invalid status (400)"));

    daemon
        .bell()
        .args(["blast", "react", &first, "--member", "bob", "--kind", "MAYBE"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid reaction kind (400)"));

    daemon
        .bell()
        .args(["blast", "show", "no-such-blast"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Blast not found (404)"));

    daemon
        .bell()
        .args(["daemon", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 open, 1 claimed, 0 done"));
}
