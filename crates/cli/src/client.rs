// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use bell_core::{BlastView, Reaction};
use bell_daemon::protocol::{self, ProtocolError};
use bell_daemon::{Config, ConfigError, Request, Response};
use serde_json::Value;
use thiserror::Error;
use tokio::net::UnixStream;

/// Client-side timing; each value can be overridden in milliseconds through
/// `BELL_TIMEOUT_IPC_MS`, `BELL_TIMEOUT_CONNECT_MS`, `BELL_TIMEOUT_EXIT_MS` and
/// `BELL_POLL_INTERVAL_MS`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Per message read or write
    pub ipc: Duration,
    /// Waiting for a freshly spawned daemon to answer
    pub connect: Duration,
    /// Waiting for a stopped daemon to exit
    pub exit: Duration,
    pub poll: Duration,
}

impl Timeouts {
    pub fn from_env(config: &Config) -> Self {
        let ms = |var: &str, default: Duration| {
            std::env::var(var)
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .map_or(default, Duration::from_millis)
        };
        Self {
            ipc: ms("BELL_TIMEOUT_IPC_MS", config.ipc_timeout),
            connect: ms("BELL_TIMEOUT_CONNECT_MS", Duration::from_secs(5)),
            exit: ms("BELL_TIMEOUT_EXIT_MS", Duration::from_secs(2)),
            poll: ms("BELL_POLL_INTERVAL_MS", Duration::from_millis(50)),
        }
    }
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running")]
    DaemonNotRunning,

    #[error("Failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("Connection timeout waiting for daemon to start")]
    DaemonStartTimeout,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The daemon answered with an error response
    #[error("{message} ({status})")]
    Rejected { status: u16, message: String },

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Daemon client
pub struct DaemonClient {
    socket_path: PathBuf,
    timeouts: Timeouts,
}

impl DaemonClient {
    /// Connect to an existing daemon (no auto-start)
    pub fn connect(config: &Config) -> Result<Self, ClientError> {
        if !config.socket_path.exists() {
            return Err(ClientError::DaemonNotRunning);
        }

        Ok(Self {
            socket_path: config.socket_path.clone(),
            timeouts: Timeouts::from_env(config),
        })
    }

    /// Send a request and receive a response
    pub async fn send(&self, request: Request) -> Result<Response, ClientError> {
        let stream = match UnixStream::connect(&self.socket_path).await {
            Ok(stream) => stream,
            // Socket file left behind by a daemon that is gone
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
                return Err(ClientError::DaemonNotRunning)
            }
            Err(e) => return Err(e.into()),
        };
        let (mut reader, mut writer) = stream.into_split();

        let data = protocol::encode(&request)?;
        tokio::time::timeout(self.timeouts.ipc, protocol::write_message(&mut writer, &data))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        let response_bytes = tokio::time::timeout(self.timeouts.ipc, protocol::read_message(&mut reader))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        match protocol::decode(&response_bytes)? {
            Response::Error { status, error } => Err(ClientError::Rejected {
                status,
                message: error,
            }),
            response => Ok(response),
        }
    }

    async fn send_for_blast(&self, request: Request) -> Result<BlastView, ClientError> {
        match self.send(request).await? {
            Response::Blast { blast } => Ok(*blast),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Post a blast; `body` uses the web field names (`householdId`, ...)
    pub async fn create_blast(&self, body: Value) -> Result<BlastView, ClientError> {
        self.send_for_blast(Request::CreateBlast { body }).await
    }

    pub async fn list_blasts(
        &self,
        household_id: &str,
        status: Option<&str>,
    ) -> Result<Vec<BlastView>, ClientError> {
        match self
            .send(Request::ListBlasts {
                household_id: Some(household_id.to_string()),
                status: status.map(str::to_string),
            })
            .await?
        {
            Response::Blasts { blasts } => Ok(blasts),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn get_blast(&self, id: &str) -> Result<BlastView, ClientError> {
        self.send_for_blast(Request::GetBlast { id: id.to_string() })
            .await
    }

    pub async fn react(
        &self,
        blast_id: &str,
        body: Value,
    ) -> Result<(Reaction, BlastView), ClientError> {
        match self
            .send(Request::React {
                blast_id: blast_id.to_string(),
                body,
            })
            .await?
        {
            Response::Reacted { reaction, blast } => Ok((reaction, *blast)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn mark_done(&self, blast_id: &str, body: Value) -> Result<BlastView, ClientError> {
        self.send_for_blast(Request::MarkDone {
            blast_id: blast_id.to_string(),
            body,
        })
        .await
    }

    /// Get daemon status
    pub async fn status(&self) -> Result<DaemonStatus, ClientError> {
        match self.send(Request::Status).await? {
            Response::Status {
                uptime_secs,
                blasts_open,
                blasts_claimed,
                blasts_done,
            } => Ok(DaemonStatus {
                uptime_secs,
                blasts_open,
                blasts_claimed,
                blasts_done,
            }),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Request daemon shutdown
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(Request::Shutdown).await? {
            Response::ShuttingDown => Ok(()),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Get daemon version via Hello handshake
    pub async fn hello(&self) -> Result<String, ClientError> {
        match self
            .send(Request::Hello {
                version: env!("CARGO_PKG_VERSION").to_string(),
            })
            .await?
        {
            Response::Hello { version } => Ok(version),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }
}

/// Counters reported by `Status`
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DaemonStatus {
    pub uptime_secs: u64,
    pub blasts_open: usize,
    pub blasts_claimed: usize,
    pub blasts_done: usize,
}

/// Start the daemon in the background and wait until it answers
pub async fn daemon_start(config: &Config) -> Result<DaemonClient, ClientError> {
    let timeouts = Timeouts::from_env(config);
    let mut child = Command::new(find_belld_binary())
        .arg(&config.state_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(e.to_string()))?;

    let deadline = Instant::now() + timeouts.connect;
    while Instant::now() < deadline {
        // An early exit means startup failed; its reason is in the log
        if let Ok(Some(status)) = child.try_wait() {
            let exit_deadline = Instant::now() + timeouts.exit;
            while Instant::now() < exit_deadline {
                if let Some(err) = read_startup_error(&config.log_path) {
                    return Err(ClientError::DaemonStartFailed(err));
                }
                tokio::time::sleep(timeouts.poll).await;
            }
            return Err(ClientError::DaemonStartFailed(format!(
                "exited with {}",
                status
            )));
        }

        if let Ok(client) = DaemonClient::connect(config) {
            if client.hello().await.is_ok() {
                return Ok(client);
            }
        }
        tokio::time::sleep(timeouts.poll).await;
    }

    Err(read_startup_error(&config.log_path)
        .map_or(ClientError::DaemonStartTimeout, ClientError::DaemonStartFailed))
}

/// Ask the daemon to stop, killing it if it does not exit in time
///
/// Returns false when no daemon was running.
pub async fn daemon_stop(config: &Config) -> Result<bool, ClientError> {
    let client = match DaemonClient::connect(config) {
        Ok(c) => c,
        Err(ClientError::DaemonNotRunning) => return Ok(false),
        Err(e) => return Err(e),
    };

    let graceful = match client.shutdown().await {
        Err(ClientError::DaemonNotRunning) => return Ok(false),
        result => result.is_ok(),
    };

    let Some(pid) = read_daemon_pid(&config.lock_path) else {
        return Ok(true);
    };
    let timeouts = client.timeouts;
    if graceful && wait_for_exit(pid, timeouts).await {
        return Ok(true);
    }
    if process_exists(pid) {
        kill(pid, "-9");
        wait_for_exit(pid, timeouts).await;
    }
    Ok(true)
}

async fn wait_for_exit(pid: u32, timeouts: Timeouts) -> bool {
    let deadline = Instant::now() + timeouts.exit;
    while Instant::now() < deadline {
        if !process_exists(pid) {
            return true;
        }
        tokio::time::sleep(timeouts.poll).await;
    }
    false
}

/// Locate `belld`: `BELL_DAEMON_BINARY`, next to this executable, then PATH
fn find_belld_binary() -> PathBuf {
    if let Ok(path) = std::env::var("BELL_DAEMON_BINARY") {
        return PathBuf::from(path);
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("belld");
            if sibling.exists() {
                return sibling;
            }
        }
    }

    PathBuf::from("belld")
}

/// PID recorded in the daemon lock file, if any
pub fn read_daemon_pid(lock_path: &Path) -> Option<u32> {
    std::fs::read_to_string(lock_path)
        .ok()
        .and_then(|content| content.trim().parse::<u32>().ok())
}

pub fn process_exists(pid: u32) -> bool {
    kill(pid, "-0")
}

/// Run `kill <signal> <pid>`; true when the signal was delivered
fn kill(pid: u32, signal: &str) -> bool {
    Command::new("kill")
        .args([signal, &pid.to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

/// Startup marker prefix that daemon writes to log before anything else.
/// Full format: "--- belld: starting (pid: 12345) ---"
const STARTUP_MARKER_PREFIX: &str = "--- belld: starting (pid: ";

/// Errors logged since the last startup marker, if any
pub fn read_startup_error(log_path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(log_path).ok()?;

    let start_pos = content.rfind(STARTUP_MARKER_PREFIX)?;
    let startup_log = &content[start_pos..];

    let errors: Vec<&str> = startup_log
        .lines()
        .filter(|line| line.contains(" ERROR ") || line.contains("Failed to start"))
        .collect();

    if errors.is_empty() {
        return None;
    }

    // Strip "timestamp LEVEL target: " prefixes where present
    let messages: Vec<&str> = errors
        .iter()
        .map(|line| line.split_once(": ").map_or(*line, |(_, msg)| msg))
        .collect();
    Some(messages.join("\n"))
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
