// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration
//!
//! Everything lives under one state directory: `BELL_STATE_DIR` when set,
//! otherwise the platform state (or local data) directory plus `bell`. An
//! optional `config.toml` there can override the socket path, log filter and
//! IPC timeout.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding the state directory
pub const STATE_DIR_ENV: &str = "BELL_STATE_DIR";

const DEFAULT_LOG_FILTER: &str = "info";
const DEFAULT_IPC_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to read {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Invalid config file {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
}

/// Optional overrides from `config.toml`
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    socket_path: Option<PathBuf>,
    log_filter: Option<String>,
    ipc_timeout_ms: Option<u64>,
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of all daemon state
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to version file
    pub version_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Path to the blast WAL
    pub wal_path: PathBuf,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_filter: String,
    /// Per-message read/write timeout
    pub ipc_timeout: Duration,
}

impl Config {
    /// Resolve the state directory from the override, the environment or
    /// platform defaults, then load
    pub fn load(state_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let state_dir = match state_dir {
            Some(dir) => dir.to_path_buf(),
            None => default_state_dir()?,
        };
        Self::for_state_dir(state_dir)
    }

    /// Build config rooted at `state_dir`, applying `config.toml` if present
    pub fn for_state_dir(state_dir: PathBuf) -> Result<Self, ConfigError> {
        let file_path = state_dir.join("config.toml");
        let file = match std::fs::read_to_string(&file_path) {
            Ok(text) => toml::from_str::<FileConfig>(&text)
                .map_err(|e| ConfigError::Parse(file_path.clone(), e))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FileConfig::default(),
            Err(e) => return Err(ConfigError::Read(file_path, e)),
        };

        Ok(Self {
            socket_path: file
                .socket_path
                .unwrap_or_else(|| state_dir.join("bell.sock")),
            lock_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join("daemon.log"),
            wal_path: state_dir.join("wal").join("blasts.wal"),
            log_filter: file
                .log_filter
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            ipc_timeout: file
                .ipc_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_IPC_TIMEOUT),
            state_dir,
        })
    }
}

/// `BELL_STATE_DIR`, else `<state or local data dir>/bell`
pub fn default_state_dir() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = std::env::var_os(STATE_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|dir| dir.join("bell"))
        .ok_or(ConfigError::NoStateDir)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
