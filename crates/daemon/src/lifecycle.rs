// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use bell_core::{SystemClock, UuidIdGen};
use bell_engine::Lifecycle;
use bell_storage::{StoreError, TracedStore, WalStore};
use fs2::FileExt;
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::config::{Config, ConfigError};
use crate::server::ServerContext;

/// Store stack used by the running daemon (wrapped with tracing)
pub type DaemonStore = TracedStore<WalStore>;

/// Lifecycle with the daemon's concrete store, clock and id source
pub type DaemonLifecycle = Lifecycle<DaemonStore, SystemClock, UuidIdGen>;

/// Daemon state during operation
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// Unix socket listener
    pub listener: UnixListener,
    /// Shared with every connection task
    pub context: ServerContext<DaemonStore, SystemClock, UuidIdGen>,
}

impl DaemonState {
    /// Shutdown the daemon gracefully
    pub fn shutdown(&mut self) -> Result<(), DaemonError> {
        info!("Shutting down daemon...");

        for (what, path) in [
            ("socket", &self.config.socket_path),
            ("PID", &self.config.lock_path),
            ("version", &self.config.version_path),
        ] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!("Failed to remove {} file: {}", what, e);
                }
            }
        }

        // Lock is released when self.lock_file is dropped
        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Daemon errors
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Could not determine log directory")]
    NoLogDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<DaemonState, DaemonError> {
    match startup_inner(config).await {
        Ok(state) => Ok(state),
        Err(e) => {
            // Clean up any resources created before failure
            cleanup_on_failure(config);
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: &Config) -> Result<DaemonState, DaemonError> {
    // 1. Create state directory
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST - prevents races
    // Open without truncating so a running daemon's PID survives a failed attempt
    let mut lock_file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(DaemonError::LockFailed)?;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    // 3. Create directories
    if let Some(parent) = config.socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if let Some(parent) = config.wal_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

    // 4. Replay the WAL before binding so a corrupt log never accepts clients
    let store = TracedStore::new(WalStore::open(&config.wal_path)?);
    let lifecycle = Lifecycle::new(store, SystemClock, UuidIdGen);

    // 5. Remove stale socket and bind (LAST - only after all validation passes)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| DaemonError::BindFailed(config.socket_path.clone(), e))?;

    info!("Daemon started in {}", config.state_dir.display());

    Ok(DaemonState {
        config: config.clone(),
        lock_file,
        listener,
        context: ServerContext {
            lifecycle,
            start_time: Instant::now(),
            ipc_timeout: config.ipc_timeout,
            shutdown: Arc::new(Notify::new()),
        },
    })
}

/// Clean up resources on startup failure
///
/// Leaves the lock file alone when another daemon holds it.
fn cleanup_on_failure(config: &Config) {
    let lock_held_elsewhere = File::open(&config.lock_path)
        .map(|f| f.try_lock_exclusive().is_err())
        .unwrap_or(false);
    if lock_held_elsewhere {
        return;
    }

    for path in [&config.socket_path, &config.version_path, &config.lock_path] {
        if path.exists() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
