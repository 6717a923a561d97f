// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Household Bell Daemon (belld)
//!
//! Owns the blast store and serves CLI requests over a Unix socket.

use std::path::PathBuf;

use bell_daemon::lifecycle::{self, DaemonError};
use bell_daemon::{server, Config};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional state directory argument; otherwise BELL_STATE_DIR or platform default
    let state_dir = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(state_dir.as_deref())?;

    // Marker goes in before tracing starts so the CLI can find this attempt
    append_log_line(
        &config,
        &format!("{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id()),
    )?;

    let log_guard = setup_logging(&config)?;

    info!("Starting belld in {}", config.state_dir.display());

    let mut daemon = match lifecycle::startup(&config).await {
        Ok(d) => d,
        Err(e) => {
            // tracing is non-blocking and may not flush before exit
            let _ = append_log_line(&config, &format!("ERROR Failed to start daemon: {}", e));
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(
        "Daemon ready, listening on {}",
        config.socket_path.display()
    );

    // Signal ready for parent process (e.g., systemd, CLI waiting for startup)
    println!("READY");

    tokio::select! {
        _ = server::serve(&daemon.listener, &daemon.context) => {}

        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down...");
        }

        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down...");
        }
    }

    daemon.shutdown()?;
    info!("Daemon stopped");
    Ok(())
}

/// Startup marker prefix written to log before anything else.
/// Full format: "--- belld: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- belld: starting (pid: ";

/// Append a line to the daemon log synchronously, bypassing tracing
fn append_log_line(config: &Config, line: &str) -> std::io::Result<()> {
    use std::io::Write;

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(file, "{}", line)
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, DaemonError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = config.log_path.parent().ok_or(DaemonError::NoLogDir)?;
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::never(
        log_dir,
        config.log_path.file_name().ok_or(DaemonError::NoLogDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}
