// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon management commands

use anyhow::Result;
use bell_daemon::Config;
use clap::{Args, Subcommand};

use crate::client::{self, DaemonClient};
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start belld in the background
    Start,
    /// Stop the running daemon
    Stop,
    /// Show uptime and blast counts
    Status,
}

pub async fn handle(config: &Config, command: DaemonCommand, format: OutputFormat) -> Result<()> {
    match command {
        DaemonCommand::Start => {
            if let Ok(client) = DaemonClient::connect(config) {
                if let Ok(version) = client.hello().await {
                    println!("Daemon already running (version {})", version);
                    return Ok(());
                }
            }
            client::daemon_start(config).await?;
            println!("Daemon started");
        }
        DaemonCommand::Stop => {
            if client::daemon_stop(config).await? {
                println!("Daemon stopped");
            } else {
                println!("Daemon not running");
            }
        }
        DaemonCommand::Status => {
            let client = DaemonClient::connect(config)?;
            let status = client.status().await?;
            output::print(&status, format);
        }
    }
    Ok(())
}
