// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! bell - Household Bell CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use bell_daemon::Config;
use clap::{Parser, Subcommand};
use commands::{blast, daemon};

use crate::client::DaemonClient;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "bell",
    version,
    about = "Household Bell - post chores, claim them, get them done"
)]
struct Cli {
    /// State directory of the daemon (defaults to BELL_STATE_DIR or the platform state dir)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short, global = true, value_enum, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, list and react to blasts
    Blast(blast::BlastArgs),
    /// Daemon management
    Daemon(daemon::DaemonArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.state_dir.as_deref())?;

    match cli.command {
        Commands::Daemon(args) => daemon::handle(&config, args.command, cli.output).await,
        Commands::Blast(args) => {
            let client = DaemonClient::connect(&config)?;
            blast::handle(&client, args.command, cli.output).await
        }
    }
}
