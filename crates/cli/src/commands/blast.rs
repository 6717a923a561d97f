// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blast commands

use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::{json, Map, Value};

use crate::client::DaemonClient;
use crate::output::{self, BlastDetail, BlastRow, OutputFormat, Reacted};

#[derive(Args)]
pub struct BlastArgs {
    #[command(subcommand)]
    pub command: BlastCommand,
}

#[derive(Subcommand)]
pub enum BlastCommand {
    /// Post a new blast to a household
    Create {
        #[arg(long)]
        household: String,
        /// Member posting the blast
        #[arg(long)]
        member: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        event: String,
        /// whenever, soon or asap (default whenever)
        #[arg(long)]
        urgency: Option<String>,
    },
    /// List a household's blasts, newest first
    List {
        #[arg(long)]
        household: String,
        /// Only blasts in this status (OPEN, CLAIMED, DONE)
        #[arg(long)]
        status: Option<String>,
    },
    /// Show a blast with its reactions
    Show { id: String },
    /// React to a blast (MINE, ON_IT, NOT_ME, ACK)
    React {
        id: String,
        #[arg(long)]
        member: String,
        #[arg(long)]
        kind: String,
    },
    /// Mark a blast done
    Done {
        id: String,
        #[arg(long)]
        member: String,
    },
}

pub async fn handle(client: &DaemonClient, command: BlastCommand, format: OutputFormat) -> Result<()> {
    match command {
        BlastCommand::Create {
            household,
            member,
            category,
            event,
            urgency,
        } => {
            let body = create_body(household, member, category, event, urgency);
            let blast = client.create_blast(body).await?;
            output::print(&BlastDetail(&blast), format);
        }
        BlastCommand::List { household, status } => {
            let blasts = client.list_blasts(&household, status.as_deref()).await?;
            if blasts.is_empty() && matches!(format, OutputFormat::Text) {
                println!("No blasts");
            } else {
                let rows: Vec<BlastRow<'_>> = blasts.iter().map(BlastRow).collect();
                output::print_list(&rows, format);
            }
        }
        BlastCommand::Show { id } => {
            let blast = client.get_blast(&id).await?;
            output::print(&BlastDetail(&blast), format);
        }
        BlastCommand::React { id, member, kind } => {
            let (reaction, blast) = client
                .react(&id, json!({ "memberId": member, "kind": kind }))
                .await?;
            output::print(
                &Reacted {
                    reaction: &reaction,
                    blast: &blast,
                },
                format,
            );
        }
        BlastCommand::Done { id, member } => {
            let blast = client.mark_done(&id, json!({ "memberId": member })).await?;
            output::print(&BlastDetail(&blast), format);
        }
    }
    Ok(())
}

/// Request body as a web client would post it; urgency omitted when unset
fn create_body(
    household: String,
    member: String,
    category: String,
    event: String,
    urgency: Option<String>,
) -> Value {
    let mut body = Map::new();
    body.insert("householdId".to_string(), Value::String(household));
    body.insert("memberId".to_string(), Value::String(member));
    body.insert("categoryLabel".to_string(), Value::String(category));
    body.insert("eventLabel".to_string(), Value::String(event));
    if let Some(urgency) = urgency {
        body.insert("urgency".to_string(), Value::String(urgency));
    }
    Value::Object(body)
}
