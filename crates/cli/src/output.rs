// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for CLI commands

use std::fmt;

use bell_core::{BlastView, Reaction};
use clap::ValueEnum;
use serde::Serialize;

use crate::client::DaemonStatus;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Print output in the specified format
pub fn print<T: Serialize + fmt::Display>(value: &T, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", value),
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(value) {
                println!("{}", json);
            }
        }
    }
}

/// Print a list of items
pub fn print_list<T: Serialize + fmt::Display>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            for item in items {
                println!("{}", item);
            }
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(items) {
                println!("{}", json);
            }
        }
    }
}

/// One line per blast
#[derive(Serialize)]
#[serde(transparent)]
pub struct BlastRow<'a>(pub &'a BlastView);

impl fmt::Display for BlastRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let blast = &self.0.blast;
        write!(
            f,
            "{:<36} {:<7} {:<8} {}: {}",
            blast.id.0,
            blast.status.as_str(),
            blast.urgency.as_str(),
            blast.category_label,
            blast.event_label
        )
    }
}

/// A blast with its lifecycle fields and reactions
#[derive(Serialize)]
#[serde(transparent)]
pub struct BlastDetail<'a>(pub &'a BlastView);

impl fmt::Display for BlastDetail<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let blast = &self.0.blast;
        writeln!(f, "Blast: {}", blast.id)?;
        writeln!(f, "  Household: {}", blast.household_id)?;
        writeln!(f, "  Event: {}: {}", blast.category_label, blast.event_label)?;
        writeln!(f, "  Urgency: {}", blast.urgency)?;
        writeln!(f, "  Status: {}", blast.status)?;
        write!(
            f,
            "  Created: {} by {}",
            blast.created_at.to_rfc3339(),
            blast.created_by_member_id
        )?;
        if let (Some(member), Some(at)) = (&blast.claimed_by_member_id, blast.claimed_at) {
            write!(f, "\n  Claimed: {} by {}", at.to_rfc3339(), member)?;
        }
        if let (Some(member), Some(at)) = (&blast.done_by_member_id, blast.done_at) {
            write!(f, "\n  Done: {} by {}", at.to_rfc3339(), member)?;
        }
        if !self.0.reactions.is_empty() {
            write!(f, "\n  Reactions:")?;
            for reaction in &self.0.reactions {
                write!(f, "\n    {} {}", reaction.member_id, reaction.kind)?;
            }
        }
        Ok(())
    }
}

/// Result of `bell blast react`
#[derive(Serialize)]
pub struct Reacted<'a> {
    pub reaction: &'a Reaction,
    pub blast: &'a BlastView,
}

impl fmt::Display for Reacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} reacted {} to {} (now {})",
            self.reaction.member_id, self.reaction.kind, self.blast.blast.id, self.blast.blast.status
        )
    }
}

impl fmt::Display for DaemonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Daemon running")?;
        writeln!(f, "  Uptime: {}s", self.uptime_secs)?;
        write!(
            f,
            "  Blasts: {} open, {} claimed, {} done",
            self.blasts_open, self.blasts_claimed, self.blasts_done
        )
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
