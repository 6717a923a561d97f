// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blast state machine
//!
//! A blast is a single chore notification posted to a household. Its status
//! only moves forward:
//!
//! ```text
//! OPEN ──claim──▶ CLAIMED ──complete──▶ DONE
//!   └──────────────complete──────────────▲
//! ```
//!
//! Transitions here are pure: they return the next blast (or `None` when the
//! transition does not apply) and leave persistence to the store, which is
//! responsible for making the check-and-apply atomic.

use crate::id::{BlastId, HouseholdId, MemberId};
use crate::reaction::Reaction;
use crate::ParseEnumError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How soon the poster would like it handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    Whenever,
    Soon,
    Asap,
}

impl Urgency {
    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::Whenever => "whenever",
            Urgency::Soon => "soon",
            Urgency::Asap => "asap",
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "whenever" => Ok(Urgency::Whenever),
            "soon" => Ok(Urgency::Soon),
            "asap" => Ok(Urgency::Asap),
            _ => Err(ParseEnumError {
                what: "urgency",
                value: s.to_string(),
            }),
        }
    }
}

/// Lifecycle status of a blast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlastStatus {
    Open,
    Claimed,
    Done,
}

impl BlastStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BlastStatus::Open => "OPEN",
            BlastStatus::Claimed => "CLAIMED",
            BlastStatus::Done => "DONE",
        }
    }

    fn rank(self) -> u8 {
        match self {
            BlastStatus::Open => 0,
            BlastStatus::Claimed => 1,
            BlastStatus::Done => 2,
        }
    }

    /// Whether moving from `self` to `next` keeps status monotonic.
    /// DONE -> DONE is allowed (re-marking rewrites attribution).
    pub fn can_advance_to(self, next: BlastStatus) -> bool {
        next.rank() > self.rank() || (self == BlastStatus::Done && next == BlastStatus::Done)
    }
}

impl std::fmt::Display for BlastStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlastStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(BlastStatus::Open),
            "CLAIMED" => Ok(BlastStatus::Claimed),
            "DONE" => Ok(BlastStatus::Done),
            _ => Err(ParseEnumError {
                what: "status",
                value: s.to_string(),
            }),
        }
    }
}

/// Validated fields for a new blast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlastDraft {
    pub household_id: HouseholdId,
    pub created_by: MemberId,
    pub category_label: String,
    pub event_label: String,
    pub urgency: Urgency,
}

/// A chore notification and its lifecycle state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blast {
    pub id: BlastId,
    pub household_id: HouseholdId,
    pub created_by_member_id: MemberId,
    pub category_label: String,
    pub event_label: String,
    pub urgency: Urgency,
    pub status: BlastStatus,
    pub claimed_by_member_id: Option<MemberId>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub done_by_member_id: Option<MemberId>,
    pub done_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Blast {
    /// Create a new blast in the OPEN state
    pub fn open(id: BlastId, draft: BlastDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            household_id: draft.household_id,
            created_by_member_id: draft.created_by,
            category_label: draft.category_label,
            event_label: draft.event_label,
            urgency: draft.urgency,
            status: BlastStatus::Open,
            claimed_by_member_id: None,
            claimed_at: None,
            done_by_member_id: None,
            done_at: None,
            created_at,
        }
    }

    /// OPEN -> CLAIMED. Returns `None` unless the blast is still open, so the
    /// claimer is recorded exactly once.
    pub fn claim(&self, member: &MemberId, at: DateTime<Utc>) -> Option<Blast> {
        if !self.status.can_advance_to(BlastStatus::Claimed) {
            return None;
        }
        Some(Blast {
            status: BlastStatus::Claimed,
            claimed_by_member_id: Some(member.clone()),
            claimed_at: Some(at),
            ..self.clone()
        })
    }

    /// Any status -> DONE, attributing the completion to `member`.
    ///
    /// Claim fields are carried over untouched. Re-completing a DONE blast
    /// overwrites the previous done attribution.
    pub fn complete(&self, member: &MemberId, at: DateTime<Utc>) -> Blast {
        Blast {
            status: BlastStatus::Done,
            done_by_member_id: Some(member.clone()),
            done_at: Some(at),
            ..self.clone()
        }
    }
}

/// A blast with its reactions, as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlastView {
    #[serde(flatten)]
    pub blast: Blast,
    pub reactions: Vec<Reaction>,
}

impl BlastView {
    /// Whether `member` holds a MINE or ON_IT reaction on this blast
    pub fn has_claiming_reaction(&self, member: &MemberId) -> bool {
        self.reactions
            .iter()
            .any(|r| &r.member_id == member && r.kind.claims())
    }
}

#[cfg(test)]
#[path = "blast_tests.rs"]
mod tests;
