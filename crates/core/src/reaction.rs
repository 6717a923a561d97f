// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Member reactions to a blast
//!
//! A reaction is keyed by `(blast, member, kind)`; at most one record exists
//! per key. `MINE` and `ON_IT` are claiming kinds: on an open blast they move
//! it to CLAIMED, and on a claimed blast they authorize marking it done.

use crate::id::{BlastId, MemberId, ReactionId};
use crate::ParseEnumError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The kind of acknowledgement a member gives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReactionKind {
    Mine,
    OnIt,
    NotMe,
    Ack,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 4] = [
        ReactionKind::Mine,
        ReactionKind::OnIt,
        ReactionKind::NotMe,
        ReactionKind::Ack,
    ];

    /// Whether this kind stakes a claim on the blast
    pub fn claims(self) -> bool {
        matches!(self, ReactionKind::Mine | ReactionKind::OnIt)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReactionKind::Mine => "MINE",
            ReactionKind::OnIt => "ON_IT",
            ReactionKind::NotMe => "NOT_ME",
            ReactionKind::Ack => "ACK",
        }
    }
}

impl std::fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                what: "reaction kind",
                value: s.to_string(),
            })
    }
}

/// Uniqueness key for reactions
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReactionKey {
    pub blast_id: BlastId,
    pub member_id: MemberId,
    pub kind: ReactionKind,
}

/// A stored reaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub id: ReactionId,
    pub blast_id: BlastId,
    pub member_id: MemberId,
    pub kind: ReactionKind,
    pub created_at: DateTime<Utc>,
}

impl Reaction {
    pub fn key(&self) -> ReactionKey {
        ReactionKey {
            blast_id: self.blast_id.clone(),
            member_id: self.member_id.clone(),
            kind: self.kind,
        }
    }

    pub fn matches(&self, key: &ReactionKey) -> bool {
        self.kind == key.kind && self.member_id == key.member_id && self.blast_id == key.blast_id
    }
}

#[cfg(test)]
#[path = "reaction_tests.rs"]
mod tests;
