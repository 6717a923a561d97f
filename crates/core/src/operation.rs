// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operations for the write-ahead log

use crate::blast::Blast;
use crate::id::{BlastId, MemberId};
use crate::reaction::Reaction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operations that can be persisted to the WAL
///
/// Each operation is written only after its precondition has been checked
/// under the store lock, but replay re-checks the same preconditions so a log
/// with duplicates still materializes to the same state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Insert a new blast (always OPEN)
    BlastCreate { blast: Blast },

    /// Record a reaction; no-op if its (blast, member, kind) already exists
    ReactionRecord { reaction: Reaction },

    /// OPEN -> CLAIMED; no-op unless the blast is still open
    BlastClaim {
        id: BlastId,
        member_id: MemberId,
        at: DateTime<Utc>,
    },

    /// Any status -> DONE
    BlastDone {
        id: BlastId,
        member_id: MemberId,
        at: DateTime<Utc>,
    },
}

impl Operation {
    /// The blast this operation touches
    pub fn blast_id(&self) -> &BlastId {
        match self {
            Operation::BlastCreate { blast } => &blast.id,
            Operation::ReactionRecord { reaction } => &reaction.blast_id,
            Operation::BlastClaim { id, .. } | Operation::BlastDone { id, .. } => id,
        }
    }
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
