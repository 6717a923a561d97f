// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay

use bell_core::{
    Blast, BlastId, BlastStatus, BlastView, HouseholdId, Operation, Reaction, ReactionKey,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of blasts in each status, across all households
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub open: usize,
    pub claimed: usize,
    pub done: usize,
}

/// Materialized state built from WAL operations
#[derive(Debug, Default)]
pub struct MaterializedState {
    pub blasts: HashMap<BlastId, Blast>,
    /// Reactions per blast, in insertion order
    pub reactions: HashMap<BlastId, Vec<Reaction>>,
}

impl MaterializedState {
    pub fn blast(&self, id: &BlastId) -> Option<&Blast> {
        self.blasts.get(id)
    }

    /// Find the reaction stored under a uniqueness key
    pub fn find_reaction(&self, key: &ReactionKey) -> Option<&Reaction> {
        self.reactions
            .get(&key.blast_id)
            .and_then(|list| list.iter().find(|r| r.matches(key)))
    }

    /// A blast together with its reactions
    pub fn view(&self, id: &BlastId) -> Option<BlastView> {
        let blast = self.blasts.get(id)?;
        Some(BlastView {
            blast: blast.clone(),
            reactions: self.reactions.get(id).cloned().unwrap_or_default(),
        })
    }

    /// Blasts of a household, newest first, optionally filtered by status
    pub fn views_for(&self, household: &HouseholdId, status: Option<BlastStatus>) -> Vec<BlastView> {
        let mut blasts: Vec<&Blast> = self
            .blasts
            .values()
            .filter(|b| &b.household_id == household)
            .filter(|b| status.map_or(true, |s| b.status == s))
            .collect();

        // Ties on created_at fall back to id so polling clients see a stable order
        blasts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        blasts
            .into_iter()
            .filter_map(|b| self.view(&b.id))
            .collect()
    }

    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for blast in self.blasts.values() {
            match blast.status {
                BlastStatus::Open => counts.open += 1,
                BlastStatus::Claimed => counts.claimed += 1,
                BlastStatus::Done => counts.done += 1,
            }
        }
        counts
    }

    /// Apply an operation to update the state
    ///
    /// Operations whose precondition no longer holds are ignored, which keeps
    /// replay deterministic.
    pub fn apply(&mut self, op: &Operation) {
        match op {
            Operation::BlastCreate { blast } => {
                self.blasts
                    .entry(blast.id.clone())
                    .or_insert_with(|| blast.clone());
            }

            Operation::ReactionRecord { reaction } => {
                if !self.blasts.contains_key(&reaction.blast_id) {
                    return;
                }
                if self.find_reaction(&reaction.key()).is_some() {
                    return;
                }
                self.reactions
                    .entry(reaction.blast_id.clone())
                    .or_default()
                    .push(reaction.clone());
            }

            Operation::BlastClaim { id, member_id, at } => {
                if let Some(blast) = self.blasts.get_mut(id) {
                    if let Some(claimed) = blast.claim(member_id, *at) {
                        *blast = claimed;
                    }
                }
            }

            Operation::BlastDone { id, member_id, at } => {
                if let Some(blast) = self.blasts.get_mut(id) {
                    *blast = blast.complete(member_id, *at);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
