// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reaction ledger
//!
//! Records reactions idempotently and drives the OPEN -> CLAIMED transition.
//! The claim is a conditional write in the store, so when several members
//! react MINE/ON_IT at once exactly one becomes the claimer and the rest keep
//! plain reactions.

use crate::error::LifecycleError;
use bell_core::{BlastId, Clock, IdGen, MemberId, Reaction, ReactionId, ReactionKind};
use bell_storage::{ClaimOutcome, EntityStore, ReactionInsert};

const FAILURE: &str = "Failed to add reaction";

#[derive(Clone)]
pub struct ReactionLedger<S, C, I> {
    store: S,
    clock: C,
    ids: I,
}

impl<S: EntityStore, C: Clock, I: IdGen> ReactionLedger<S, C, I> {
    pub fn new(store: S, clock: C, ids: I) -> Self {
        Self { store, clock, ids }
    }

    /// Record `member`'s reaction and claim the blast if it is still open
    ///
    /// Re-submitting an existing (blast, member, kind) returns the stored
    /// reaction. The claim attempt is repeated in that case; it is a no-op
    /// unless the blast is still OPEN.
    pub async fn record_reaction(
        &self,
        blast_id: &BlastId,
        member: &MemberId,
        kind: ReactionKind,
    ) -> Result<Reaction, LifecycleError> {
        let candidate = Reaction {
            id: ReactionId(self.ids.next()),
            blast_id: blast_id.clone(),
            member_id: member.clone(),
            kind,
            created_at: self.clock.now(),
        };

        let reaction = match self
            .store
            .insert_reaction(candidate)
            .await
            .map_err(|e| LifecycleError::from_store(FAILURE, e))?
        {
            ReactionInsert::Inserted(r) => r,
            ReactionInsert::Existing(r) => {
                tracing::debug!(
                    blast_id = %blast_id,
                    member_id = %member,
                    kind = %kind,
                    "reaction already recorded"
                );
                r
            }
        };

        if kind.claims() {
            self.try_claim(blast_id, member).await?;
        }

        Ok(reaction)
    }

    async fn try_claim(&self, blast_id: &BlastId, member: &MemberId) -> Result<(), LifecycleError> {
        let outcome = self
            .store
            .claim_if_open(blast_id, member, self.clock.now())
            .await
            .map_err(|e| LifecycleError::from_store(FAILURE, e))?;

        match outcome {
            ClaimOutcome::Claimed(_) => {
                tracing::info!(blast_id = %blast_id, member_id = %member, "blast claimed");
            }
            ClaimOutcome::AlreadyClaimed(current) => {
                if let Some(claimer) = current
                    .claimed_by_member_id
                    .as_ref()
                    .filter(|c| *c != member)
                {
                    tracing::debug!(
                        blast_id = %blast_id,
                        member_id = %member,
                        claimed_by = %claimer,
                        status = %current.status,
                        "claim skipped, blast no longer open"
                    );
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
