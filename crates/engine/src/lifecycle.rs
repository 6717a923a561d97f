// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle API: the operations transports call
//!
//! Every operation takes an already-validated request. Store failures are
//! logged and mapped to caller-safe errors here, at the operation boundary.

use crate::error::LifecycleError;
use crate::guard::authorize_mark_done;
use crate::ledger::ReactionLedger;
use crate::request::{CreateBlast, ListBlasts, MarkDone, React};
use bell_core::{Blast, BlastId, BlastView, Clock, IdGen, Reaction};
use bell_storage::{DoneOutcome, EntityStore, StatusCounts};

/// Status can change at most twice (OPEN -> CLAIMED -> DONE) between
/// authorization and the conditional write, so three attempts always settle.
const MAX_DONE_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct Lifecycle<S, C, I> {
    store: S,
    clock: C,
    ids: I,
    ledger: ReactionLedger<S, C, I>,
}

impl<S: EntityStore, C: Clock, I: IdGen> Lifecycle<S, C, I> {
    pub fn new(store: S, clock: C, ids: I) -> Self {
        let ledger = ReactionLedger::new(store.clone(), clock.clone(), ids.clone());
        Self {
            store,
            clock,
            ids,
            ledger,
        }
    }

    /// Post a new OPEN blast
    pub async fn create_blast(&self, request: CreateBlast) -> Result<BlastView, LifecycleError> {
        let blast = Blast::open(
            BlastId(self.ids.next()),
            request.draft,
            self.clock.now(),
        );
        let blast = self
            .store
            .insert_blast(blast)
            .await
            .map_err(|e| LifecycleError::from_store("Failed to create blast", e))?;

        tracing::info!(
            blast_id = %blast.id,
            household_id = %blast.household_id,
            created_by = %blast.created_by_member_id,
            "blast created"
        );
        Ok(BlastView {
            blast,
            reactions: Vec::new(),
        })
    }

    /// A household's blasts, newest first
    pub async fn list_blasts(&self, request: ListBlasts) -> Result<Vec<BlastView>, LifecycleError> {
        self.store
            .list_blasts(&request.household_id, request.status)
            .await
            .map_err(|e| LifecycleError::from_store("Failed to fetch blasts", e))
    }

    /// A single blast with its reactions
    pub async fn get_blast(&self, id: &BlastId) -> Result<BlastView, LifecycleError> {
        self.load(id, "Failed to fetch blast").await
    }

    /// Record a reaction, then return it with the refreshed blast
    pub async fn react(&self, request: React) -> Result<(Reaction, BlastView), LifecycleError> {
        let reaction = self
            .ledger
            .record_reaction(&request.blast_id, &request.member_id, request.kind)
            .await?;
        let blast = self.load(&request.blast_id, "Failed to add reaction").await?;
        Ok((reaction, blast))
    }

    /// Authorize and apply the DONE transition
    ///
    /// The write is conditional on the status seen during authorization. If
    /// another request moved the blast in between, the guard is re-run against
    /// the fresh state.
    pub async fn mark_done(&self, request: MarkDone) -> Result<BlastView, LifecycleError> {
        const FAILURE: &str = "Failed to mark blast as done";
        let MarkDone {
            blast_id,
            member_id,
        } = request;

        for attempt in 1..=MAX_DONE_ATTEMPTS {
            let current = self.load(&blast_id, FAILURE).await?;
            authorize_mark_done(&current, &member_id)?;

            let outcome = self
                .store
                .mark_done_if(&blast_id, current.blast.status, &member_id, self.clock.now())
                .await
                .map_err(|e| LifecycleError::from_store(FAILURE, e))?;

            match outcome {
                DoneOutcome::Done(_) => {
                    if current.blast.done_by_member_id.is_some() {
                        tracing::info!(
                            blast_id = %blast_id,
                            done_by = %member_id,
                            previous = ?current.blast.done_by_member_id,
                            "blast re-marked done"
                        );
                    } else {
                        tracing::info!(blast_id = %blast_id, done_by = %member_id, "blast done");
                    }
                    return self.load(&blast_id, FAILURE).await;
                }
                DoneOutcome::StatusChanged(now) => {
                    tracing::warn!(
                        blast_id = %blast_id,
                        member_id = %member_id,
                        attempt,
                        expected = %current.blast.status,
                        actual = %now.status,
                        "status moved during mark-done, re-authorizing"
                    );
                }
            }
        }

        tracing::error!(blast_id = %blast_id, "mark-done did not settle");
        Err(LifecycleError::Internal(FAILURE.to_string()))
    }

    pub async fn status_counts(&self) -> Result<StatusCounts, LifecycleError> {
        self.store
            .status_counts()
            .await
            .map_err(|e| LifecycleError::from_store("Failed to fetch status", e))
    }

    async fn load(&self, id: &BlastId, failure: &str) -> Result<BlastView, LifecycleError> {
        self.store
            .get_blast(id)
            .await
            .map_err(|e| LifecycleError::from_store(failure, e))?
            .ok_or_else(LifecycleError::blast_not_found)
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
