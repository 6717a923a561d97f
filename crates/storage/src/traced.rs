// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced store wrapper for consistent observability

use crate::state::StatusCounts;
use crate::store::{ClaimOutcome, DoneOutcome, EntityStore, ReactionInsert, StoreError};
use async_trait::async_trait;
use bell_core::{Blast, BlastId, BlastStatus, BlastView, HouseholdId, MemberId, Reaction};
use chrono::{DateTime, Utc};
use tracing::Instrument;

/// Wrapper that adds tracing to any EntityStore
#[derive(Clone)]
pub struct TracedStore<S> {
    inner: S,
}

impl<S> TracedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

fn log_failure(elapsed: std::time::Duration, error: &StoreError) {
    tracing::error!(
        elapsed_ms = elapsed.as_millis() as u64,
        error = %error,
        "store call failed"
    );
}

#[async_trait]
impl<S: EntityStore> EntityStore for TracedStore<S> {
    async fn insert_blast(&self, blast: Blast) -> Result<Blast, StoreError> {
        let span = tracing::info_span!("store.insert_blast", blast_id = %blast.id, household_id = %blast.household_id);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.insert_blast(blast).await;
            match &result {
                Ok(_) => tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "inserted"),
                Err(e) => log_failure(start.elapsed(), e),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn get_blast(&self, id: &BlastId) -> Result<Option<BlastView>, StoreError> {
        let span = tracing::debug_span!("store.get_blast", blast_id = %id);
        async {
            let result = self.inner.get_blast(id).await;
            match &result {
                Ok(found) => tracing::trace!(found = found.is_some(), "loaded"),
                Err(e) => tracing::error!(error = %e, "load failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn list_blasts(
        &self,
        household: &HouseholdId,
        status: Option<BlastStatus>,
    ) -> Result<Vec<BlastView>, StoreError> {
        let span = tracing::debug_span!(
            "store.list_blasts",
            household_id = %household,
            status = status.map(BlastStatus::as_str)
        );
        async {
            let result = self.inner.list_blasts(household, status).await;
            match &result {
                Ok(blasts) => tracing::trace!(count = blasts.len(), "listed"),
                Err(e) => tracing::error!(error = %e, "list failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn insert_reaction(&self, reaction: Reaction) -> Result<ReactionInsert, StoreError> {
        let span = tracing::info_span!(
            "store.insert_reaction",
            blast_id = %reaction.blast_id,
            member_id = %reaction.member_id,
            kind = %reaction.kind
        );
        async {
            let start = std::time::Instant::now();
            let result = self.inner.insert_reaction(reaction).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(ReactionInsert::Inserted(r)) => {
                    tracing::debug!(reaction_id = %r.id, elapsed_ms, "reaction inserted")
                }
                Ok(ReactionInsert::Existing(r)) => {
                    tracing::debug!(reaction_id = %r.id, elapsed_ms, "reaction already present")
                }
                Err(e) => log_failure(start.elapsed(), e),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn claim_if_open(
        &self,
        id: &BlastId,
        member: &MemberId,
        at: DateTime<Utc>,
    ) -> Result<ClaimOutcome, StoreError> {
        let span = tracing::info_span!("store.claim_if_open", blast_id = %id, member_id = %member);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.claim_if_open(id, member, at).await;
            match &result {
                Ok(ClaimOutcome::Claimed(_)) => tracing::debug!("claimed"),
                Ok(ClaimOutcome::AlreadyClaimed(b)) => {
                    tracing::debug!(status = %b.status, "already claimed")
                }
                Err(e) => log_failure(start.elapsed(), e),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn mark_done_if(
        &self,
        id: &BlastId,
        expected: BlastStatus,
        member: &MemberId,
        at: DateTime<Utc>,
    ) -> Result<DoneOutcome, StoreError> {
        let span = tracing::info_span!(
            "store.mark_done_if",
            blast_id = %id,
            member_id = %member,
            expected = %expected
        );
        async {
            let start = std::time::Instant::now();
            let result = self.inner.mark_done_if(id, expected, member, at).await;
            match &result {
                Ok(DoneOutcome::Done(_)) => tracing::debug!("marked done"),
                Ok(DoneOutcome::StatusChanged(b)) => {
                    tracing::debug!(actual = %b.status, "status changed")
                }
                Err(e) => log_failure(start.elapsed(), e),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn status_counts(&self) -> Result<StatusCounts, StoreError> {
        self.inner.status_counts().await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
