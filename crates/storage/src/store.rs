// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entity store contract and its WAL-backed implementation
//!
//! Conditional writes (`claim_if_open`, `mark_done_if`) evaluate their
//! predicate, append to the WAL and apply to the materialized state while
//! holding a single lock. Callers never need a separate read to decide
//! whether a transition is still valid.
//!
//! The lock is a `std::sync::Mutex` and is never held across an `.await`.
//! Writes fsync while holding it, so a slow disk blocks the calling worker
//! thread and serializes every other store call behind the commit. That is
//! the cost of making check, persist and apply one atomic step.

use crate::state::{MaterializedState, StatusCounts};
use crate::wal::{Wal, WalError};
use async_trait::async_trait;
use bell_core::{
    Blast, BlastId, BlastStatus, BlastView, HouseholdId, MemberId, Operation, Reaction,
};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("blast not found: {0}")]
    BlastNotFound(BlastId),
    #[error("blast already exists: {0}")]
    BlastExists(BlastId),
    #[error("WAL error: {0}")]
    Wal(#[from] WalError),
}

/// Result of an idempotent reaction insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionInsert {
    Inserted(Reaction),
    /// A reaction with the same (blast, member, kind) was already stored
    Existing(Reaction),
}

impl ReactionInsert {
    pub fn into_reaction(self) -> Reaction {
        match self {
            ReactionInsert::Inserted(r) | ReactionInsert::Existing(r) => r,
        }
    }
}

/// Result of a conditional OPEN -> CLAIMED write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    Claimed(Blast),
    /// The blast had already left OPEN; carries its current state
    AlreadyClaimed(Blast),
}

/// Result of a conditional -> DONE write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DoneOutcome {
    Done(Blast),
    /// The status no longer matched the expected one; carries the current state
    StatusChanged(Blast),
}

/// Storage for blasts and reactions
#[async_trait]
pub trait EntityStore: Clone + Send + Sync + 'static {
    /// Insert a new blast
    async fn insert_blast(&self, blast: Blast) -> Result<Blast, StoreError>;

    /// Load a blast with its reactions
    async fn get_blast(&self, id: &BlastId) -> Result<Option<BlastView>, StoreError>;

    /// Blasts of a household, newest first
    async fn list_blasts(
        &self,
        household: &HouseholdId,
        status: Option<BlastStatus>,
    ) -> Result<Vec<BlastView>, StoreError>;

    /// Insert a reaction unless one with the same key exists
    async fn insert_reaction(&self, reaction: Reaction) -> Result<ReactionInsert, StoreError>;

    /// Claim the blast for `member` only if it is still OPEN
    async fn claim_if_open(
        &self,
        id: &BlastId,
        member: &MemberId,
        at: DateTime<Utc>,
    ) -> Result<ClaimOutcome, StoreError>;

    /// Mark the blast done only if its status still equals `expected`
    async fn mark_done_if(
        &self,
        id: &BlastId,
        expected: BlastStatus,
        member: &MemberId,
        at: DateTime<Utc>,
    ) -> Result<DoneOutcome, StoreError>;

    /// Blast counts by status
    async fn status_counts(&self) -> Result<StatusCounts, StoreError>;
}

struct Inner {
    /// `None` for in-memory stores
    wal: Option<Wal>,
    state: MaterializedState,
}

impl Inner {
    /// Persist then apply. State is untouched when the WAL write fails.
    fn commit(&mut self, op: Operation) -> Result<(), StoreError> {
        if let Some(wal) = self.wal.as_mut() {
            let seq = wal.append(&op)?;
            tracing::trace!(seq, blast_id = %op.blast_id(), "wal append");
        }
        self.state.apply(&op);
        Ok(())
    }

    fn blast(&self, id: &BlastId) -> Result<&Blast, StoreError> {
        self.state
            .blast(id)
            .ok_or_else(|| StoreError::BlastNotFound(id.clone()))
    }
}

/// Entity store backed by a write-ahead log and in-memory state
#[derive(Clone)]
pub struct WalStore {
    inner: Arc<Mutex<Inner>>,
}

impl WalStore {
    /// Open the WAL at `path`, replaying existing operations
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let (wal, ops) = Wal::open(path)?;
        let mut state = MaterializedState::default();
        for op in &ops {
            state.apply(op);
        }
        tracing::info!(
            path = %path.display(),
            operations = ops.len(),
            last_seq = wal.last_seq(),
            blasts = state.blasts.len(),
            "replayed WAL"
        );

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                wal: Some(wal),
                state,
            })),
        })
    }

    /// Store without durability, for tests and ephemeral use
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                wal: None,
                state: MaterializedState::default(),
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl EntityStore for WalStore {
    async fn insert_blast(&self, blast: Blast) -> Result<Blast, StoreError> {
        let mut inner = self.lock();
        if inner.state.blast(&blast.id).is_some() {
            return Err(StoreError::BlastExists(blast.id));
        }
        inner.commit(Operation::BlastCreate {
            blast: blast.clone(),
        })?;
        Ok(blast)
    }

    async fn get_blast(&self, id: &BlastId) -> Result<Option<BlastView>, StoreError> {
        Ok(self.lock().state.view(id))
    }

    async fn list_blasts(
        &self,
        household: &HouseholdId,
        status: Option<BlastStatus>,
    ) -> Result<Vec<BlastView>, StoreError> {
        Ok(self.lock().state.views_for(household, status))
    }

    async fn insert_reaction(&self, reaction: Reaction) -> Result<ReactionInsert, StoreError> {
        let mut inner = self.lock();
        inner.blast(&reaction.blast_id)?;
        if let Some(existing) = inner.state.find_reaction(&reaction.key()) {
            return Ok(ReactionInsert::Existing(existing.clone()));
        }
        inner.commit(Operation::ReactionRecord {
            reaction: reaction.clone(),
        })?;
        Ok(ReactionInsert::Inserted(reaction))
    }

    async fn claim_if_open(
        &self,
        id: &BlastId,
        member: &MemberId,
        at: DateTime<Utc>,
    ) -> Result<ClaimOutcome, StoreError> {
        let mut inner = self.lock();
        let current = inner.blast(id)?;
        let Some(claimed) = current.claim(member, at) else {
            return Ok(ClaimOutcome::AlreadyClaimed(current.clone()));
        };
        inner.commit(Operation::BlastClaim {
            id: id.clone(),
            member_id: member.clone(),
            at,
        })?;
        Ok(ClaimOutcome::Claimed(claimed))
    }

    async fn mark_done_if(
        &self,
        id: &BlastId,
        expected: BlastStatus,
        member: &MemberId,
        at: DateTime<Utc>,
    ) -> Result<DoneOutcome, StoreError> {
        let mut inner = self.lock();
        let current = inner.blast(id)?;
        if current.status != expected {
            return Ok(DoneOutcome::StatusChanged(current.clone()));
        }
        let done = current.complete(member, at);
        inner.commit(Operation::BlastDone {
            id: id.clone(),
            member_id: member.clone(),
            at,
        })?;
        Ok(DoneOutcome::Done(done))
    }

    async fn status_counts(&self) -> Result<StatusCounts, StoreError> {
        Ok(self.lock().state.status_counts())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
