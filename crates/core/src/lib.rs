// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bell-core: Core types for the household bell
//!
//! This crate provides:
//! - The blast state machine (OPEN -> CLAIMED -> DONE)
//! - Reaction records and their uniqueness key
//! - Operations persisted to the write-ahead log
//! - Clock and ID abstractions for deterministic tests

pub mod clock;
pub mod id;

// Domain types
pub mod reaction;
pub mod blast;
pub mod operation;

// Re-exports
pub use blast::{Blast, BlastDraft, BlastStatus, BlastView, Urgency};
pub use clock::{Clock, FakeClock, SystemClock};
pub use id::{BlastId, HouseholdId, IdGen, MemberId, ReactionId, SequentialIdGen, UuidIdGen};
pub use operation::Operation;
pub use reaction::{Reaction, ReactionKey, ReactionKind};

/// A string did not name a member of one of the wire enums
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {what}: {value}")]
pub struct ParseEnumError {
    pub what: &'static str,
    pub value: String,
}
