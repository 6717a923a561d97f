// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable entity store for blasts and reactions

mod state;
mod store;
mod traced;
mod wal;

pub use state::{MaterializedState, StatusCounts};
pub use store::{ClaimOutcome, DoneOutcome, EntityStore, ReactionInsert, StoreError, WalStore};
pub use traced::TracedStore;
pub use wal::{Wal, WalError};
