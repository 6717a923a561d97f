// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Blast lifecycle engine: reaction ledger, claim guard and the operations
//! exposed to transports

mod error;
mod guard;
mod ledger;
mod lifecycle;
pub mod request;

pub use error::LifecycleError;
pub use guard::authorize_mark_done;
pub use ledger::ReactionLedger;
pub use lifecycle::Lifecycle;
pub use request::{CreateBlast, ListBlasts, MarkDone, React};
