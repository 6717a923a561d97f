// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mark-done authorization
//!
//! The guard only fires on CLAIMED blasts: there the caller must hold a MINE
//! or ON_IT reaction. OPEN blasts can be closed by anyone, and DONE blasts can
//! be re-marked by anyone (which moves the done attribution to the caller).

use crate::error::LifecycleError;
use bell_core::{BlastStatus, BlastView, MemberId};

pub fn authorize_mark_done(blast: &BlastView, member: &MemberId) -> Result<(), LifecycleError> {
    if blast.blast.status == BlastStatus::Claimed && !blast.has_claiming_reaction(member) {
        return Err(LifecycleError::Permission(
            "Only the person who claimed this can mark it done".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
