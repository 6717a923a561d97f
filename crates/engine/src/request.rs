// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Strictly typed requests built from loosely typed transport bodies
//!
//! Transports hand over JSON objects as a web client would post them
//! (`householdId`, `memberId`, `kind`, ...). Each request type checks field
//! presence and enum membership before anything reaches the store. A field
//! that is absent, not a string, or empty counts as missing.

use crate::error::LifecycleError;
use bell_core::{BlastDraft, BlastId, BlastStatus, HouseholdId, MemberId, ReactionKind, Urgency};
use serde_json::Value;

fn text(body: &Value, field: &str) -> Option<String> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Create a blast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBlast {
    pub draft: BlastDraft,
}

impl CreateBlast {
    pub fn from_body(body: &Value) -> Result<Self, LifecycleError> {
        let (Some(household_id), Some(member_id), Some(category_label), Some(event_label)) = (
            text(body, "householdId"),
            text(body, "memberId"),
            text(body, "categoryLabel"),
            text(body, "eventLabel"),
        ) else {
            return Err(LifecycleError::validation("Missing required fields"));
        };

        let urgency = match text(body, "urgency") {
            None => Urgency::default(),
            Some(raw) => raw
                .parse()
                .map_err(|_| LifecycleError::validation("Invalid urgency"))?,
        };

        Ok(Self {
            draft: BlastDraft {
                household_id: HouseholdId(household_id),
                created_by: MemberId(member_id),
                category_label,
                event_label,
                urgency,
            },
        })
    }
}

/// List a household's blasts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListBlasts {
    pub household_id: HouseholdId,
    pub status: Option<BlastStatus>,
}

impl ListBlasts {
    /// Build from query parameters; an empty status means no filter
    pub fn from_query(household_id: Option<&str>, status: Option<&str>) -> Result<Self, LifecycleError> {
        let household_id = household_id
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LifecycleError::validation("Household ID is required"))?;

        let status = match status.filter(|s| !s.is_empty()) {
            None => None,
            Some(raw) => Some(
                raw.parse()
                    .map_err(|_| LifecycleError::validation("Invalid status"))?,
            ),
        };

        Ok(Self {
            household_id: HouseholdId(household_id.to_string()),
            status,
        })
    }
}

/// React to a blast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct React {
    pub blast_id: BlastId,
    pub member_id: MemberId,
    pub kind: ReactionKind,
}

impl React {
    pub fn from_body(blast_id: &str, body: &Value) -> Result<Self, LifecycleError> {
        let (Some(member_id), Some(kind)) = (text(body, "memberId"), text(body, "kind")) else {
            return Err(LifecycleError::validation(
                "Member ID and reaction kind are required",
            ));
        };
        let kind = kind
            .parse()
            .map_err(|_| LifecycleError::validation("Invalid reaction kind"))?;

        Ok(Self {
            blast_id: BlastId(blast_id.to_string()),
            member_id: MemberId(member_id),
            kind,
        })
    }
}

/// Mark a blast done
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkDone {
    pub blast_id: BlastId,
    pub member_id: MemberId,
}

impl MarkDone {
    pub fn from_body(blast_id: &str, body: &Value) -> Result<Self, LifecycleError> {
        let member_id =
            text(body, "memberId").ok_or_else(|| LifecycleError::validation("Member ID is required"))?;
        Ok(Self {
            blast_id: BlastId(blast_id.to_string()),
            member_id: MemberId(member_id),
        })
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
