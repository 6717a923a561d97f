// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for lifecycle operations

use bell_storage::StoreError;
use thiserror::Error;

/// Errors surfaced to transport callers
///
/// Messages are caller-safe. Store details are logged where they are mapped
/// into `Internal` and never carried in the error itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Permission(String),
    /// Reserved for uniqueness collaborators; lifecycle operations never return it
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl LifecycleError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn blast_not_found() -> Self {
        Self::NotFound("Blast not found".to_string())
    }

    /// Map a store failure at an operation boundary
    ///
    /// `failure` is the caller-facing message, e.g. "Failed to add reaction".
    pub fn from_store(failure: &str, error: StoreError) -> Self {
        match error {
            StoreError::BlastNotFound(_) => Self::blast_not_found(),
            other => {
                tracing::error!(error = %other, "{}", failure);
                Self::Internal(failure.to_string())
            }
        }
    }

    /// HTTP-style status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Permission(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Internal(_) => 500,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
