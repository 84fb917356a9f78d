// Copyright (c) 2025 Campus Advisor
// SPDX-License-Identifier: BUSL-1.1

//! Error taxonomy for the advisor engine.
//!
//! Failures inside one specialist or one retrieval call are contained and
//! surfaced as degraded-domain markers; they never abort sibling specialists
//! or the whole request. An empty retrieval is an outcome, not an error —
//! see `RetrievalOutcome` in the rag module.

use crate::domain::Domain;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisorError {
    /// The embedding model failed to load or run. Retrieval is degraded,
    /// never fatal to the request.
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// One specialist exceeded its time budget and was excluded from
    /// aggregation.
    #[error("specialist {domain} timed out after {budget_ms}ms")]
    SpecialistTimeout { domain: Domain, budget_ms: u64 },

    /// The text-completion collaborator returned an error.
    #[error("completion failed: {0}")]
    CompletionFailed(String),

    /// A rebuild produced an invalid generation; the old one stays active.
    #[error("index rebuild failed: {0}")]
    RebuildFailed(String),

    /// Reading or writing the persisted index snapshot failed.
    #[error("index persistence error at {path}: {reason}")]
    IndexPersistence { path: String, reason: String },

    /// The query itself was malformed (empty or oversized text). Fatal to
    /// that request only, returned as a structured error.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The session store refused a new session at capacity.
    #[error("session capacity reached: limit {limit}")]
    SessionCapacity { limit: usize },

    /// Session persistence (JSON load/save) failed.
    #[error("session persistence error: {0}")]
    SessionPersistence(String),

    /// The caller cancelled the request; outstanding specialist and index
    /// calls were abandoned and no session state was committed.
    #[error("query cancelled")]
    Cancelled,
}

impl AdvisorError {
    /// Stable code for logging and metrics.
    pub fn error_code(&self) -> &'static str {
        match self {
            AdvisorError::EmbeddingUnavailable(_) => "EMBEDDING_UNAVAILABLE",
            AdvisorError::SpecialistTimeout { .. } => "SPECIALIST_TIMEOUT",
            AdvisorError::CompletionFailed(_) => "COMPLETION_FAILED",
            AdvisorError::RebuildFailed(_) => "REBUILD_FAILED",
            AdvisorError::IndexPersistence { .. } => "INDEX_PERSISTENCE",
            AdvisorError::InvalidQuery(_) => "INVALID_QUERY",
            AdvisorError::SessionCapacity { .. } => "SESSION_CAPACITY",
            AdvisorError::SessionPersistence(_) => "SESSION_PERSISTENCE",
            AdvisorError::Cancelled => "CANCELLED",
        }
    }

    /// Whether this failure is contained as a degraded-domain marker
    /// instead of failing the whole request.
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            AdvisorError::EmbeddingUnavailable(_)
                | AdvisorError::SpecialistTimeout { .. }
                | AdvisorError::CompletionFailed(_)
        )
    }
}
