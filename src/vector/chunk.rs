// Copyright (c) 2025 Campus Advisor
// SPDX-License-Identifier: BUSL-1.1

//! Indexed document chunks and retrieval results.

use crate::domain::Domain;
use crate::errors::AdvisorError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Topic tag restricting which scopes see this chunk.
    pub topic: Option<Domain>,
    pub page: Option<u32>,
    pub section: Option<String>,
}

/// One indexed chunk. Created at indexing time, immutable thereafter; a
/// rebuild replaces the whole set atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub chunk_id: String,
    pub source_document_id: String,
    /// Ordinal position within the source document.
    pub position: usize,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: ChunkMetadata,
}

impl DocumentChunk {
    /// Validates dimension and finiteness before a chunk enters a generation.
    pub fn validate(&self, expected_dimension: usize) -> Result<(), AdvisorError> {
        if self.embedding.len() != expected_dimension {
            return Err(AdvisorError::RebuildFailed(format!(
                "chunk {} has {} dimensions, expected {}",
                self.chunk_id,
                self.embedding.len(),
                expected_dimension
            )));
        }
        if self.embedding.iter().any(|v| !v.is_finite()) {
            return Err(AdvisorError::RebuildFailed(format!(
                "chunk {} contains NaN or Infinity values",
                self.chunk_id
            )));
        }
        Ok(())
    }
}

/// One ranked passage returned by the retriever.
///
/// Rank is 0-based and strictly increasing by descending score; ties are
/// broken by chunk_id ascending so identical inputs always rank identically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub chunk_id: String,
    pub text: String,
    pub score: f32,
    pub rank: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, embedding: Vec<f32>) -> DocumentChunk {
        DocumentChunk {
            chunk_id: id.to_string(),
            source_document_id: "catalog".to_string(),
            position: 0,
            text: "text".to_string(),
            embedding,
            metadata: ChunkMetadata::default(),
        }
    }

    #[test]
    fn test_validate_dimension() {
        assert!(chunk("c1", vec![0.1; 8]).validate(8).is_ok());
        assert!(chunk("c1", vec![0.1; 8]).validate(16).is_err());
    }

    #[test]
    fn test_validate_rejects_nan() {
        let mut bad = chunk("c1", vec![0.1; 8]);
        bad.embedding[3] = f32::NAN;
        assert!(bad.validate(8).is_err());
    }
}
