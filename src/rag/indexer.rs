// Copyright (c) 2025 Campus Advisor
// SPDX-License-Identifier: BUSL-1.1

//! Index rebuilds from a document source.
//!
//! A rebuild is all-or-nothing: the new generation is fully chunked and
//! embedded off to the side, and any failure along the way leaves the old
//! generation serving. Chunk ids derive from document id and position, so
//! rebuilding the same source twice yields the same chunk_id set.

use crate::embeddings::EmbeddingProvider;
use crate::errors::AdvisorError;
use crate::rag::source::DocumentSource;
use crate::vector::chunk::DocumentChunk;
use crate::vector::chunker::{self, DEFAULT_MAX_CHUNK_CHARS, DEFAULT_MIN_CHUNK_CHARS};
use crate::vector::VectorIndex;
use std::sync::Arc;
use tracing::{info, warn};

pub struct Indexer {
    embedder: Arc<EmbeddingProvider>,
    index: Arc<VectorIndex>,
}

impl Indexer {
    pub fn new(embedder: Arc<EmbeddingProvider>, index: Arc<VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Atomically replaces the active generation with the source's content.
    /// Returns the new generation id.
    pub async fn rebuild_from(&self, source: &dyn DocumentSource) -> Result<u64, AdvisorError> {
        let document_id = source.document_id().to_string();
        info!(document = %document_id, "index rebuild started");

        let sections = source.sections().await?;
        if sections.is_empty() {
            warn!(document = %document_id, "source produced no sections");
        }

        let mut chunks = Vec::new();
        let mut position = 0usize;
        for (section_idx, section) in sections.iter().enumerate() {
            let pieces = chunker::split_into_chunks(
                &section.text,
                DEFAULT_MAX_CHUNK_CHARS,
                DEFAULT_MIN_CHUNK_CHARS,
            );
            for (piece_idx, text) in pieces.into_iter().enumerate() {
                let embedding = self.embedder.embed(&text).await.map_err(|e| {
                    AdvisorError::RebuildFailed(format!(
                        "embedding failed at section {}: {}",
                        section_idx, e
                    ))
                })?;
                chunks.push(DocumentChunk {
                    chunk_id: format!("{}-s{}-c{}", document_id, section_idx, piece_idx),
                    source_document_id: document_id.clone(),
                    position,
                    text,
                    embedding,
                    metadata: section.metadata.clone(),
                });
                position += 1;
            }
        }

        let generation = self.index.install_generation(chunks).await?;
        info!(
            document = %document_id,
            generation,
            chunks = self.index.len().await,
            "✓ index rebuild complete"
        );
        Ok(generation)
    }
}
