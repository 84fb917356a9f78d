// Copyright (c) 2025 Campus Advisor
// SPDX-License-Identifier: BUSL-1.1

//! Generational in-memory vector index.
//!
//! The active generation is an immutable `Arc`'d snapshot. Queries clone the
//! `Arc` under a brief read lock and scan without holding it, so a rebuild
//! in flight never blocks readers beyond the pointer swap, and no reader can
//! observe a half-replaced generation. Search is an exact cosine scan —
//! rankings are reproducible, ties broken by chunk_id.

use crate::domain::Scope;
use crate::errors::AdvisorError;
use crate::vector::chunk::{DocumentChunk, RetrievalResult};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug)]
struct Generation {
    id: u64,
    chunks: Vec<DocumentChunk>,
}

#[derive(Debug)]
pub struct VectorIndex {
    dimension: usize,
    generation: RwLock<Arc<Generation>>,
    next_generation: AtomicU64,
}

impl VectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            generation: RwLock::new(Arc::new(Generation {
                id: 0,
                chunks: Vec::new(),
            })),
            next_generation: AtomicU64::new(1),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub async fn len(&self) -> usize {
        self.generation.read().await.chunks.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Identifier of the currently active generation.
    pub async fn generation_id(&self) -> u64 {
        self.generation.read().await.id
    }

    /// Snapshot of the active generation's chunks (for persistence).
    pub async fn snapshot(&self) -> Vec<DocumentChunk> {
        self.generation.read().await.chunks.clone()
    }

    /// Atomically replaces the active generation. Validates every chunk
    /// first; on any validation failure the old generation stays active.
    pub async fn install_generation(
        &self,
        chunks: Vec<DocumentChunk>,
    ) -> Result<u64, AdvisorError> {
        let mut seen = HashSet::with_capacity(chunks.len());
        for chunk in &chunks {
            chunk.validate(self.dimension)?;
            if !seen.insert(chunk.chunk_id.as_str()) {
                return Err(AdvisorError::RebuildFailed(format!(
                    "duplicate chunk_id {}",
                    chunk.chunk_id
                )));
            }
        }

        let id = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let generation = Arc::new(Generation { id, chunks });
        let count = generation.chunks.len();
        *self.generation.write().await = generation;
        info!(generation = id, chunks = count, "✓ index generation installed");
        Ok(id)
    }

    /// Adds or replaces chunks by chunk_id. Copy-on-write: builds the merged
    /// chunk set off to the side and installs it as a new generation, so
    /// concurrent readers stay on the old snapshot until the swap.
    pub async fn upsert(&self, batch: Vec<DocumentChunk>) -> Result<u64, AdvisorError> {
        for chunk in &batch {
            chunk.validate(self.dimension)?;
        }

        let current = Arc::clone(&*self.generation.read().await);
        let replaced: HashSet<String> = batch.iter().map(|c| c.chunk_id.clone()).collect();
        let mut merged: Vec<DocumentChunk> = current
            .chunks
            .iter()
            .filter(|c| !replaced.contains(&c.chunk_id))
            .cloned()
            .collect();
        merged.extend(batch);

        self.install_generation(merged).await
    }

    /// Returns at most `k` results matching `scope`, ordered by descending
    /// cosine similarity. An empty result is a valid state, not an error.
    pub async fn query(
        &self,
        vector: &[f32],
        k: usize,
        scope: Scope,
    ) -> Result<Vec<RetrievalResult>, AdvisorError> {
        if vector.len() != self.dimension {
            return Err(AdvisorError::InvalidQuery(format!(
                "query vector has {} dimensions, expected {}",
                vector.len(),
                self.dimension
            )));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(AdvisorError::InvalidQuery(
                "query vector contains NaN or Infinity".to_string(),
            ));
        }

        let generation = Arc::clone(&*self.generation.read().await);

        let mut scored: Vec<(&DocumentChunk, f32)> = generation
            .chunks
            .iter()
            .filter(|chunk| scope.matches(chunk.metadata.topic))
            .map(|chunk| (chunk, cosine_similarity(vector, &chunk.embedding)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.chunk_id.cmp(&b.0.chunk_id))
        });
        scored.truncate(k);

        debug!(
            generation = generation.id,
            scope = scope.as_tag(),
            results = scored.len(),
            "index query"
        );

        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(rank, (chunk, score))| RetrievalResult {
                chunk_id: chunk.chunk_id.clone(),
                text: chunk.text.clone(),
                score,
                rank,
            })
            .collect())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}
