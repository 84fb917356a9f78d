// Copyright (c) 2025 Campus Advisor
// SPDX-License-Identifier: BUSL-1.1

//! Embedding model capability.
//!
//! The engine only depends on the `EmbeddingModel` trait; the in-tree
//! backend produces deterministic pseudo-random embeddings seeded from the
//! text hash, normalized to unit length. A transformer backend can replace
//! it without touching any caller.

use crate::errors::AdvisorError;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AdvisorError>;

    fn dimension(&self) -> usize;

    fn name(&self) -> &str;
}

/// Deterministic embedding backend.
///
/// Same text always yields the same vector, which keeps retrieval rankings
/// reproducible across rebuilds and restarts.
pub struct DeterministicEmbeddingModel {
    name: String,
    dimension: usize,
    normalize: bool,
}

impl DeterministicEmbeddingModel {
    pub fn new(name: impl Into<String>, dimension: usize) -> Result<Self, AdvisorError> {
        if dimension == 0 {
            return Err(AdvisorError::EmbeddingUnavailable(
                "embedding dimension must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            name: name.into(),
            dimension,
            normalize: true,
        })
    }

    fn generate(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.to_lowercase().hash(&mut hasher);
        let seed = hasher.finish();

        let mut embedding = Vec::with_capacity(self.dimension);
        let mut current = seed;
        for i in 0..self.dimension {
            // Linear congruential step, perturbed by position.
            current = current
                .wrapping_mul(1664525)
                .wrapping_add(1013904223)
                ^ (i as u64);
            let value = (current as f64 / u64::MAX as f64) * 2.0 - 1.0;
            embedding.push(value as f32);
        }

        if self.normalize {
            let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                for value in &mut embedding {
                    *value /= norm;
                }
            }
        }

        embedding
    }
}

#[async_trait]
impl EmbeddingModel for DeterministicEmbeddingModel {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AdvisorError> {
        Ok(self.generate(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deterministic_output() {
        let model = DeterministicEmbeddingModel::new("test", 128).unwrap();
        let a = model.embed("welding program").await.unwrap();
        let b = model.embed("welding program").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 128);

        let c = model.embed("nursing program").await.unwrap();
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_unit_length() {
        let model = DeterministicEmbeddingModel::new("test", 384).unwrap();
        let embedding = model.embed("financial aid deadlines").await.unwrap();
        let magnitude = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(DeterministicEmbeddingModel::new("test", 0).is_err());
    }

    #[tokio::test]
    async fn test_case_insensitive() {
        let model = DeterministicEmbeddingModel::new("test", 64).unwrap();
        let a = model.embed("Nursing Program").await.unwrap();
        let b = model.embed("nursing program").await.unwrap();
        assert_eq!(a, b);
    }
}
