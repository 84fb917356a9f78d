// Copyright (c) 2025 Campus Advisor
// SPDX-License-Identifier: BUSL-1.1

//! Query-to-passages retrieval.
//!
//! An empty or unavailable index yields an explicit `NoResults` outcome —
//! never a scan of the original source documents. That fallback was a known
//! multi-second latency source and stays removed; an empty index only gets
//! content through an explicit rebuild.

use crate::config::RetrievalConfig;
use crate::domain::Scope;
use crate::embeddings::EmbeddingProvider;
use crate::errors::AdvisorError;
use crate::vector::{RetrievalResult, VectorIndex};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of a retrieval call. `NoResults` is a valid state, not an error:
/// the scope simply has no matching content.
#[derive(Debug, Clone)]
pub enum RetrievalOutcome {
    Found(Vec<RetrievalResult>),
    NoResults,
}

impl RetrievalOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, RetrievalOutcome::NoResults)
    }

    pub fn results(&self) -> &[RetrievalResult] {
        match self {
            RetrievalOutcome::Found(results) => results,
            RetrievalOutcome::NoResults => &[],
        }
    }
}

pub struct Retriever {
    embedder: Arc<EmbeddingProvider>,
    index: Arc<VectorIndex>,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(
        embedder: Arc<EmbeddingProvider>,
        index: Arc<VectorIndex>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            config,
        }
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    pub fn default_k(&self) -> usize {
        self.config.default_k
    }

    /// Retrieve top-k passages for `query_text` within `scope`, bounded by
    /// the configured retrieval timeout.
    ///
    /// `EmbeddingUnavailable` propagates as an error (the caller degrades);
    /// an empty index, an empty match set, or an overall timeout is
    /// `NoResults`.
    pub async fn retrieve(
        &self,
        query_text: &str,
        scope: Scope,
        k: Option<usize>,
    ) -> Result<RetrievalOutcome, AdvisorError> {
        match tokio::time::timeout(
            self.config.retrieve_timeout,
            self.retrieve_inner(query_text, scope, k),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    timeout_ms = self.config.retrieve_timeout.as_millis() as u64,
                    "retrieval timed out; treating as no results"
                );
                Ok(RetrievalOutcome::NoResults)
            }
        }
    }

    async fn retrieve_inner(
        &self,
        query_text: &str,
        scope: Scope,
        k: Option<usize>,
    ) -> Result<RetrievalOutcome, AdvisorError> {
        let k = k.unwrap_or(self.config.default_k);

        if self.index.is_empty().await {
            warn!(scope = scope.as_tag(), "retrieval against empty index; rebuild required");
            return Ok(RetrievalOutcome::NoResults);
        }

        let embedding = self.embedder.embed(query_text).await?;
        let results = self.index.query(&embedding, k, scope).await?;

        debug!(
            scope = scope.as_tag(),
            k,
            results = results.len(),
            "retrieval complete"
        );

        if results.is_empty() {
            Ok(RetrievalOutcome::NoResults)
        } else {
            Ok(RetrievalOutcome::Found(results))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddingConfig;
    use crate::domain::Domain;
    use crate::vector::chunk::{ChunkMetadata, DocumentChunk};

    async fn seeded_retriever(texts: &[(&str, &str)]) -> Retriever {
        let embedder = Arc::new(EmbeddingProvider::new(EmbeddingConfig {
            dimension: 64,
            ..EmbeddingConfig::default()
        }));
        let index = Arc::new(VectorIndex::new(64));

        let mut chunks = Vec::new();
        for (i, (id, text)) in texts.iter().enumerate() {
            chunks.push(DocumentChunk {
                chunk_id: id.to_string(),
                source_document_id: "catalog".to_string(),
                position: i,
                text: text.to_string(),
                embedding: embedder.embed(text).await.unwrap(),
                metadata: ChunkMetadata::default(),
            });
        }
        index.install_generation(chunks).await.unwrap();

        Retriever::new(embedder, index, RetrievalConfig::default())
    }

    #[tokio::test]
    async fn test_exact_text_ranks_first() {
        let retriever = seeded_retriever(&[
            ("c1", "the nursing program requires anatomy"),
            ("c2", "welding certificate schedule"),
            ("c3", "financial aid application deadlines"),
        ])
        .await;

        let outcome = retriever
            .retrieve("the nursing program requires anatomy", Scope::All, None)
            .await
            .unwrap();
        let results = outcome.results();
        assert_eq!(results[0].chunk_id, "c1");
        assert!(results[0].score > 0.99);
    }

    #[tokio::test]
    async fn test_empty_index_is_no_results() {
        let embedder = Arc::new(EmbeddingProvider::new(EmbeddingConfig {
            dimension: 64,
            ..EmbeddingConfig::default()
        }));
        let index = Arc::new(VectorIndex::new(64));
        let retriever = Retriever::new(embedder.clone(), index, RetrievalConfig::default());

        let outcome = retriever
            .retrieve("anything", Scope::Topic(Domain::Academics), None)
            .await
            .unwrap();
        assert!(outcome.is_empty());
        // The empty-index fast path never touches the embedding model.
        assert_eq!(embedder.load_count(), 0);
    }

    #[tokio::test]
    async fn test_k_caps_result_count() {
        let retriever = seeded_retriever(&[
            ("c1", "admissions info"),
            ("c2", "program info"),
            ("c3", "tuition info"),
            ("c4", "campus info"),
        ])
        .await;

        let outcome = retriever.retrieve("info", Scope::All, Some(2)).await.unwrap();
        assert_eq!(outcome.results().len(), 2);
    }
}
