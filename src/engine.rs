// Copyright (c) 2025 Campus Advisor
// SPDX-License-Identifier: BUSL-1.1

//! Engine assembly.
//!
//! Wires the embedding provider, vector index, retriever, specialists,
//! session store, and orchestrator from one config plus a completion
//! backend. The binary and the integration tests both build through here.

use crate::completion::{HttpCompletion, TemplateCompletion, TextCompletion};
use crate::config::AdvisorConfig;
use crate::domain::Domain;
use crate::embeddings::EmbeddingProvider;
use crate::errors::AdvisorError;
use crate::monitoring::metrics::names;
use crate::monitoring::EngineMetrics;
use crate::rag::{DocumentSource, Indexer, Retriever};
use crate::routing::{Orchestrator, QueryRequest, QueryResponse};
use crate::session::SessionStore;
use crate::specialists::SpecialistHandler;
use crate::vector::{persistence, VectorIndex};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub struct AdvisorEngine {
    config: AdvisorConfig,
    embedder: Arc<EmbeddingProvider>,
    index: Arc<VectorIndex>,
    indexer: Indexer,
    sessions: Arc<SessionStore>,
    metrics: Arc<EngineMetrics>,
    orchestrator: Orchestrator,
}

impl AdvisorEngine {
    /// Build with the completion backend implied by the config: HTTP when an
    /// endpoint is configured, the offline template backend otherwise.
    pub fn from_config(config: AdvisorConfig) -> Result<Self, AdvisorError> {
        let completion: Arc<dyn TextCompletion> = match &config.completion_url {
            Some(url) => Arc::new(HttpCompletion::new(url.clone(), config.specialists.timeout)?),
            None => Arc::new(TemplateCompletion),
        };
        Ok(Self::with_completion(config, completion))
    }

    pub fn with_completion(config: AdvisorConfig, completion: Arc<dyn TextCompletion>) -> Self {
        let embedder = Arc::new(EmbeddingProvider::new(config.embedding.clone()));
        let index = Arc::new(VectorIndex::new(config.embedding.dimension));
        let retriever = Arc::new(Retriever::new(
            Arc::clone(&embedder),
            Arc::clone(&index),
            config.retrieval.clone(),
        ));
        let indexer = Indexer::new(Arc::clone(&embedder), Arc::clone(&index));
        let sessions = Arc::new(SessionStore::new(config.session.clone()));
        let metrics = Arc::new(EngineMetrics::new());

        let handlers = [
            Domain::Admissions,
            Domain::Academics,
            Domain::FinancialAid,
            Domain::General,
        ]
        .into_iter()
        .map(|domain| {
            Arc::new(SpecialistHandler::new(
                domain,
                Arc::clone(&retriever),
                Arc::clone(&completion),
                config.specialists.clone(),
            ))
        })
        .collect();

        let orchestrator = Orchestrator::new(
            handlers,
            Arc::clone(&sessions),
            Arc::clone(&metrics),
            config.specialists.clone(),
        );

        Self {
            config,
            embedder,
            index,
            indexer,
            sessions,
            metrics,
            orchestrator,
        }
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// Times the embedding model has loaded; stays at zero across a
    /// snapshot restore.
    pub fn embedding_load_count(&self) -> usize {
        self.embedder.load_count()
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub async fn handle_query(&self, request: QueryRequest) -> Result<QueryResponse, AdvisorError> {
        self.orchestrator.handle_query(request).await
    }

    /// Explicit rebuild; the only path that embeds documents.
    pub async fn rebuild_from(&self, source: &dyn DocumentSource) -> Result<u64, AdvisorError> {
        let generation = self.indexer.rebuild_from(source).await?;
        self.metrics.increment(names::INDEX_REBUILDS);
        if let Some(path) = self.config.index_path() {
            persistence::save_index(&self.index, &path).await?;
        }
        Ok(generation)
    }

    /// Restore persisted state (index snapshot and sessions) after restart.
    /// Missing files are a clean start. Returns true when an index
    /// generation was restored.
    pub async fn restore(&self) -> Result<bool, AdvisorError> {
        self.sessions.load_from_disk().await?;

        let Some(path) = self.config.index_path() else {
            return Ok(false);
        };
        if !Path::new(&path).exists() {
            return Ok(false);
        }
        let chunks = persistence::load_chunks(&path, self.config.embedding.dimension)?;
        let count = chunks.len();
        self.index.install_generation(chunks).await?;
        info!(chunks = count, "index restored from snapshot");
        Ok(true)
    }
}
