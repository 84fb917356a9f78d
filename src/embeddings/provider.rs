// Copyright (c) 2025 Campus Advisor
// SPDX-License-Identifier: BUSL-1.1

//! Lazily-initialized embedding provider.
//!
//! The underlying model loads on the first `embed` call, not at process
//! start. Concurrent first calls converge to a single initialization behind
//! a `OnceCell`; the load counter exists so tests can observe exactly one
//! load. A small LRU cache keyed by text hash fronts the model.

use crate::config::EmbeddingConfig;
use crate::embeddings::model::{DeterministicEmbeddingModel, EmbeddingModel};
use crate::errors::AdvisorError;
use futures::future::BoxFuture;
use lru::LruCache;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tracing::{info, warn};

pub type ModelFactory = Arc<
    dyn Fn() -> BoxFuture<'static, Result<Arc<dyn EmbeddingModel>, AdvisorError>> + Send + Sync,
>;

pub struct EmbeddingProvider {
    config: EmbeddingConfig,
    factory: ModelFactory,
    model: OnceCell<Arc<dyn EmbeddingModel>>,
    load_count: Arc<AtomicUsize>,
    cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl EmbeddingProvider {
    /// Provider backed by the deterministic in-tree model.
    pub fn new(config: EmbeddingConfig) -> Self {
        let name = config.model_name.clone();
        let dimension = config.dimension;
        let factory: ModelFactory = Arc::new(move || {
            let name = name.clone();
            Box::pin(async move {
                let model = DeterministicEmbeddingModel::new(name, dimension)?;
                Ok(Arc::new(model) as Arc<dyn EmbeddingModel>)
            })
        });
        Self::with_factory(config, factory)
    }

    /// Provider with a custom model factory. Used to plug real backends and
    /// to exercise slow or failing initialization in tests.
    pub fn with_factory(config: EmbeddingConfig, factory: ModelFactory) -> Self {
        let cache_size = NonZeroUsize::new(config.cache_size.max(1)).unwrap();
        Self {
            config,
            factory,
            model: OnceCell::new(),
            load_count: Arc::new(AtomicUsize::new(0)),
            cache: Mutex::new(LruCache::new(cache_size)),
        }
    }

    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// Number of times the underlying model has been loaded. Stays at 1 for
    /// the process lifetime under any number of concurrent callers.
    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }

    /// Embed `text`, loading the model on first use.
    ///
    /// Fails with `EmbeddingUnavailable` when the model cannot load or the
    /// call exceeds its timeout; callers treat that as retrieval degraded.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, AdvisorError> {
        let key = cache_key(text);
        if let Some(hit) = self.cache.lock().unwrap().get(&key).cloned() {
            return Ok(hit);
        }

        let model = self.model_handle().await?;

        let embedding = tokio::time::timeout(self.config.embed_timeout, model.embed(text))
            .await
            .map_err(|_| {
                warn!(
                    timeout_ms = self.config.embed_timeout.as_millis() as u64,
                    "embedding call timed out"
                );
                AdvisorError::EmbeddingUnavailable(format!(
                    "embed timed out after {}ms",
                    self.config.embed_timeout.as_millis()
                ))
            })??;

        if embedding.len() != self.config.dimension {
            return Err(AdvisorError::EmbeddingUnavailable(format!(
                "model returned {} dimensions, expected {}",
                embedding.len(),
                self.config.dimension
            )));
        }

        self.cache.lock().unwrap().put(key, embedding.clone());
        Ok(embedding)
    }

    async fn model_handle(&self) -> Result<Arc<dyn EmbeddingModel>, AdvisorError> {
        let load_count = Arc::clone(&self.load_count);
        let factory = Arc::clone(&self.factory);
        let model = self
            .model
            .get_or_try_init(|| async move {
                load_count.fetch_add(1, Ordering::SeqCst);
                info!("loading embedding model (first use)");
                let model = factory().await?;
                info!(model = model.name(), dimension = model.dimension(), "✓ embedding model loaded");
                Ok::<_, AdvisorError>(model)
            })
            .await?;
        Ok(Arc::clone(model))
    }
}

fn cache_key(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
