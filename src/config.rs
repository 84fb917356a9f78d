// Copyright (c) 2025 Campus Advisor
// SPDX-License-Identifier: BUSL-1.1

//! Engine configuration.
//!
//! Every knob has a default good enough for local development; `from_env`
//! overrides from `ADVISOR_*` environment variables using parse-with-fallback
//! so a malformed value never aborts startup.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub model_name: String,
    pub dimension: usize,
    /// Max entries in the query-embedding LRU cache.
    pub cache_size: usize,
    pub embed_timeout: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_name: "hashed-minilm-384".to_string(),
            dimension: 384,
            cache_size: 512,
            embed_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Default top-K when the caller does not specify one.
    pub default_k: usize,
    pub retrieve_timeout: Duration,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_k: 5,
            retrieve_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpecialistConfig {
    /// Overall budget for one specialist, completion call included.
    pub timeout: Duration,
    /// Max retrieved passages folded into a prompt.
    pub max_context_passages: usize,
    /// Per-passage character cap when building prompts.
    pub max_passage_chars: usize,
    pub completion_max_tokens: usize,
}

impl Default for SpecialistConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            max_context_passages: 4,
            max_passage_chars: 600,
            completion_max_tokens: 512,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionStoreConfig {
    pub max_sessions: usize,
    /// FIFO cap on per-session history entries.
    pub max_history: usize,
    pub idle_timeout: Duration,
    /// Persist to disk every N appends; 0 disables autosave.
    pub autosave_every: usize,
    pub persist_path: Option<PathBuf>,
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            max_sessions: 1000,
            max_history: 50,
            idle_timeout: Duration::from_secs(24 * 3600),
            autosave_every: 10,
            persist_path: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AdvisorConfig {
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub specialists: SpecialistConfig,
    pub session: SessionStoreConfig,
    /// Directory for the index snapshot and session file.
    pub data_dir: Option<PathBuf>,
    /// Plain-text catalog to index at startup when no snapshot exists.
    pub catalog_path: Option<PathBuf>,
    /// Completion backend endpoint; None selects the offline template backend.
    pub completion_url: Option<String>,
}

impl AdvisorConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.embedding.dimension = env_parse("ADVISOR_EMBEDDING_DIM", config.embedding.dimension);
        config.embedding.cache_size =
            env_parse("ADVISOR_EMBEDDING_CACHE", config.embedding.cache_size);
        config.retrieval.default_k = env_parse("ADVISOR_RETRIEVAL_K", config.retrieval.default_k);
        config.specialists.timeout = Duration::from_millis(env_parse(
            "ADVISOR_SPECIALIST_TIMEOUT_MS",
            config.specialists.timeout.as_millis() as u64,
        ));
        config.specialists.completion_max_tokens = env_parse(
            "ADVISOR_COMPLETION_MAX_TOKENS",
            config.specialists.completion_max_tokens,
        );
        config.session.max_sessions = env_parse("ADVISOR_MAX_SESSIONS", config.session.max_sessions);
        config.session.max_history = env_parse("ADVISOR_SESSION_HISTORY", config.session.max_history);
        config.session.idle_timeout = Duration::from_secs(env_parse(
            "ADVISOR_SESSION_IDLE_SECS",
            config.session.idle_timeout.as_secs(),
        ));

        config.data_dir = env::var("ADVISOR_DATA_DIR").ok().map(PathBuf::from);
        config.catalog_path = env::var("ADVISOR_CATALOG_PATH").ok().map(PathBuf::from);
        config.completion_url = env::var("ADVISOR_COMPLETION_URL").ok();

        if let Some(dir) = &config.data_dir {
            config.session.persist_path = Some(dir.join("sessions.json"));
        }

        config
    }

    pub fn index_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("index.bin"))
    }
}
