// Copyright (c) 2025 Campus Advisor
// SPDX-License-Identifier: BUSL-1.1

//! Graceful degradation: empty index, slow specialists, broken embeddings,
//! and cancellation. Partial answers always beat no answer.

use async_trait::async_trait;
use campus_advisor::completion::{TemplateCompletion, TextCompletion};
use campus_advisor::config::{AdvisorConfig, RetrievalConfig, SpecialistConfig};
use campus_advisor::embeddings::{EmbeddingProvider, ModelFactory};
use campus_advisor::errors::AdvisorError;
use campus_advisor::monitoring::EngineMetrics;
use campus_advisor::rag::{InMemorySource, Retriever, SourceSection};
use campus_advisor::routing::{Orchestrator, QueryRequest};
use campus_advisor::session::SessionStore;
use campus_advisor::specialists::SpecialistHandler;
use campus_advisor::vector::{ChunkMetadata, VectorIndex};
use campus_advisor::{AdvisorEngine, Domain};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Sleeps only for prompts addressed to one domain's advisor, so a single
/// specialist blows its budget while siblings answer normally.
struct SelectivelySlowCompletion {
    slow_marker: &'static str,
    delay: Duration,
}

#[async_trait]
impl TextCompletion for SelectivelySlowCompletion {
    async fn complete(
        &self,
        prompt: &str,
        context_passages: &[String],
        max_tokens: usize,
    ) -> Result<String, AdvisorError> {
        if prompt.contains(self.slow_marker) {
            tokio::time::sleep(self.delay).await;
        }
        TemplateCompletion
            .complete(prompt, context_passages, max_tokens)
            .await
    }

    fn name(&self) -> &str {
        "selectively-slow"
    }
}

fn section(topic: Option<Domain>, sentence: &str) -> SourceSection {
    SourceSection {
        text: sentence.repeat(6),
        metadata: ChunkMetadata {
            topic,
            page: None,
            section: None,
        },
    }
}

fn seeded_source() -> InMemorySource {
    InMemorySource::new(
        "catalog",
        vec![
            section(
                Some(Domain::Admissions),
                "Applicants complete placement testing before their first quarter. ",
            ),
            section(
                Some(Domain::Academics),
                "The nursing curriculum includes six quarters of clinical work. ",
            ),
            section(
                Some(Domain::FinancialAid),
                "Tuition is charged per credit and payment plans are available. ",
            ),
        ],
    )
}

#[tokio::test]
async fn test_empty_index_yields_templated_answers_quickly() {
    let mut config = AdvisorConfig::default();
    config.embedding.dimension = 64;
    let engine = AdvisorEngine::from_config(config).unwrap();
    // No rebuild: the index is empty.

    let started = Instant::now();
    let response = engine
        .handle_query(QueryRequest::new(
            "What are the requirements for the nursing program?",
        ))
        .await
        .unwrap();

    // Bounded time: no document-scan fallback ran.
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(
        response.domains_used,
        vec![Domain::Admissions, Domain::Academics]
    );
    assert!(response.degraded_domains.is_empty());
    assert!(response.answer_text.contains("don't have enough catalog information"));
    // The empty-index fast path never loads the embedding model.
    assert_eq!(engine.embedding_load_count(), 0);
}

#[tokio::test]
async fn test_one_slow_specialist_degrades_only_itself() {
    let mut config = AdvisorConfig::default();
    config.embedding.dimension = 64;
    config.specialists.timeout = Duration::from_millis(300);

    let completion = Arc::new(SelectivelySlowCompletion {
        slow_marker: "academic advisor",
        delay: Duration::from_secs(30),
    });
    let engine = AdvisorEngine::with_completion(config, completion);
    engine.rebuild_from(&seeded_source()).await.unwrap();

    let started = Instant::now();
    let response = engine
        .handle_query(QueryRequest::new(
            "What are the tuition payment requirements to enroll in the nursing curriculum?",
        ))
        .await
        .unwrap();

    // Returned within the timeout budget, not after 30s.
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(
        response.domains_used,
        vec![Domain::Admissions, Domain::FinancialAid]
    );
    assert_eq!(response.degraded_domains, vec![Domain::Academics]);
    assert!(response.answer_text.contains("[admissions]"));
    assert!(response.answer_text.contains("[financial-aid]"));
    assert!(response.answer_text.contains("could not answer right now"));
}

#[tokio::test]
async fn test_embedding_failure_degrades_not_crashes() {
    let mut config = AdvisorConfig::default();
    config.embedding.dimension = 64;

    let failing: ModelFactory = Arc::new(|| {
        Box::pin(async {
            Err(AdvisorError::EmbeddingUnavailable(
                "model file missing".to_string(),
            ))
        })
    });
    let embedder = Arc::new(EmbeddingProvider::with_factory(
        config.embedding.clone(),
        failing,
    ));
    let index = Arc::new(VectorIndex::new(64));
    // A non-empty index forces retrieval onto the embedding path.
    index
        .upsert(vec![campus_advisor::vector::DocumentChunk {
            chunk_id: "c0".to_string(),
            source_document_id: "catalog".to_string(),
            position: 0,
            text: "Tuition payment plans are available each quarter.".to_string(),
            embedding: vec![0.1; 64],
            metadata: ChunkMetadata::default(),
        }])
        .await
        .unwrap();

    let retriever = Arc::new(Retriever::new(
        embedder,
        index,
        RetrievalConfig::default(),
    ));
    let completion: Arc<dyn TextCompletion> = Arc::new(TemplateCompletion);
    let handlers = [Domain::Admissions, Domain::Academics, Domain::FinancialAid, Domain::General]
        .into_iter()
        .map(|domain| {
            Arc::new(SpecialistHandler::new(
                domain,
                Arc::clone(&retriever),
                Arc::clone(&completion),
                SpecialistConfig::default(),
            ))
        })
        .collect();
    let orchestrator = Orchestrator::new(
        handlers,
        Arc::new(SessionStore::new(Default::default())),
        Arc::new(EngineMetrics::new()),
        SpecialistConfig::default(),
    );

    let response = orchestrator
        .handle_query(QueryRequest::new("How much does tuition cost?"))
        .await
        .unwrap();

    assert!(response.domains_used.is_empty());
    assert_eq!(response.degraded_domains, vec![Domain::FinancialAid]);
    assert!(response.answer_text.contains("unavailable"));
}

#[tokio::test]
async fn test_cancellation_abandons_calls_and_commits_nothing() {
    let mut config = AdvisorConfig::default();
    config.embedding.dimension = 64;
    config.specialists.timeout = Duration::from_secs(60);

    let completion = Arc::new(SelectivelySlowCompletion {
        slow_marker: "advisor",
        delay: Duration::from_secs(60),
    });
    let engine = AdvisorEngine::with_completion(config, completion);
    engine.rebuild_from(&seeded_source()).await.unwrap();

    let session_id = engine.sessions().get_or_create(Some("s1")).await.unwrap();

    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });

    let started = Instant::now();
    let err = engine
        .orchestrator()
        .handle_query_with_cancellation(
            QueryRequest::new("How much does tuition cost?").with_session(session_id.clone()),
            token,
        )
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "CANCELLED");
    assert!(started.elapsed() < Duration::from_secs(5));
    // No partial session write was committed.
    assert_eq!(engine.sessions().history_len(&session_id).await, 0);
}
