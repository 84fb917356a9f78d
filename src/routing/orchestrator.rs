// Copyright (c) 2025 Campus Advisor
// SPDX-License-Identifier: BUSL-1.1

//! Query orchestration.
//!
//! Per-query lifecycle: Received → Classified → Dispatched → Aggregated →
//! Responded. Selected specialists run concurrently and independently — no
//! specialist observes another's in-flight result — and every contained
//! failure becomes a degraded-domain marker instead of aborting siblings.
//! Partial answers always beat no answer.

use crate::config::SpecialistConfig;
use crate::domain::Domain;
use crate::errors::AdvisorError;
use crate::monitoring::metrics::names;
use crate::monitoring::EngineMetrics;
use crate::routing::classifier::{self, RoutingDecision};
use crate::session::SessionStore;
use crate::specialists::{SpecialistHandler, SpecialistResponse};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Immutable once issued.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub text: String,
    pub session_id: Option<String>,
    pub declared_topic: Option<Domain>,
}

impl QueryRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            session_id: None,
            declared_topic: None,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub answer_text: String,
    pub domains_used: Vec<Domain>,
    pub degraded_domains: Vec<Domain>,
    pub session_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryState {
    Received,
    Classified,
    Dispatched,
    Aggregated,
    Responded,
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryState::Received => "received",
            QueryState::Classified => "classified",
            QueryState::Dispatched => "dispatched",
            QueryState::Aggregated => "aggregated",
            QueryState::Responded => "responded",
        };
        f.write_str(s)
    }
}

const MAX_QUERY_CHARS: usize = 8 * 1024;

pub struct Orchestrator {
    handlers: HashMap<Domain, Arc<SpecialistHandler>>,
    sessions: Arc<SessionStore>,
    metrics: Arc<EngineMetrics>,
    specialist_config: SpecialistConfig,
}

impl Orchestrator {
    pub fn new(
        handlers: Vec<Arc<SpecialistHandler>>,
        sessions: Arc<SessionStore>,
        metrics: Arc<EngineMetrics>,
        specialist_config: SpecialistConfig,
    ) -> Self {
        let handlers = handlers.into_iter().map(|h| (h.domain(), h)).collect();
        Self {
            handlers,
            sessions,
            metrics,
            specialist_config,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }

    /// Handle one query end to end.
    pub async fn handle_query(&self, request: QueryRequest) -> Result<QueryResponse, AdvisorError> {
        self.handle_query_with_cancellation(request, CancellationToken::new())
            .await
    }

    /// As `handle_query`, abandoning outstanding specialist calls when
    /// `cancel` fires. A cancelled query commits nothing to the session.
    pub async fn handle_query_with_cancellation(
        &self,
        request: QueryRequest,
        cancel: CancellationToken,
    ) -> Result<QueryResponse, AdvisorError> {
        let mut state = QueryState::Received;
        self.metrics.increment(names::QUERIES_TOTAL);
        debug!(state = %state, "query received");

        let text = request.text.trim();
        if text.is_empty() {
            return Err(AdvisorError::InvalidQuery("empty query text".to_string()));
        }
        if text.len() > MAX_QUERY_CHARS {
            return Err(AdvisorError::InvalidQuery(format!(
                "query text exceeds {} characters",
                MAX_QUERY_CHARS
            )));
        }

        let decision = classifier::classify(text, request.declared_topic);
        state = QueryState::Classified;
        debug!(state = %state, domains = ?decision.selected(), "query classified");
        for selection in &decision.domains {
            self.metrics
                .increment(&names::routed_to(selection.domain.as_tag()));
        }

        let session_id = self
            .sessions
            .get_or_create(request.session_id.as_deref())
            .await?;
        let session_context = self.sessions.context_summary(&session_id).await;

        let outcomes = tokio::select! {
            outcomes = self.dispatch(text, &decision, session_context.as_deref()) => outcomes,
            _ = cancel.cancelled() => {
                self.metrics.increment(names::QUERIES_CANCELLED);
                info!(session = %session_id, "query cancelled; specialist calls abandoned");
                return Err(AdvisorError::Cancelled);
            }
        };
        state = QueryState::Dispatched;
        debug!(state = %state, specialists = outcomes.len(), "specialists finished");

        let (answer_text, domains_used, degraded_domains) = self.aggregate(outcomes);
        state = QueryState::Aggregated;
        debug!(state = %state, used = domains_used.len(), "responses aggregated");
        if !degraded_domains.is_empty() {
            self.metrics.increment(names::QUERIES_DEGRADED);
            for domain in &degraded_domains {
                self.metrics.increment(&names::degraded(domain.as_tag()));
            }
        }

        // Committed only after aggregation; a cancelled or failed query
        // leaves no partial session entry.
        self.sessions
            .append(&session_id, text, &answer_text, &domains_used)
            .await?;

        state = QueryState::Responded;
        info!(
            state = %state,
            session = %session_id,
            domains = ?domains_used,
            degraded = ?degraded_domains,
            "query answered"
        );

        Ok(QueryResponse {
            answer_text,
            domains_used,
            degraded_domains,
            session_id,
        })
    }

    /// Run every selected specialist concurrently, each under the
    /// specialist budget. Returns one outcome per domain, in decision order.
    async fn dispatch(
        &self,
        text: &str,
        decision: &RoutingDecision,
        session_context: Option<&str>,
    ) -> Vec<(Domain, Result<SpecialistResponse, AdvisorError>)> {
        let futures = decision.domains.iter().map(|selection| {
            let domain = selection.domain;
            let handler = self.handlers.get(&domain).cloned();
            let budget = self.specialist_config.timeout;
            async move {
                let Some(handler) = handler else {
                    error!(domain = %domain, "no handler registered");
                    return (
                        domain,
                        Err(AdvisorError::CompletionFailed(format!(
                            "no handler for domain {}",
                            domain
                        ))),
                    );
                };
                // Outer guard over the whole specialist call; the handler
                // also budgets its completion call internally.
                let result = match tokio::time::timeout(
                    budget,
                    handler.handle(text, session_context),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(AdvisorError::SpecialistTimeout {
                        domain,
                        budget_ms: budget.as_millis() as u64,
                    }),
                };
                (domain, result)
            }
        });

        futures::future::join_all(futures).await
    }

    /// Concatenate responses in fixed domain order; contained failures
    /// become degraded notices.
    fn aggregate(
        &self,
        outcomes: Vec<(Domain, Result<SpecialistResponse, AdvisorError>)>,
    ) -> (String, Vec<Domain>, Vec<Domain>) {
        let mut responses: Vec<SpecialistResponse> = Vec::new();
        let mut degraded: Vec<Domain> = Vec::new();

        let ordered = Domain::AGGREGATION_ORDER
            .iter()
            .copied()
            .chain(std::iter::once(Domain::General));
        for domain in ordered {
            for (outcome_domain, result) in &outcomes {
                if *outcome_domain != domain {
                    continue;
                }
                match result {
                    Ok(response) => responses.push(response.clone()),
                    Err(e) => {
                        if e.is_degradable() {
                            warn!(domain = %domain, code = e.error_code(), "specialist degraded");
                        } else {
                            error!(domain = %domain, code = e.error_code(), "specialist failed");
                        }
                        degraded.push(domain);
                    }
                }
            }
        }

        let domains_used: Vec<Domain> = responses.iter().map(|r| r.domain).collect();

        let mut answer = if responses.len() == 1 {
            // Single domain: the specialist's answer verbatim.
            responses.remove(0).answer_text
        } else {
            responses
                .iter()
                .map(|r| format!("[{}]\n{}", r.domain, r.answer_text))
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        if !degraded.is_empty() {
            let notice = degraded
                .iter()
                .map(|d| d.as_tag())
                .collect::<Vec<_>>()
                .join(", ");
            if answer.is_empty() {
                answer = format!(
                    "No advisors could answer right now ({} unavailable). Please try again shortly.",
                    notice
                );
            } else {
                answer.push_str(&format!(
                    "\n\n(Note: the {} advisor could not answer right now.)",
                    notice
                ));
            }
        }

        (answer, domains_used, degraded)
    }
}
