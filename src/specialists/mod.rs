// Copyright (c) 2025 Campus Advisor
// SPDX-License-Identifier: BUSL-1.1

//! Domain specialist handlers.
//!
//! Each specialist is the same handler parameterized by a profile: a scope
//! tag, a prompt preamble, and an insufficient-information template. A
//! specialist with no retrieved passages answers from its template instead
//! of failing; a completion call that overruns the budget surfaces
//! `SpecialistTimeout` so the orchestrator can degrade just that domain.

use crate::completion::TextCompletion;
use crate::config::SpecialistConfig;
use crate::domain::{Domain, Scope};
use crate::errors::AdvisorError;
use crate::rag::{RetrievalOutcome, Retriever};
use crate::vector::RetrievalResult;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct SpecialistProfile {
    pub domain: Domain,
    pub scope: Scope,
    pub preamble: &'static str,
    pub insufficient_template: &'static str,
}

static PROFILES: [SpecialistProfile; 4] = [
    SpecialistProfile {
        domain: Domain::Admissions,
        scope: Scope::Topic(Domain::Admissions),
        preamble: "You are an admissions advisor. Answer the student's question about \
                   applications, requirements, enrollment, or placement using the catalog \
                   passages provided.",
        insufficient_template: "I don't have enough catalog information to answer that \
                                admissions question. Please contact the admissions office \
                                directly.",
    },
    SpecialistProfile {
        domain: Domain::Academics,
        scope: Scope::Topic(Domain::Academics),
        preamble: "You are an academic advisor. Answer the student's question about \
                   programs, courses, curriculum, or credits using the catalog passages \
                   provided.",
        insufficient_template: "I don't have enough catalog information to answer that \
                                academic question. Please check with an academic advisor.",
    },
    SpecialistProfile {
        domain: Domain::FinancialAid,
        scope: Scope::Topic(Domain::FinancialAid),
        preamble: "You are a financial aid advisor. Answer the student's question about \
                   costs, tuition, scholarships, or payment options using the catalog \
                   passages provided.",
        insufficient_template: "I don't have enough catalog information to answer that \
                                cost or financial aid question. Please contact the financial \
                                aid office for current figures.",
    },
    SpecialistProfile {
        domain: Domain::General,
        scope: Scope::All,
        preamble: "You are a student advisor. Answer the student's question using the \
                   catalog passages provided.",
        insufficient_template: "I couldn't find catalog information for that question. \
                                Could you rephrase it, or ask about admissions, programs, \
                                or financial aid?",
    },
];

pub fn profile_for(domain: Domain) -> &'static SpecialistProfile {
    PROFILES
        .iter()
        .find(|p| p.domain == domain)
        .expect("every domain has a profile")
}

/// Immutable once produced; aggregated by the orchestrator in fixed order.
#[derive(Debug, Clone)]
pub struct SpecialistResponse {
    pub domain: Domain,
    pub answer_text: String,
    pub supporting: Vec<RetrievalResult>,
}

pub struct SpecialistHandler {
    profile: &'static SpecialistProfile,
    retriever: Arc<Retriever>,
    completion: Arc<dyn TextCompletion>,
    config: SpecialistConfig,
}

impl SpecialistHandler {
    pub fn new(
        domain: Domain,
        retriever: Arc<Retriever>,
        completion: Arc<dyn TextCompletion>,
        config: SpecialistConfig,
    ) -> Self {
        Self {
            profile: profile_for(domain),
            retriever,
            completion,
            config,
        }
    }

    pub fn domain(&self) -> Domain {
        self.profile.domain
    }

    /// Handle one query within this specialist's scope.
    pub async fn handle(
        &self,
        query_text: &str,
        session_context: Option<&str>,
    ) -> Result<SpecialistResponse, AdvisorError> {
        let outcome = self
            .retriever
            .retrieve(query_text, self.profile.scope, None)
            .await?;

        let results = match outcome {
            RetrievalOutcome::NoResults => {
                debug!(domain = %self.profile.domain, "no passages; templated answer");
                return Ok(SpecialistResponse {
                    domain: self.profile.domain,
                    answer_text: self.profile.insufficient_template.to_string(),
                    supporting: Vec::new(),
                });
            }
            RetrievalOutcome::Found(results) => results,
        };

        let passages: Vec<String> = results
            .iter()
            .take(self.config.max_context_passages)
            .map(|r| truncate_chars(&r.text, self.config.max_passage_chars))
            .collect();

        let prompt = self.build_prompt(query_text, session_context);

        let answer_text = tokio::time::timeout(
            self.config.timeout,
            self.completion
                .complete(&prompt, &passages, self.config.completion_max_tokens),
        )
        .await
        .map_err(|_| {
            warn!(domain = %self.profile.domain, "completion exceeded budget");
            AdvisorError::SpecialistTimeout {
                domain: self.profile.domain,
                budget_ms: self.config.timeout.as_millis() as u64,
            }
        })??;

        Ok(SpecialistResponse {
            domain: self.profile.domain,
            answer_text,
            supporting: results,
        })
    }

    fn build_prompt(&self, query_text: &str, session_context: Option<&str>) -> String {
        let mut prompt = String::with_capacity(256);
        prompt.push_str(self.profile.preamble);
        if let Some(context) = session_context {
            if !context.is_empty() {
                prompt.push_str("\nStudent context: ");
                prompt.push_str(context);
            }
        }
        prompt.push_str("\nStudent question: ");
        prompt.push_str(query_text);
        prompt
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.len() <= max_chars {
        return text.to_string();
    }
    let mut cut = max_chars;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text[..cut].to_string()
}
