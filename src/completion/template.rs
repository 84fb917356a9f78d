// Copyright (c) 2025 Campus Advisor
// SPDX-License-Identifier: BUSL-1.1

//! Offline completion backend.
//!
//! Deterministically folds the retrieved passages into a readable answer.
//! Used when no completion endpoint is configured, and throughout the test
//! suite — identical inputs always produce identical answers.

use crate::completion::TextCompletion;
use crate::errors::AdvisorError;
use async_trait::async_trait;

pub struct TemplateCompletion;

#[async_trait]
impl TextCompletion for TemplateCompletion {
    async fn complete(
        &self,
        prompt: &str,
        context_passages: &[String],
        max_tokens: usize,
    ) -> Result<String, AdvisorError> {
        let mut answer = String::new();

        if context_passages.is_empty() {
            answer.push_str(prompt);
        } else {
            answer.push_str("According to the catalog:\n");
            for passage in context_passages {
                answer.push_str("- ");
                answer.push_str(passage.trim());
                answer.push('\n');
            }
        }

        // Rough 4-chars-per-token cap, mirroring how callers budget prompts.
        let char_budget = max_tokens.saturating_mul(4);
        if answer.len() > char_budget {
            let mut cut = char_budget;
            while !answer.is_char_boundary(cut) {
                cut -= 1;
            }
            answer.truncate(cut);
        }

        Ok(answer)
    }

    fn name(&self) -> &str {
        "template"
    }
}
