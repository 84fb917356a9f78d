// Copyright (c) 2025 Campus Advisor
// SPDX-License-Identifier: BUSL-1.1

//! Text-completion capability.
//!
//! The engine treats completion as a black box: prompt and context passages
//! in, free text out. Callers bound the prompt size and apply the timeout;
//! backends only perform the call.

pub mod http;
pub mod template;

use crate::errors::AdvisorError;
use async_trait::async_trait;

pub use http::HttpCompletion;
pub use template::TemplateCompletion;

#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Produce free text for `prompt`, given supporting `context_passages`.
    async fn complete(
        &self,
        prompt: &str,
        context_passages: &[String],
        max_tokens: usize,
    ) -> Result<String, AdvisorError>;

    fn name(&self) -> &str;
}
