// Copyright (c) 2025 Campus Advisor
// SPDX-License-Identifier: BUSL-1.1

//! HTTP completion backend.
//!
//! Posts `{prompt, context, max_tokens}` as JSON to a configured endpoint
//! and expects `{text}` back. The request carries its own timeout; callers
//! apply the specialist budget on top.

use crate::completion::TextCompletion;
use crate::errors::AdvisorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    context: &'a [String],
    max_tokens: usize,
}

#[derive(Deserialize)]
struct CompletionResponse {
    text: String,
}

pub struct HttpCompletion {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpCompletion {
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> Result<Self, AdvisorError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| AdvisorError::CompletionFailed(format!("client build failed: {}", e)))?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait]
impl TextCompletion for HttpCompletion {
    async fn complete(
        &self,
        prompt: &str,
        context_passages: &[String],
        max_tokens: usize,
    ) -> Result<String, AdvisorError> {
        let request = CompletionRequest {
            prompt,
            context: context_passages,
            max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| AdvisorError::CompletionFailed(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AdvisorError::CompletionFailed(format!(
                "endpoint returned {}",
                response.status()
            )));
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AdvisorError::CompletionFailed(format!("invalid response body: {}", e)))?;

        Ok(body.text)
    }

    fn name(&self) -> &str {
        "http"
    }
}
