// Copyright (c) 2025 Campus Advisor
// SPDX-License-Identifier: BUSL-1.1

//! Document sources feeding the indexer.

use crate::errors::AdvisorError;
use crate::routing::classifier;
use crate::vector::chunk::ChunkMetadata;
use async_trait::async_trait;
use std::path::PathBuf;

/// One logical section of a source document (a page, a catalog entry).
#[derive(Debug, Clone)]
pub struct SourceSection {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// Supplies `{text, metadata}` sections for indexing.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    fn document_id(&self) -> &str;

    async fn sections(&self) -> Result<Vec<SourceSection>, AdvisorError>;
}

/// Fixture source for tests and programmatic indexing.
pub struct InMemorySource {
    document_id: String,
    sections: Vec<SourceSection>,
}

impl InMemorySource {
    pub fn new(document_id: impl Into<String>, sections: Vec<SourceSection>) -> Self {
        Self {
            document_id: document_id.into(),
            sections,
        }
    }
}

#[async_trait]
impl DocumentSource for InMemorySource {
    fn document_id(&self) -> &str {
        &self.document_id
    }

    async fn sections(&self) -> Result<Vec<SourceSection>, AdvisorError> {
        Ok(self.sections.clone())
    }
}

/// Plain-text catalog file. Pages are separated by form feeds (the usual
/// output of PDF-to-text conversion); blank-line separation works too when
/// no form feed is present. Each page is topic-tagged from the same keyword
/// table the router uses, so scoped retrieval and routing stay consistent.
pub struct PlainTextSource {
    document_id: String,
    path: PathBuf,
}

impl PlainTextSource {
    pub fn new(document_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            document_id: document_id.into(),
            path: path.into(),
        }
    }
}

#[async_trait]
impl DocumentSource for PlainTextSource {
    fn document_id(&self) -> &str {
        &self.document_id
    }

    async fn sections(&self) -> Result<Vec<SourceSection>, AdvisorError> {
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AdvisorError::RebuildFailed(format!(
                "cannot read source document {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let pages: Vec<&str> = if text.contains('\u{c}') {
            text.split('\u{c}').collect()
        } else {
            text.split("\n\n").collect()
        };

        Ok(pages
            .into_iter()
            .enumerate()
            .filter(|(_, page)| !page.trim().is_empty())
            .map(|(i, page)| SourceSection {
                text: page.trim().to_string(),
                metadata: ChunkMetadata {
                    topic: classifier::infer_topic(page),
                    page: Some(i as u32 + 1),
                    section: None,
                },
            })
            .collect())
    }
}
