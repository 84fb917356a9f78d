// Copyright (c) 2025 Campus Advisor
// SPDX-License-Identifier: BUSL-1.1

//! Index snapshot persistence.
//!
//! The snapshot carries embeddings, so a restart never re-embeds; only an
//! explicit rebuild does. Writes go to a temp file renamed into place, so a
//! crash mid-save leaves the previous snapshot intact.

use crate::errors::AdvisorError;
use crate::vector::chunk::DocumentChunk;
use crate::vector::index::VectorIndex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    version: u32,
    dimension: usize,
    chunks: Vec<DocumentChunk>,
}

fn persistence_error(path: &Path, reason: impl ToString) -> AdvisorError {
    AdvisorError::IndexPersistence {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Writes the active generation to `path`.
pub async fn save_index(index: &VectorIndex, path: &Path) -> Result<(), AdvisorError> {
    let snapshot = PersistedIndex {
        version: FORMAT_VERSION,
        dimension: index.dimension(),
        chunks: index.snapshot().await,
    };

    let bytes = bincode::serialize(&snapshot).map_err(|e| persistence_error(path, e))?;

    let tmp = path.with_extension("bin.tmp");
    fs::write(&tmp, &bytes).map_err(|e| persistence_error(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| persistence_error(path, e))?;

    info!(
        path = %path.display(),
        chunks = snapshot.chunks.len(),
        "index snapshot saved"
    );
    Ok(())
}

/// Loads a snapshot and validates it against the expected dimension.
/// Returns the chunk set ready for `install_generation`.
pub fn load_chunks(path: &Path, expected_dimension: usize) -> Result<Vec<DocumentChunk>, AdvisorError> {
    let bytes = fs::read(path).map_err(|e| persistence_error(path, e))?;
    let snapshot: PersistedIndex =
        bincode::deserialize(&bytes).map_err(|e| persistence_error(path, e))?;

    if snapshot.version != FORMAT_VERSION {
        return Err(persistence_error(
            path,
            format!(
                "unsupported snapshot version {} (expected {})",
                snapshot.version, FORMAT_VERSION
            ),
        ));
    }
    if snapshot.dimension != expected_dimension {
        return Err(persistence_error(
            path,
            format!(
                "snapshot dimension {} does not match configured {}",
                snapshot.dimension, expected_dimension
            ),
        ));
    }
    for chunk in &snapshot.chunks {
        chunk.validate(expected_dimension)?;
    }

    info!(
        path = %path.display(),
        chunks = snapshot.chunks.len(),
        "index snapshot loaded"
    );
    Ok(snapshot.chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::chunk::ChunkMetadata;

    fn chunk(id: &str, dimension: usize) -> DocumentChunk {
        DocumentChunk {
            chunk_id: id.to_string(),
            source_document_id: "catalog".to_string(),
            position: 0,
            text: format!("text {}", id),
            embedding: vec![0.5; dimension],
            metadata: ChunkMetadata::default(),
        }
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.bin");

        let index = VectorIndex::new(8);
        index
            .install_generation(vec![chunk("c1", 8), chunk("c2", 8)])
            .await
            .unwrap();
        save_index(&index, &path).await.unwrap();

        let chunks = load_chunks(&path, 8).unwrap();
        assert_eq!(chunks.len(), 2);

        let restored = VectorIndex::new(8);
        restored.install_generation(chunks).await.unwrap();
        assert_eq!(restored.len().await, 2);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.bin");

        let index = VectorIndex::new(8);
        index.install_generation(vec![chunk("c1", 8)]).await.unwrap();
        save_index(&index, &path).await.unwrap();

        let err = load_chunks(&path, 16).unwrap_err();
        assert_eq!(err.error_code(), "INDEX_PERSISTENCE");
    }

    #[test]
    fn test_missing_file_is_persistence_error() {
        let err = load_chunks(Path::new("/nonexistent/index.bin"), 8).unwrap_err();
        assert_eq!(err.error_code(), "INDEX_PERSISTENCE");
    }

    #[test]
    fn test_corrupt_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.bin");
        fs::write(&path, b"not a snapshot").unwrap();
        assert!(load_chunks(&path, 8).is_err());
    }
}
