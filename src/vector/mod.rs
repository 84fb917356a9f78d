pub mod chunk;
pub mod chunker;
pub mod index;
pub mod persistence;

pub use chunk::{ChunkMetadata, DocumentChunk, RetrievalResult};
pub use index::VectorIndex;
