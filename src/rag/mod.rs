// Retrieval-augmentation: query embedding, scoped index search, rebuilds.

pub mod indexer;
pub mod retriever;
pub mod source;

pub use indexer::Indexer;
pub use retriever::{RetrievalOutcome, Retriever};
pub use source::{DocumentSource, InMemorySource, PlainTextSource, SourceSection};
