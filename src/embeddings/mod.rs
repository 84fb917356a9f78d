pub mod model;
pub mod provider;

pub use model::{DeterministicEmbeddingModel, EmbeddingModel};
pub use provider::{EmbeddingProvider, ModelFactory};
