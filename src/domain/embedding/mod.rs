//! Embedding domain: vector types and the provider trait

mod provider;
mod types;

pub use provider::EmbeddingProvider;
#[cfg(test)]
pub use provider::mock::MockEmbeddingProvider;
pub use types::{cosine_similarity, Embedding, EmbeddingInput, EmbeddingRequest, EmbeddingResponse};
