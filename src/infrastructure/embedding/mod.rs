//! Embedding provider implementations

mod nomic;

pub use nomic::NomicEmbeddingProvider;
