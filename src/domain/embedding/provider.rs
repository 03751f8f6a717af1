//! Embedding provider trait definition

use async_trait::async_trait;
use std::fmt::Debug;

use super::{EmbeddingRequest, EmbeddingResponse};
use crate::domain::DomainError;

/// Trait for embedding providers (Nomic Atlas, sentence-transformers, etc.)
///
/// The dimension is fixed per provider instance and must match the vector
/// column width of whichever store the embeddings land in.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Generate embeddings for the given input
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;

    /// Get the default model for this provider
    fn default_model(&self) -> &'static str;

    /// Get the embedding dimensions produced by this provider instance
    fn dimensions(&self) -> usize;
}

#[cfg(test)]
pub mod mock {
    use std::collections::HashMap;

    use super::*;
    use crate::domain::embedding::Embedding;

    /// Deterministic mock provider. By default vectors are derived from a
    /// text hash; individual texts can be pinned to fixed vectors so tests
    /// can force a chosen similarity between two distinct queries.
    #[derive(Debug)]
    pub struct MockEmbeddingProvider {
        name: &'static str,
        dimensions: usize,
        pinned: HashMap<String, Vec<f32>>,
        error: Option<String>,
    }

    impl MockEmbeddingProvider {
        pub fn new(name: &'static str, dimensions: usize) -> Self {
            Self {
                name,
                dimensions,
                pinned: HashMap::new(),
                error: None,
            }
        }

        pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
            self.pinned.insert(text.into(), vector);
            self
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        fn vector_for(&self, text: &str) -> Vec<f32> {
            if let Some(vector) = self.pinned.get(text) {
                return vector.clone();
            }

            let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_add(b as u64));
            (0..self.dimensions)
                .map(|i| ((hash.wrapping_add(i as u64) % 1000) as f32 / 1000.0) - 0.5)
                .collect()
        }
    }

    #[async_trait]
    impl EmbeddingProvider for MockEmbeddingProvider {
        async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError> {
            if let Some(ref error) = self.error {
                return Err(DomainError::provider(self.name, error));
            }

            let embeddings: Vec<Embedding> = request
                .inputs()
                .iter()
                .enumerate()
                .map(|(idx, text)| Embedding::new(idx, self.vector_for(text)))
                .collect();

            Ok(EmbeddingResponse::new(request.model().to_string(), embeddings))
        }

        fn provider_name(&self) -> &'static str {
            self.name
        }

        fn default_model(&self) -> &'static str {
            "mock-embedding"
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_provider_single_input() {
            let provider = MockEmbeddingProvider::new("test", 128);
            let request = EmbeddingRequest::single("mock-embedding", "Hello");

            let response = provider.embed(request).await.unwrap();

            assert_eq!(response.embeddings().len(), 1);
            assert_eq!(response.embeddings()[0].vector().len(), 128);
        }

        #[tokio::test]
        async fn test_mock_provider_deterministic() {
            let provider = MockEmbeddingProvider::new("test", 64);

            let a = provider
                .embed(EmbeddingRequest::single("mock-embedding", "Hello"))
                .await
                .unwrap();
            let b = provider
                .embed(EmbeddingRequest::single("mock-embedding", "Hello"))
                .await
                .unwrap();

            assert_eq!(a.embeddings()[0].vector(), b.embeddings()[0].vector());
        }

        #[tokio::test]
        async fn test_mock_provider_pinned_vector() {
            let provider =
                MockEmbeddingProvider::new("test", 3).with_vector("apple", vec![1.0, 0.0, 0.0]);

            let response = provider
                .embed(EmbeddingRequest::single("mock-embedding", "apple"))
                .await
                .unwrap();

            assert_eq!(response.embeddings()[0].vector(), &[1.0, 0.0, 0.0]);
        }

        #[tokio::test]
        async fn test_mock_provider_error() {
            let provider = MockEmbeddingProvider::new("test", 128).with_error("API error");
            let request = EmbeddingRequest::single("mock-embedding", "Hello");

            assert!(provider.embed(request).await.is_err());
        }
    }
}
