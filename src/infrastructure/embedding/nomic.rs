//! Nomic Atlas embedding provider implementation

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::embedding::{
    Embedding, EmbeddingInput, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse,
};
use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClientTrait;

const DEFAULT_NOMIC_BASE_URL: &str = "https://api-atlas.nomic.ai";

/// The Atlas text embedding model served by default, 768 dimensions
const DEFAULT_MODEL: &str = "nomic-embed-text-v1.5";
const NOMIC_DIMENSIONS: usize = 768;

/// Nomic Atlas embedding provider
#[derive(Debug)]
pub struct NomicEmbeddingProvider<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
}

impl<C: HttpClientTrait> NomicEmbeddingProvider<C> {
    /// Create a new Nomic embedding provider
    pub fn new(client: C, api_key: impl Into<String>) -> Result<Self, DomainError> {
        Self::with_base_url(client, api_key, DEFAULT_NOMIC_BASE_URL)
    }

    /// Create a new provider with custom base URL
    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let api_key = api_key.into();

        if api_key.is_empty() {
            return Err(DomainError::configuration(
                "Nomic API key is required (set NOMIC_API_KEY)",
            ));
        }

        Ok(Self {
            client,
            auth_header: format!("Bearer {}", api_key),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn embeddings_url(&self) -> String {
        format!("{}/v1/embedding/text", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn build_request(&self, request: &EmbeddingRequest) -> serde_json::Value {
        let texts: Vec<&str> = match request.input() {
            EmbeddingInput::Single(s) => vec![s.as_str()],
            EmbeddingInput::Batch(v) => v.iter().map(|s| s.as_str()).collect(),
        };

        serde_json::json!({
            "model": request.model(),
            "texts": texts,
        })
    }

    fn parse_response(
        &self,
        model: &str,
        json: serde_json::Value,
    ) -> Result<EmbeddingResponse, DomainError> {
        let response: NomicEmbeddingResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("nomic", format!("Failed to parse embedding response: {}", e))
        })?;

        let embeddings: Vec<Embedding> = response
            .embeddings
            .into_iter()
            .enumerate()
            .map(|(idx, vector)| Embedding::new(idx, vector))
            .collect();

        Ok(EmbeddingResponse::new(model.to_string(), embeddings))
    }
}

#[async_trait]
impl<C: HttpClientTrait> EmbeddingProvider for NomicEmbeddingProvider<C> {
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError> {
        let url = self.embeddings_url();
        let body = self.build_request(&request);

        let response = self.client.post_json(&url, self.headers(), &body).await?;

        self.parse_response(request.model(), response)
    }

    fn provider_name(&self) -> &'static str {
        "nomic"
    }

    fn default_model(&self) -> &'static str {
        DEFAULT_MODEL
    }

    fn dimensions(&self) -> usize {
        NOMIC_DIMENSIONS
    }
}

#[derive(Debug, Deserialize)]
struct NomicEmbeddingResponse {
    embeddings: Vec<Vec<f32>>,
}
