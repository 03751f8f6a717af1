//! Brave Search API provider implementation

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::web_search::{WebResult, WebSearchProvider};
use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClientTrait;

const DEFAULT_BRAVE_BASE_URL: &str = "https://api.search.brave.com";

/// Brave caps `count` at 20 results per request
const MAX_RESULT_COUNT: usize = 20;

/// Brave Search web provider
#[derive(Debug)]
pub struct BraveSearchProvider<C: HttpClientTrait> {
    client: C,
    api_key: String,
    base_url: String,
}

impl<C: HttpClientTrait> BraveSearchProvider<C> {
    /// Create a new Brave search provider
    pub fn new(client: C, api_key: impl Into<String>) -> Result<Self, DomainError> {
        Self::with_base_url(client, api_key, DEFAULT_BRAVE_BASE_URL)
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
                "Brave Search API key is required (set BRAVE_API_KEY)",
            ));
        }

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self) -> String {
        format!("{}/res/v1/web/search", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Accept", "application/json"),
            ("Accept-Encoding", "gzip"),
            ("X-Subscription-Token", self.api_key.as_str()),
        ]
    }
}

#[async_trait]
impl<C: HttpClientTrait> WebSearchProvider for BraveSearchProvider<C> {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<WebResult>, DomainError> {
        let query_params = vec![
            ("q", query.to_string()),
            ("count", count.min(MAX_RESULT_COUNT).to_string()),
            ("search_lang", "en".to_string()),
        ];

        let json = self
            .client
            .get_json(&self.search_url(), self.headers(), query_params)
            .await?;

        let response: BraveSearchResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("brave", format!("Failed to parse search response: {}", e))
        })?;

        let results = response
            .web
            .map(|w| w.results)
            .unwrap_or_default()
            .into_iter()
            .map(|r| {
                WebResult::new(
                    r.title.unwrap_or_else(|| "No title".to_string()),
                    r.url.unwrap_or_else(|| "No URL".to_string()),
                    r.description.unwrap_or_else(|| "No description".to_string()),
                )
            })
            .collect();

        Ok(results)
    }

    fn provider_name(&self) -> &'static str {
        "brave"
    }
}

// Brave API response types

#[derive(Debug, Deserialize)]
struct BraveSearchResponse {
    web: Option<BraveWebResults>,
}

#[derive(Debug, Deserialize)]
struct BraveWebResults {
    #[serde(default)]
    results: Vec<BraveWebResult>,
}

#[derive(Debug, Deserialize)]
struct BraveWebResult {
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
}
