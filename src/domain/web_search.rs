//! Web search provider trait and raw result types

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// A single raw web search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebResult {
    pub title: String,
    pub url: String,
    pub description: String,
}

impl WebResult {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            description: description.into(),
        }
    }
}

/// Trait for web search providers (Brave, offline fixtures, etc.)
#[async_trait]
pub trait WebSearchProvider: Send + Sync + Debug {
    /// Search the web; `count` is capped by the provider (Brave allows 20)
    async fn search(&self, query: &str, count: usize) -> Result<Vec<WebResult>, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;

    #[derive(Debug)]
    pub struct MockWebSearchProvider {
        results: Vec<WebResult>,
        error: Option<String>,
    }

    impl MockWebSearchProvider {
        pub fn new() -> Self {
            Self {
                results: Vec::new(),
                error: None,
            }
        }

        pub fn with_result(mut self, result: WebResult) -> Self {
            self.results.push(result);
            self
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }
    }

    #[async_trait]
    impl WebSearchProvider for MockWebSearchProvider {
        async fn search(&self, _query: &str, count: usize) -> Result<Vec<WebResult>, DomainError> {
            if let Some(ref error) = self.error {
                return Err(DomainError::provider("mock", error));
            }

            Ok(self.results.iter().take(count).cloned().collect())
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }
}
