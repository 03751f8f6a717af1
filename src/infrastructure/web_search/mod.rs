//! Web search client: result formatting, text cleaning and offline fallback

mod brave;
mod offline;

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

pub use brave::BraveSearchProvider;
pub use offline::OfflineSearchProvider;

use crate::domain::web_search::{WebResult, WebSearchProvider};

/// Default number of results requested per search
const DEFAULT_RESULT_COUNT: usize = 5;

static MULTI_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Spaced-out magnitude words, e.g. "350 b i l l i o n"
static SPACED_MAGNITUDE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)\s+([bmt])\s+i\s+l\s+l\s+i\s+o\s+n").expect("magnitude pattern is valid")
});

/// Decimal percentages broken by whitespace, e.g. "12 . 5 %"
static SPACED_PERCENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*\.\s*(\d+)\s*%").expect("percent pattern is valid"));

/// Missing space after a sentence-ending period between words
static MISSING_SENTENCE_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-zA-Z])\.([a-zA-Z])").expect("sentence pattern is valid"));

/// Repair common OCR/formatting artifacts in scraped result text
pub fn clean_text(text: &str) -> String {
    let text = MULTI_WHITESPACE.replace_all(text, " ");
    let text = SPACED_MAGNITUDE.replace_all(&text, "${1} ${2}illion");
    let text = SPACED_PERCENT.replace_all(&text, "${1}.${2}%");
    let text = MISSING_SENTENCE_SPACE.replace_all(&text, "${1}. ${2}");

    text.trim().to_string()
}

/// Web search client wrapping a live provider with an offline fallback.
///
/// Never returns an error: provider failures degrade to the offline blurb
/// table, and an empty offline match degrades to an explicit no-data message.
#[derive(Debug)]
pub struct WebSearchClient {
    provider: Arc<dyn WebSearchProvider>,
    fallback: OfflineSearchProvider,
}

impl WebSearchClient {
    /// Create a client around a live provider
    pub fn new(provider: Arc<dyn WebSearchProvider>) -> Self {
        Self {
            provider,
            fallback: OfflineSearchProvider::new(),
        }
    }

    /// Search and format results as a human-readable text block
    pub async fn search(&self, query: &str) -> String {
        self.search_with_count(query, DEFAULT_RESULT_COUNT).await
    }

    /// Search with an explicit result count
    pub async fn search_with_count(&self, query: &str, count: usize) -> String {
        match self.provider.search(query, count).await {
            Ok(results) if !results.is_empty() => Self::format_results(&results, query),
            Ok(_) => format!(
                "Web Search Results:\nNo results found for query: '{}'",
                query
            ),
            Err(e) => {
                warn!(
                    provider = self.provider.provider_name(),
                    error = %e,
                    "web search failed, using offline fallback"
                );
                self.offline_search(query).await
            }
        }
    }

    async fn offline_search(&self, query: &str) -> String {
        // The offline provider is infallible
        let results = self.fallback.search(query, 1).await.unwrap_or_default();

        match results.first() {
            Some(result) => format!(
                "Web Search Results (offline fallback):\n{}\n\nSource: offline financial data",
                result.description
            ),
            None => format!(
                "Web Search Results (offline fallback):\nNo recent data available for query: '{}'",
                query
            ),
        }
    }

    fn format_results(results: &[WebResult], _query: &str) -> String {
        let formatted: Vec<String> = results
            .iter()
            .map(|r| {
                format!(
                    "Title: {}\nURL: {}\nDescription: {}",
                    r.title,
                    r.url,
                    clean_text(&r.description)
                )
            })
            .collect();

        format!("Web Search Results:\n\n{}", formatted.join("\n\n"))
    }
}
