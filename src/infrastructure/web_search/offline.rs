//! Offline web search provider
//!
//! Fixed per-company financial blurbs standing in for a live provider.
//! Serves as the degraded path when the real provider errors, and as the
//! no-network seam for tests.

use async_trait::async_trait;

use crate::domain::web_search::{WebResult, WebSearchProvider};
use crate::domain::DomainError;

/// Company blurbs matched by substring against the lowercased query
const OFFLINE_RESULTS: &[(&str, &str)] = &[
    (
        "nvidia",
        "NVIDIA Corporation reported record quarterly revenue of $60.9 billion for Q3 2024, up 206% year-over-year, driven by Data Center revenue of $51.0 billion.",
    ),
    (
        "tesla",
        "Tesla's Q3 2024 earnings showed revenue of $25.2 billion, with vehicle deliveries reaching 462,890 units.",
    ),
    (
        "apple",
        "Apple reported Q4 2024 revenue of $94.9 billion, with iPhone revenue of $46.2 billion.",
    ),
    (
        "microsoft",
        "Microsoft's Q1 2024 revenue reached $56.5 billion, with Azure and cloud services growing 33%.",
    ),
];

/// Offline provider backed by the fixed blurb table
#[derive(Debug, Default)]
pub struct OfflineSearchProvider;

impl OfflineSearchProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl WebSearchProvider for OfflineSearchProvider {
    async fn search(&self, query: &str, _count: usize) -> Result<Vec<WebResult>, DomainError> {
        let query_lower = query.to_lowercase();

        let results = OFFLINE_RESULTS
            .iter()
            .filter(|(company, _)| query_lower.contains(company))
            .map(|(company, blurb)| {
                WebResult::new(
                    format!("{} financial summary", company),
                    "offline://mock-financial-data",
                    *blurb,
                )
            })
            .collect();

        Ok(results)
    }

    fn provider_name(&self) -> &'static str {
        "offline"
    }
}
