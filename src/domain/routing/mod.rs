//! Agentic query router
//!
//! Scores a query against fixed keyword sets plus temporal signals to decide
//! between answering from indexed documents and supplementing with live web
//! search. Stateless and deterministic: no learning, no external calls.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Financial/report terms that point at the local corpus
const LOCAL_KEYWORDS: &[&str] = &[
    "company",
    "revenue",
    "profit",
    "earnings",
    "financial",
    "balance sheet",
    "income statement",
    "cash flow",
    "assets",
    "liabilities",
    "equity",
    "sec filing",
    "10-k",
    "annual report",
    "quarterly",
    "fiscal year",
];

/// Recency/news terms that point at the web
const WEB_KEYWORDS: &[&str] = &[
    "latest",
    "recent",
    "current",
    "today",
    "news",
    "market cap",
    "stock price",
    "breaking",
    "announcement",
    "update",
];

/// Terms that earn a flat explicit-recency bonus
const EXPLICIT_RECENCY_TERMS: &[&str] = &["latest", "current", "today", "recent"];

/// Search strategy chosen for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteDecision {
    /// Answer from the indexed document corpus
    LocalSearch,
    /// Supplement with live web search
    WebSearch,
}

impl RouteDecision {
    /// Wire/display name of the decision
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteDecision::LocalSearch => "local_search",
            RouteDecision::WebSearch => "web_search",
        }
    }
}

/// Heuristic keyword-scoring router
#[derive(Debug, Clone)]
pub struct QueryRouter {
    /// Calendar year the recency bonus is measured against
    reference_year: i32,
}

impl QueryRouter {
    /// Create a router anchored to the current calendar year
    pub fn new() -> Self {
        Self::with_reference_year(Utc::now().year())
    }

    /// Create a router with a fixed reference year (for deterministic tests)
    pub fn with_reference_year(reference_year: i32) -> Self {
        Self { reference_year }
    }

    /// Get the reference year the recency bonus is measured against
    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    /// Score the query and pick a strategy. Ties favor local search.
    pub fn route(&self, query: &str) -> RouteDecision {
        let query_lower = query.to_lowercase();

        let local_score: u32 = LOCAL_KEYWORDS
            .iter()
            .filter(|keyword| query_lower.contains(*keyword))
            .count() as u32;
        let mut web_score: u32 = WEB_KEYWORDS
            .iter()
            .filter(|keyword| query_lower.contains(*keyword))
            .count() as u32;

        let recency_bonus = EXPLICIT_RECENCY_TERMS
            .iter()
            .any(|term| query_lower.contains(term));
        if recency_bonus {
            web_score += 2;
        }

        let year_bonus = query_lower.contains(&self.reference_year.to_string())
            || query_lower.contains(&(self.reference_year + 1).to_string());
        if year_bonus {
            web_score += 3;
        }

        let decision = if web_score > local_score {
            RouteDecision::WebSearch
        } else {
            RouteDecision::LocalSearch
        };

        debug!(
            decision = decision.as_str(),
            web_score,
            local_score,
            recency_bonus,
            year_bonus,
            "routed query"
        );

        decision
    }
}

impl Default for QueryRouter {
    fn default() -> Self {
        Self::new()
    }
}
