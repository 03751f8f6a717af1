//! Query orchestrator: cache, routing, retrieval, web search, generation

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::document::{DocumentMetadata, SearchResult};
use crate::domain::routing::{QueryRouter, RouteDecision};
use crate::domain::temporal::extract_years;
use crate::domain::DomainError;
use crate::infrastructure::services::{AnswerGenerator, Retriever, SemanticCacheService};
use crate::infrastructure::services::retriever::DEFAULT_TOP_K;
use crate::infrastructure::web_search::WebSearchClient;

/// Retrieved documents scoring above this are considered relevant enough to
/// answer without web augmentation
pub const RELEVANCE_THRESHOLD: f32 = 0.7;

/// A source document surfaced in the outcome envelope
#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub title: String,
    pub preview: String,
    pub metadata: DocumentMetadata,
    pub score: f32,
}

impl SourceSummary {
    fn from_result(result: &SearchResult) -> Self {
        Self {
            title: result.document.display_title().to_string(),
            preview: result.document.content_preview(200),
            metadata: result.document.metadata().clone(),
            score: result.score,
        }
    }
}

/// Everything a caller learns about how a query was answered
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    /// The answer text
    pub answer: String,
    /// Source documents behind the answer
    pub sources: Vec<SourceSummary>,
    /// Whether the answer came from the semantic cache
    pub cache_hit: bool,
    /// End-to-end latency in seconds
    pub response_time_seconds: f64,
    /// Routing decision; absent on a cache hit, where routing never ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_decision: Option<RouteDecision>,
    /// Whether web search contributed to the answer
    pub web_search_used: bool,
    /// Formatted web results, when web search ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_results: Option<String>,
}

/// The query pipeline: semantic cache in front of routed retrieval,
/// conditional web search and tiered answer generation.
#[derive(Debug)]
pub struct SearchService {
    cache: Arc<SemanticCacheService>,
    retriever: Arc<Retriever>,
    router: QueryRouter,
    web: Arc<WebSearchClient>,
    answerer: AnswerGenerator,
    top_k: usize,
}

impl SearchService {
    /// Assemble the pipeline
    pub fn new(
        cache: Arc<SemanticCacheService>,
        retriever: Arc<Retriever>,
        router: QueryRouter,
        web: Arc<WebSearchClient>,
        answerer: AnswerGenerator,
    ) -> Self {
        Self {
            cache,
            retriever,
            router,
            web,
            answerer,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Override the number of documents retrieved per query
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Answer a query.
    ///
    /// A cache hit is terminal: routing, retrieval and generation are all
    /// skipped. Cache failures are logged and treated as misses so a broken
    /// cache backend degrades latency, not availability.
    pub async fn query(&self, query: &str, allow_web: bool) -> Result<SearchOutcome, DomainError> {
        let started = Instant::now();

        match self.cache.lookup(query).await {
            Ok(Some(hit)) => {
                info!(query, similarity = hit.similarity, "answered from cache");
                return Ok(SearchOutcome {
                    answer: hit.entry.response().to_string(),
                    sources: Vec::new(),
                    cache_hit: true,
                    response_time_seconds: started.elapsed().as_secs_f64(),
                    routing_decision: None,
                    web_search_used: false,
                    web_results: None,
                });
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "cache lookup failed, continuing without cache");
            }
        }

        let decision = self.router.route(query);
        let results = self.retriever.search(query, self.top_k).await?;

        let has_relevant_docs = results.iter().any(|r| r.score > RELEVANCE_THRESHOLD);
        let mentions_recent_year = self.mentions_recent_year(query);

        let wants_web = decision == RouteDecision::WebSearch
            || (!has_relevant_docs && mentions_recent_year);
        let web_search_used = allow_web && wants_web;

        let web_results = if web_search_used {
            Some(self.web.search(query).await)
        } else {
            None
        };

        info!(
            query,
            decision = decision.as_str(),
            has_relevant_docs,
            mentions_recent_year,
            web_search_used,
            "processing query"
        );

        let answer = self
            .answerer
            .generate(query, &results, web_results.as_deref())
            .await;

        if let Err(e) = self.cache.store_answer(query, &answer).await {
            warn!(error = %e, "failed to cache answer");
        }

        Ok(SearchOutcome {
            answer,
            sources: results.iter().map(SourceSummary::from_result).collect(),
            cache_hit: false,
            response_time_seconds: started.elapsed().as_secs_f64(),
            routing_decision: Some(decision),
            web_search_used,
            web_results,
        })
    }

    /// Whether the query mentions the reference year or the one before it
    fn mentions_recent_year(&self, query: &str) -> bool {
        let cutoff = self.router.reference_year() - 1;

        extract_years(query).iter().any(|y| i32::from(*y) >= cutoff)
    }
}
