//! Answer generation with a ranked fallback chain
//!
//! Tiers are tried in order until one produces an answer. The final tier is
//! a key-fact extractor over the retrieved context and cannot fail, so the
//! generator as a whole is infallible once context exists.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::domain::document::SearchResult;
use crate::domain::generation::{GenerationParams, GenerationProvider, Message};

/// Answer returned when neither retrieval nor web search produced context
pub const NO_CONTEXT_ANSWER: &str =
    "I don't have enough information in my knowledge base to answer this question. \
     Try adding relevant documents or enabling web search.";

/// Disclaimer appended when every model tier failed and the answer was
/// assembled from extracted key facts
const DEGRADED_NOTE: &str =
    "(Note: this answer was assembled directly from retrieved text because the \
     language model was unavailable; details may be incomplete.)";

/// Terms that mark a sentence as carrying a key financial fact
const KEY_FACT_MARKERS: &[&str] = &[
    "$", "%", "billion", "million", "revenue", "sales", "growth", "increase", "decrease",
];

const MAX_KEY_FACTS: usize = 3;

/// How a generation tier calls the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStyle {
    /// Single-prompt completion
    Respond,
    /// System + user chat messages
    Chat,
}

/// One tier of the fallback chain
#[derive(Debug, Clone)]
pub struct GenerationTier {
    pub model: String,
    pub style: CallStyle,
}

impl GenerationTier {
    pub fn new(model: impl Into<String>, style: CallStyle) -> Self {
        Self {
            model: model.into(),
            style,
        }
    }
}

/// Default tier chain: a completion call to the strongest model, then a chat
/// call to a cheaper one
fn default_tiers() -> Vec<GenerationTier> {
    vec![
        GenerationTier::new("gpt-4.1", CallStyle::Respond),
        GenerationTier::new("gpt-3.5-turbo", CallStyle::Chat),
    ]
}

const SYSTEM_INSTRUCTIONS: &str =
    "You are a financial research assistant. Answer the question using only the \
     provided context. Be concise and cite concrete figures where available. If \
     the context does not contain the answer, say so.";

/// Tiered answer generator
#[derive(Debug)]
pub struct AnswerGenerator {
    provider: Arc<dyn GenerationProvider>,
    tiers: Vec<GenerationTier>,
    params: GenerationParams,
}

impl AnswerGenerator {
    /// Create a generator with the default tier chain and parameters
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        Self {
            provider,
            tiers: default_tiers(),
            params: GenerationParams::default(),
        }
    }

    /// Replace the tier chain
    pub fn with_tiers(mut self, tiers: Vec<GenerationTier>) -> Self {
        self.tiers = tiers;
        self
    }

    /// Replace the sampling parameters
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Generate an answer from retrieved documents and optional web results.
    ///
    /// Never fails: model tiers are tried in order and the key-fact extractor
    /// backstops them all.
    pub async fn generate(
        &self,
        query: &str,
        documents: &[SearchResult],
        web_results: Option<&str>,
    ) -> String {
        let context = build_context(documents, web_results);

        if context.is_empty() {
            return NO_CONTEXT_ANSWER.to_string();
        }

        let prompt = format!(
            "{}\n\nContext:\n{}\n\nQuestion: {}",
            SYSTEM_INSTRUCTIONS, context, query
        );

        for tier in &self.tiers {
            let result = match tier.style {
                CallStyle::Respond => self.provider.respond(&tier.model, &prompt, self.params).await,
                CallStyle::Chat => {
                    let messages = vec![
                        Message::system(SYSTEM_INSTRUCTIONS),
                        Message::user(format!("Context:\n{}\n\nQuestion: {}", context, query)),
                    ];
                    self.provider.chat(&tier.model, messages, self.params).await
                }
            };

            match result {
                Ok(answer) if !answer.trim().is_empty() => return answer,
                Ok(_) => {
                    warn!(model = %tier.model, "generation tier returned empty answer, trying next");
                }
                Err(e) => {
                    warn!(model = %tier.model, error = %e, "generation tier failed, trying next");
                }
            }
        }

        warn!("all generation tiers failed, extracting key facts from context");
        extract_key_facts(&context)
    }
}

/// Assemble the context block handed to the model: one line per retrieved
/// document, then the web results block when present
pub fn build_context(documents: &[SearchResult], web_results: Option<&str>) -> String {
    let mut parts: Vec<String> = documents
        .iter()
        .map(|r| format!("Document ({}): {}", r.document.display_title(), r.document.content()))
        .collect();

    if let Some(web) = web_results {
        if !web.trim().is_empty() {
            parts.push(format!("Web Information: {}", web));
        }
    }

    parts.join("\n\n")
}

/// Sentence boundaries: a period followed by whitespace, or line breaks.
/// A bare '.' split would tear apart figures like "$383.3 billion".
static SENTENCE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.\s+|\n+").expect("sentence break pattern is valid"));

/// Last-resort answer: pull up to three sentences carrying financial figures
/// out of the context
fn extract_key_facts(context: &str) -> String {
    let facts: Vec<&str> = SENTENCE_BREAK
        .split(context)
        .map(|s| s.trim().trim_end_matches('.'))
        .filter(|s| !s.is_empty())
        .filter(|s| {
            let lower = s.to_lowercase();
            KEY_FACT_MARKERS.iter().any(|m| lower.contains(m))
        })
        .take(MAX_KEY_FACTS)
        .collect();

    if facts.is_empty() {
        return format!(
            "I found related information but could not extract a specific answer. {}",
            DEGRADED_NOTE
        );
    }

    format!("Based on available information: {}. {}", facts.join(". "), DEGRADED_NOTE)
}
