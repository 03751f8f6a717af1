//! Application services: cache, retrieval, answer generation and the query
//! pipeline that ties them together

pub mod answer;
pub mod retriever;
pub mod search;
pub mod semantic_cache;

pub use answer::{AnswerGenerator, CallStyle, GenerationTier};
pub use retriever::Retriever;
pub use search::{SearchOutcome, SearchService, SourceSummary};
pub use semantic_cache::SemanticCacheService;
