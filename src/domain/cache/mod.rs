//! Cache entry types and the cache store trait

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::DomainError;

/// Normalize a query for hashing: lowercase, trimmed, inner whitespace collapsed
pub fn normalize_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Deterministic hash of the normalized query text.
///
/// Identical normalized queries always map to the same hash, which is the
/// cache entry primary key.
pub fn query_hash(query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_query(query).as_bytes());
    hex::encode(hasher.finalize())
}

/// A cached answer keyed by query embedding similarity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Primary key, derived from the normalized query text
    query_hash: String,
    /// The original query text
    query: String,
    /// Embedding of the query, used for similarity lookup
    query_embedding: Vec<f32>,
    /// The cached answer
    response: String,
    /// When this entry was stored
    timestamp: DateTime<Utc>,
    /// Times this entry has been served; starts at 1 on store
    hit_count: u32,
}

impl CacheEntry {
    /// Create a new entry with `hit_count = 1` and the current timestamp
    pub fn new(
        query: impl Into<String>,
        query_embedding: Vec<f32>,
        response: impl Into<String>,
    ) -> Self {
        let query = query.into();

        Self {
            query_hash: query_hash(&query),
            query,
            query_embedding,
            response: response.into(),
            timestamp: Utc::now(),
            hit_count: 1,
        }
    }

    /// Rehydrate an entry from persisted fields
    pub fn from_parts(
        query_hash: impl Into<String>,
        query: impl Into<String>,
        query_embedding: Vec<f32>,
        response: impl Into<String>,
        timestamp: DateTime<Utc>,
        hit_count: u32,
    ) -> Self {
        Self {
            query_hash: query_hash.into(),
            query: query.into(),
            query_embedding,
            response: response.into(),
            timestamp,
            hit_count,
        }
    }

    /// Get the query hash
    pub fn query_hash(&self) -> &str {
        &self.query_hash
    }

    /// Get the original query text
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Get the query embedding
    pub fn query_embedding(&self) -> &[f32] {
        &self.query_embedding
    }

    /// Get the cached response
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Get the storage timestamp
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Get the hit count
    pub fn hit_count(&self) -> u32 {
        self.hit_count
    }

    /// Increment the hit count
    pub fn increment_hits(&mut self) {
        self.hit_count += 1;
    }
}

/// Best similarity match from a cache lookup
#[derive(Debug, Clone)]
pub struct CacheMatch {
    /// The matching entry
    pub entry: CacheEntry,
    /// Cosine similarity between the incoming query and the entry
    pub similarity: f32,
}

impl CacheMatch {
    /// Create a new match
    pub fn new(entry: CacheEntry, similarity: f32) -> Self {
        Self { entry, similarity }
    }
}

/// Aggregate cache statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of stored entries
    pub total_entries: usize,
    /// Sum of `hit_count - 1` over all entries; the first store is not a hit
    pub total_hits: u64,
    /// `total_hits / (total_entries + total_hits)`, 0 when empty
    pub hit_rate: f64,
}

impl CacheStats {
    /// Compute stats from the stored entries
    pub fn from_entries(entries: &[CacheEntry]) -> Self {
        let total_entries = entries.len();
        let total_hits: u64 = entries
            .iter()
            .map(|e| u64::from(e.hit_count().saturating_sub(1)))
            .sum();
        let total_queries = total_entries as u64 + total_hits;

        let hit_rate = if total_queries > 0 {
            total_hits as f64 / total_queries as f64
        } else {
            0.0
        };

        Self {
            total_entries,
            total_hits,
            hit_rate,
        }
    }
}

/// Trait for the cache persistence backend
#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    /// Return the single best entry with similarity at or above `threshold`
    async fn find_similar(
        &self,
        embedding: &[f32],
        threshold: f32,
    ) -> Result<Option<CacheMatch>, DomainError>;

    /// Upsert an entry by query hash; last write wins
    async fn upsert(&self, entry: CacheEntry) -> Result<(), DomainError>;

    /// Increment the hit count of an entry
    async fn increment_hits(&self, query_hash: &str) -> Result<(), DomainError>;

    /// List all entries
    async fn list_all(&self) -> Result<Vec<CacheEntry>, DomainError>;

    /// Delete an entry by query hash; returns whether it existed
    async fn delete(&self, query_hash: &str) -> Result<bool, DomainError>;

    /// Delete all entries in one operation
    async fn delete_all(&self) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query("  Apple   Revenue\t2023 "), "apple revenue 2023");
    }

    #[test]
    fn test_query_hash_is_case_and_whitespace_insensitive() {
        assert_eq!(query_hash("Apple Revenue"), query_hash("  apple   revenue "));
    }

    #[test]
    fn test_query_hash_distinct_queries_differ() {
        assert_ne!(query_hash("apple revenue 2022"), query_hash("apple revenue 2023"));
    }

    #[test]
    fn test_cache_entry_starts_with_one_hit() {
        let entry = CacheEntry::new("apple revenue", vec![0.1, 0.2], "answer");

        assert_eq!(entry.hit_count(), 1);
        assert_eq!(entry.query_hash(), query_hash("apple revenue"));
    }

    #[test]
    fn test_cache_entry_increment() {
        let mut entry = CacheEntry::new("q", vec![0.1], "a");

        entry.increment_hits();
        entry.increment_hits();

        assert_eq!(entry.hit_count(), 3);
    }

    #[test]
    fn test_stats_first_store_is_not_a_hit() {
        let entries = vec![CacheEntry::new("q", vec![0.1], "a")];

        let stats = CacheStats::from_entries(&entries);

        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.total_hits, 0);
        assert_eq!(stats.hit_rate, 0.0);
    }

    #[test]
    fn test_stats_hit_rate() {
        let mut entry = CacheEntry::new("q", vec![0.1], "a");
        entry.increment_hits();
        entry.increment_hits();

        let stats = CacheStats::from_entries(&[entry]);

        assert_eq!(stats.total_hits, 2);
        assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_stats_empty() {
        let stats = CacheStats::from_entries(&[]);

        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.hit_rate, 0.0);
    }
}
