//! Semantic cache service: similarity lookup with a temporal guard

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::cache::{CacheEntry, CacheMatch, CacheStats, CacheStore};
use crate::domain::embedding::{EmbeddingProvider, EmbeddingRequest};
use crate::domain::temporal::years_compatible;
use crate::domain::DomainError;

/// Default similarity threshold for serving a cached answer.
///
/// Deliberately strict: near-paraphrases of the same question should hit,
/// questions about different facts should not.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.98;

/// Semantic cache over a [`CacheStore`] backend.
///
/// Lookups embed the incoming query, take the single most similar stored
/// entry at or above the threshold, then apply the temporal guard: a match
/// whose query mentions a different set of years than the incoming query is
/// rejected even though its embedding passed.
#[derive(Debug)]
pub struct SemanticCacheService {
    store: Arc<dyn CacheStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    /// Similarity threshold, stored as f32 bits so it can be tuned at runtime
    threshold_bits: AtomicU32,
}

impl SemanticCacheService {
    /// Create a service with the default threshold
    pub fn new(store: Arc<dyn CacheStore>, embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_threshold(store, embeddings, DEFAULT_SIMILARITY_THRESHOLD)
    }

    /// Create a service with an explicit threshold
    pub fn with_threshold(
        store: Arc<dyn CacheStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        threshold: f32,
    ) -> Self {
        Self {
            store,
            embeddings,
            threshold_bits: AtomicU32::new(threshold.to_bits()),
        }
    }

    /// Get the current similarity threshold
    pub fn threshold(&self) -> f32 {
        f32::from_bits(self.threshold_bits.load(Ordering::Relaxed))
    }

    /// Set the similarity threshold; takes effect for subsequent lookups
    pub fn set_threshold(&self, threshold: f32) {
        self.threshold_bits
            .store(threshold.to_bits(), Ordering::Relaxed);
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, DomainError> {
        let request = EmbeddingRequest::single(self.embeddings.default_model(), query);
        let response = self.embeddings.embed(request).await?;

        response
            .into_embeddings()
            .into_iter()
            .next()
            .map(|e| e.into_vector())
            .ok_or_else(|| {
                DomainError::provider(
                    self.embeddings.provider_name(),
                    "embedding response contained no vectors",
                )
            })
    }

    /// Look up a cached answer for `query`.
    ///
    /// On a hit the entry's hit count is incremented; a failed increment is
    /// logged and does not turn the hit into a miss.
    pub async fn lookup(&self, query: &str) -> Result<Option<CacheMatch>, DomainError> {
        let embedding = self.embed_query(query).await?;

        let Some(found) = self.store.find_similar(&embedding, self.threshold()).await? else {
            return Ok(None);
        };

        if !years_compatible(query, found.entry.query()) {
            debug!(
                query,
                cached_query = found.entry.query(),
                similarity = found.similarity,
                "cache match rejected by temporal guard"
            );
            return Ok(None);
        }

        debug!(
            query,
            cached_query = found.entry.query(),
            similarity = found.similarity,
            "cache hit"
        );

        if let Err(e) = self.store.increment_hits(found.entry.query_hash()).await {
            warn!(error = %e, "failed to increment cache hit count");
        }

        Ok(Some(found))
    }

    /// Store an answer for `query`, overwriting any entry for the same
    /// normalized query text
    pub async fn store_answer(&self, query: &str, response: &str) -> Result<(), DomainError> {
        let embedding = self.embed_query(query).await?;

        self.store
            .upsert(CacheEntry::new(query, embedding, response))
            .await
    }

    /// Compute aggregate statistics over the stored entries
    pub async fn stats(&self) -> Result<CacheStats, DomainError> {
        let entries = self.store.list_all().await?;

        Ok(CacheStats::from_entries(&entries))
    }

    /// Clear the cache. Tries a bulk delete first; when the backend rejects
    /// it, falls back to deleting entries one by one. Returns `true` when a
    /// deletion path fully or partially succeeded; `false` only when the
    /// fallback had entries to remove and removed none of them.
    pub async fn clear(&self) -> Result<bool, DomainError> {
        match self.store.delete_all().await {
            Ok(()) => return Ok(true),
            Err(e) => {
                warn!(error = %e, "bulk cache delete failed, deleting per entry");
            }
        }

        let entries = self.store.list_all().await?;
        let total = entries.len();
        let mut removed = 0usize;

        for entry in entries {
            match self.store.delete(entry.query_hash()).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        query_hash = entry.query_hash(),
                        error = %e,
                        "failed to delete cache entry"
                    );
                }
            }
        }

        if removed < total {
            warn!(removed, total, "cache only partially cleared");
        }

        Ok(total == 0 || removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::infrastructure::cache::InMemoryCacheStore;

    fn service_with(provider: MockEmbeddingProvider) -> SemanticCacheService {
        SemanticCacheService::new(Arc::new(InMemoryCacheStore::new()), Arc::new(provider))
    }

    #[tokio::test]
    async fn test_store_then_lookup_same_query_hits() {
        let service = service_with(MockEmbeddingProvider::new("mock", 8));

        service
            .store_answer("What was Apple's revenue?", "Apple reported $383.3 billion.")
            .await
            .unwrap();

        let hit = service.lookup("What was Apple's revenue?").await.unwrap().unwrap();

        assert_eq!(hit.entry.response(), "Apple reported $383.3 billion.");
        assert!(hit.similarity > 0.99);
    }

    #[tokio::test]
    async fn test_dissimilar_query_misses() {
        let provider = MockEmbeddingProvider::new("mock", 3)
            .with_vector("apple revenue", vec![1.0, 0.0, 0.0])
            .with_vector("tesla deliveries", vec![0.0, 1.0, 0.0]);
        let service = service_with(provider);

        service.store_answer("apple revenue", "answer").await.unwrap();

        assert!(service.lookup("tesla deliveries").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_temporal_guard_rejects_different_year() {
        // Force near-identical embeddings for queries about different years
        let provider = MockEmbeddingProvider::new("mock", 3)
            .with_vector("Apple revenue 2022", vec![1.0, 0.0, 0.0])
            .with_vector("Apple revenue 2023", vec![1.0, 0.0, 0.0]);
        let service = service_with(provider);

        service
            .store_answer("Apple revenue 2022", "In 2022 Apple reported $394.3 billion.")
            .await
            .unwrap();

        assert!(service.lookup("Apple revenue 2023").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_temporal_guard_rejects_year_on_one_side() {
        let provider = MockEmbeddingProvider::new("mock", 3)
            .with_vector("Apple revenue", vec![1.0, 0.0, 0.0])
            .with_vector("Apple revenue 2023", vec![1.0, 0.0, 0.0]);
        let service = service_with(provider);

        service.store_answer("Apple revenue", "answer").await.unwrap();

        assert!(service.lookup("Apple revenue 2023").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_same_year_still_hits() {
        let provider = MockEmbeddingProvider::new("mock", 3)
            .with_vector("Apple revenue in 2023", vec![1.0, 0.0, 0.0])
            .with_vector("Apple sales in 2023", vec![1.0, 0.0, 0.0]);
        let service = service_with(provider);

        service
            .store_answer("Apple revenue in 2023", "answer")
            .await
            .unwrap();

        assert!(service.lookup("Apple sales in 2023").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_hits_increment_and_show_in_stats() {
        let service = service_with(MockEmbeddingProvider::new("mock", 8));

        service.store_answer("apple revenue", "answer").await.unwrap();
        service.lookup("apple revenue").await.unwrap();
        service.lookup("apple revenue").await.unwrap();

        let stats = service.stats().await.unwrap();

        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.total_hits, 2);
        assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_restore_overwrites_and_resets_hit_count() {
        let service = service_with(MockEmbeddingProvider::new("mock", 8));

        service.store_answer("apple revenue", "old").await.unwrap();
        service.lookup("apple revenue").await.unwrap();
        service.store_answer("apple revenue", "new").await.unwrap();

        let stats = service.stats().await.unwrap();
        let hit = service.lookup("apple revenue").await.unwrap().unwrap();

        assert_eq!(hit.entry.response(), "new");
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.total_hits, 0);
    }

    #[tokio::test]
    async fn test_clear_bulk() {
        let service = service_with(MockEmbeddingProvider::new("mock", 8));
        service.store_answer("q1", "a1").await.unwrap();
        service.store_answer("q2", "a2").await.unwrap();

        assert!(service.clear().await.unwrap());
        assert_eq!(service.stats().await.unwrap().total_entries, 0);
    }

    #[tokio::test]
    async fn test_clear_falls_back_to_per_entry_deletes() {
        let service = SemanticCacheService::new(
            Arc::new(InMemoryCacheStore::rejecting_bulk_delete()),
            Arc::new(MockEmbeddingProvider::new("mock", 8)),
        );
        service.store_answer("q1", "a1").await.unwrap();
        service.store_answer("q2", "a2").await.unwrap();

        assert!(service.clear().await.unwrap());
        assert_eq!(service.stats().await.unwrap().total_entries, 0);
    }

    #[tokio::test]
    async fn test_clear_partial_fallback_reports_success() {
        // Bulk delete is rejected and one of the two per-entry deletes
        // fails; removing anything at all still counts as a cleared cache
        let service = SemanticCacheService::new(
            Arc::new(
                InMemoryCacheStore::rejecting_bulk_delete().with_failing_delete_of("q1"),
            ),
            Arc::new(MockEmbeddingProvider::new("mock", 8)),
        );
        service.store_answer("q1", "a1").await.unwrap();
        service.store_answer("q2", "a2").await.unwrap();

        assert!(service.clear().await.unwrap());
        assert_eq!(service.stats().await.unwrap().total_entries, 1);
    }

    #[tokio::test]
    async fn test_clear_fallback_removing_nothing_reports_failure() {
        let service = SemanticCacheService::new(
            Arc::new(
                InMemoryCacheStore::rejecting_bulk_delete().with_failing_delete_of("q1"),
            ),
            Arc::new(MockEmbeddingProvider::new("mock", 8)),
        );
        service.store_answer("q1", "a1").await.unwrap();

        assert!(!service.clear().await.unwrap());
        assert_eq!(service.stats().await.unwrap().total_entries, 1);
    }

    #[tokio::test]
    async fn test_clear_empty_cache_via_fallback_reports_success() {
        let service = SemanticCacheService::new(
            Arc::new(InMemoryCacheStore::rejecting_bulk_delete()),
            Arc::new(MockEmbeddingProvider::new("mock", 8)),
        );

        assert!(service.clear().await.unwrap());
    }

    #[tokio::test]
    async fn test_threshold_is_tunable() {
        let provider = MockEmbeddingProvider::new("mock", 3)
            .with_vector("apple revenue", vec![1.0, 0.25, 0.0])
            .with_vector("apple total revenue", vec![1.0, 0.0, 0.0]);
        let service = service_with(provider);
        service.store_answer("apple revenue", "answer").await.unwrap();

        assert!(service.lookup("apple total revenue").await.unwrap().is_none());

        service.set_threshold(0.9);

        assert!(service.lookup("apple total revenue").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_embedding_error_propagates() {
        let service = service_with(MockEmbeddingProvider::new("mock", 8).with_error("down"));

        assert!(service.lookup("apple revenue").await.is_err());
    }
}
