//! In-memory cache store using linear cosine scan

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::cache::{CacheEntry, CacheMatch, CacheStore};
use crate::domain::embedding::cosine_similarity;
use crate::domain::DomainError;

#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// When set, bulk deletion reports failure so callers exercise the
    /// per-entry fallback path
    reject_bulk_delete: bool,
    /// Per-entry deletes of this hash report failure, for testing partial
    /// fallback outcomes
    failing_delete_hash: Option<String>,
}

impl InMemoryCacheStore {
    /// Create a new empty cache store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose `delete_all` is rejected, for testing the
    /// per-entry deletion fallback
    #[cfg(test)]
    pub fn rejecting_bulk_delete() -> Self {
        Self {
            reject_bulk_delete: true,
            ..Self::default()
        }
    }

    /// Additionally fail per-entry deletes of the entry for `query`, for
    /// testing partial fallback outcomes
    #[cfg(test)]
    pub fn with_failing_delete_of(mut self, query: &str) -> Self {
        self.failing_delete_hash = Some(crate::domain::cache::query_hash(query));
        self
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn find_similar(
        &self,
        embedding: &[f32],
        threshold: f32,
    ) -> Result<Option<CacheMatch>, DomainError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| DomainError::cache(format!("Failed to acquire read lock: {}", e)))?;

        let best = entries
            .values()
            .map(|entry| {
                let similarity = cosine_similarity(embedding, entry.query_embedding());
                CacheMatch::new(entry.clone(), similarity)
            })
            .filter(|m| m.similarity >= threshold)
            .max_by(|a, b| {
                a.similarity
                    .partial_cmp(&b.similarity)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

        Ok(best)
    }

    async fn upsert(&self, entry: CacheEntry) -> Result<(), DomainError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| DomainError::cache(format!("Failed to acquire write lock: {}", e)))?;

        entries.insert(entry.query_hash().to_string(), entry);

        Ok(())
    }

    async fn increment_hits(&self, query_hash: &str) -> Result<(), DomainError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| DomainError::cache(format!("Failed to acquire write lock: {}", e)))?;

        let entry = entries
            .get_mut(query_hash)
            .ok_or_else(|| DomainError::not_found(format!("cache entry '{}'", query_hash)))?;

        entry.increment_hits();

        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<CacheEntry>, DomainError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| DomainError::cache(format!("Failed to acquire read lock: {}", e)))?;

        Ok(entries.values().cloned().collect())
    }

    async fn delete(&self, query_hash: &str) -> Result<bool, DomainError> {
        if self.failing_delete_hash.as_deref() == Some(query_hash) {
            return Err(DomainError::cache(format!(
                "delete of '{}' not permitted",
                query_hash
            )));
        }

        let mut entries = self
            .entries
            .write()
            .map_err(|e| DomainError::cache(format!("Failed to acquire write lock: {}", e)))?;

        Ok(entries.remove(query_hash).is_some())
    }

    async fn delete_all(&self) -> Result<(), DomainError> {
        if self.reject_bulk_delete {
            return Err(DomainError::cache("bulk delete not permitted"));
        }

        let mut entries = self
            .entries
            .write()
            .map_err(|e| DomainError::cache(format!("Failed to acquire write lock: {}", e)))?;

        entries.clear();

        Ok(())
    }
}
