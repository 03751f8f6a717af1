//! In-memory document store using linear cosine scan
//!
//! Suitable for tests and offline runs over the small sample corpus. For
//! persistent deployments use `PgDocumentStore`.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::document::{Document, DocumentStore};
use crate::domain::embedding::cosine_similarity;
use crate::domain::DomainError;

#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<String, Document>>,
}

impl InMemoryDocumentStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn upsert(&self, documents: Vec<Document>) -> Result<(), DomainError> {
        for doc in &documents {
            if doc.embedding().is_none() {
                return Err(DomainError::validation(format!(
                    "document '{}' has no embedding",
                    doc.id()
                )));
            }
        }

        let mut store = self
            .documents
            .write()
            .map_err(|e| DomainError::internal(format!("Failed to acquire write lock: {}", e)))?;

        for doc in documents {
            store.insert(doc.id().to_string(), doc);
        }

        Ok(())
    }

    async fn nearest(
        &self,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<(Document, f32)>, DomainError> {
        let store = self
            .documents
            .read()
            .map_err(|e| DomainError::internal(format!("Failed to acquire read lock: {}", e)))?;

        let mut scored: Vec<(Document, f32)> = store
            .values()
            .filter_map(|doc| {
                doc.embedding()
                    .map(|emb| (doc.clone(), 1.0 - cosine_similarity(embedding, emb)))
            })
            .collect();

        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored)
    }

    async fn list(&self, limit: usize) -> Result<Vec<Document>, DomainError> {
        let store = self
            .documents
            .read()
            .map_err(|e| DomainError::internal(format!("Failed to acquire read lock: {}", e)))?;

        let mut docs: Vec<Document> = store.values().cloned().collect();
        docs.sort_by(|a, b| a.id().cmp(b.id()));
        docs.truncate(limit);

        Ok(docs)
    }

    async fn delete(&self, id: &str) -> Result<bool, DomainError> {
        let mut store = self
            .documents
            .write()
            .map_err(|e| DomainError::internal(format!("Failed to acquire write lock: {}", e)))?;

        Ok(store.remove(id).is_some())
    }

    async fn delete_all(&self) -> Result<(), DomainError> {
        let mut store = self
            .documents
            .write()
            .map_err(|e| DomainError::internal(format!("Failed to acquire write lock: {}", e)))?;

        store.clear();

        Ok(())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let store = self
            .documents
            .read()
            .map_err(|e| DomainError::internal(format!("Failed to acquire read lock: {}", e)))?;

        Ok(store.len())
    }
}
