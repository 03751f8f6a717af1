//! Document entity, search results and the document store trait

use std::collections::BTreeMap;
use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Metadata attached to a document.
///
/// Key-ordered so downstream formatting is deterministic. `title` and
/// `company` are the keys the answer formatter consults; `source` is the
/// conventional provenance key.
pub type DocumentMetadata = BTreeMap<String, serde_json::Value>;

/// A document held by the document store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier; upserting the same id overwrites
    id: String,
    /// Document content text
    content: String,
    /// Key-ordered metadata
    metadata: DocumentMetadata,
    /// Embedding vector, computed lazily on first upsert when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    embedding: Option<Vec<f32>>,
}

impl Document {
    /// Create a new document without an embedding
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: BTreeMap::new(),
            embedding: None,
        }
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Set all metadata
    pub fn with_all_metadata(mut self, metadata: DocumentMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Set the embedding vector
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Get the document ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the content text
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Get the metadata
    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    /// Get the embedding, if computed
    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    /// Display title: `title` metadata, falling back to `company`, then "Unknown"
    pub fn display_title(&self) -> &str {
        self.metadata
            .get("title")
            .or_else(|| self.metadata.get("company"))
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown")
    }

    /// Content truncated for display
    pub fn content_preview(&self, max_chars: usize) -> String {
        if self.content.chars().count() <= max_chars {
            return self.content.clone();
        }

        let preview: String = self.content.chars().take(max_chars).collect();
        format!("{}...", preview)
    }
}

/// A scored document produced by a similarity search; not persisted
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matching document
    pub document: Document,
    /// Similarity score, 1 - cosine distance; usually in [0, 1] but can go
    /// negative for vectors pointing away from the query
    pub score: f32,
}

impl SearchResult {
    /// Create a new search result
    pub fn new(document: Document, score: f32) -> Self {
        Self { document, score }
    }
}

/// Trait for the document store collaborator
///
/// Implementations provide nearest-neighbor similarity search over embedded
/// text plus upsert/list maintenance operations. Upsert semantics are
/// last-write-wins on the document id.
#[async_trait]
pub trait DocumentStore: Send + Sync + Debug {
    /// Upsert documents; every document must carry an embedding
    async fn upsert(&self, documents: Vec<Document>) -> Result<(), DomainError>;

    /// Return up to `k` documents ordered by ascending cosine distance,
    /// paired with that distance
    async fn nearest(&self, embedding: &[f32], k: usize)
        -> Result<Vec<(Document, f32)>, DomainError>;

    /// List documents up to `limit`
    async fn list(&self, limit: usize) -> Result<Vec<Document>, DomainError>;

    /// Delete a document by id; returns whether it existed
    async fn delete(&self, id: &str) -> Result<bool, DomainError>;

    /// Delete all documents
    async fn delete_all(&self) -> Result<(), DomainError>;

    /// Get the total document count
    async fn count(&self) -> Result<usize, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_builder() {
        let doc = Document::new("AAPL_2023_10K_1", "Apple Inc. reported total net sales...")
            .with_metadata("company", serde_json::json!("Apple Inc."))
            .with_metadata("year", serde_json::json!(2023));

        assert_eq!(doc.id(), "AAPL_2023_10K_1");
        assert_eq!(doc.metadata().len(), 2);
        assert!(doc.embedding().is_none());
    }

    #[test]
    fn test_display_title_prefers_title_key() {
        let doc = Document::new("d1", "content")
            .with_metadata("company", serde_json::json!("Apple Inc."))
            .with_metadata("title", serde_json::json!("FY2023 10-K"));

        assert_eq!(doc.display_title(), "FY2023 10-K");
    }

    #[test]
    fn test_display_title_falls_back_to_company() {
        let doc =
            Document::new("d1", "content").with_metadata("company", serde_json::json!("Tesla Inc."));

        assert_eq!(doc.display_title(), "Tesla Inc.");
    }

    #[test]
    fn test_display_title_unknown() {
        let doc = Document::new("d1", "content");

        assert_eq!(doc.display_title(), "Unknown");
    }

    #[test]
    fn test_content_preview_truncates() {
        let doc = Document::new("d1", "a".repeat(300));

        let preview = doc.content_preview(200);

        assert_eq!(preview.chars().count(), 203);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_content_preview_short_content_untouched() {
        let doc = Document::new("d1", "short");

        assert_eq!(doc.content_preview(200), "short");
    }

    #[test]
    fn test_metadata_is_key_ordered() {
        let doc = Document::new("d1", "content")
            .with_metadata("zeta", serde_json::json!(1))
            .with_metadata("alpha", serde_json::json!(2));

        let keys: Vec<&str> = doc.metadata().keys().map(|k| k.as_str()).collect();

        assert_eq!(keys, vec!["alpha", "zeta"]);
    }
}
