//! Document retrieval service: embedding-backed ingestion and search

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::document::{Document, DocumentMetadata, DocumentStore, SearchResult};
use crate::domain::embedding::{EmbeddingProvider, EmbeddingRequest};
use crate::domain::DomainError;

/// Default number of documents returned per search
pub const DEFAULT_TOP_K: usize = 5;

/// Retrieval service over a [`DocumentStore`] backend.
///
/// Documents ingested without an embedding get one computed here before the
/// upsert; searches embed the query and rank by cosine similarity.
#[derive(Debug)]
pub struct Retriever {
    store: Arc<dyn DocumentStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    /// Create a new retriever
    pub fn new(store: Arc<dyn DocumentStore>, embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, embeddings }
    }

    /// Search for the `top_k` documents most similar to `query`.
    ///
    /// Scores are `1 - cosine distance`, descending.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>, DomainError> {
        let request = EmbeddingRequest::single(self.embeddings.default_model(), query);
        let response = self.embeddings.embed(request).await?;

        let embedding = response.into_embeddings().into_iter().next().ok_or_else(|| {
            DomainError::provider(
                self.embeddings.provider_name(),
                "embedding response contained no vectors",
            )
        })?;

        let neighbors = self.store.nearest(embedding.vector(), top_k).await?;

        let results: Vec<SearchResult> = neighbors
            .into_iter()
            .map(|(document, distance)| SearchResult::new(document, 1.0 - distance))
            .collect();

        debug!(query, count = results.len(), "retrieved documents");

        Ok(results)
    }

    /// Ingest documents, computing embeddings for any that lack one.
    /// Returns the number of documents stored.
    pub async fn add_documents(&self, documents: Vec<Document>) -> Result<usize, DomainError> {
        if documents.is_empty() {
            return Ok(0);
        }

        let mut embedded = Vec::with_capacity(documents.len());
        let missing: Vec<String> = documents
            .iter()
            .filter(|d| d.embedding().is_none())
            .map(|d| d.content().to_string())
            .collect();

        let mut computed = if missing.is_empty() {
            Vec::new()
        } else {
            let request = EmbeddingRequest::batch(self.embeddings.default_model(), missing);
            let response = self.embeddings.embed(request).await?;
            response.into_embeddings()
        }
        .into_iter();

        for document in documents {
            if document.embedding().is_some() {
                embedded.push(document);
                continue;
            }

            let embedding = computed.next().ok_or_else(|| {
                DomainError::provider(
                    self.embeddings.provider_name(),
                    "embedding response shorter than batch input",
                )
            })?;
            embedded.push(document.with_embedding(embedding.into_vector()));
        }

        let count = embedded.len();
        self.store.upsert(embedded).await?;

        info!(count, "documents ingested");

        Ok(count)
    }

    /// Ingest a single free-form text with generated id `doc_<10 hex chars>`.
    /// Returns the assigned id.
    pub async fn upload_text(
        &self,
        content: impl Into<String>,
        metadata: DocumentMetadata,
    ) -> Result<String, DomainError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(DomainError::validation("document content is empty"));
        }

        let suffix: String = Uuid::new_v4().simple().to_string().chars().take(10).collect();
        let id = format!("doc_{}", suffix);

        let document = Document::new(id.clone(), content).with_all_metadata(metadata);
        self.add_documents(vec![document]).await?;

        Ok(id)
    }

    /// List stored documents up to `limit`
    pub async fn list(&self, limit: usize) -> Result<Vec<Document>, DomainError> {
        self.store.list(limit).await
    }

    /// Get the stored document count
    pub async fn count(&self) -> Result<usize, DomainError> {
        self.store.count().await
    }

    /// Ingest the bundled sample corpus of 10-K excerpts when the store is
    /// empty. Returns the number of documents added (0 when already seeded).
    pub async fn seed_sample_data(&self) -> Result<usize, DomainError> {
        if self.store.count().await? > 0 {
            debug!("document store already populated, skipping sample data");
            return Ok(0);
        }

        self.add_documents(sample_filings()).await
    }
}

/// Bundled excerpts from FY2023/FY2024 annual reports, used to seed an empty
/// store so queries work out of the box
pub fn sample_filings() -> Vec<Document> {
    vec![
        Document::new(
            "AAPL_2023_10K",
            "Apple Inc. reported total net sales of $383.3 billion for fiscal year 2023, \
             a decrease of 3% from the prior year. iPhone net sales were $200.6 billion, \
             while Services revenue grew to a record $85.2 billion. Gross margin was 44.1% \
             and the company returned over $99 billion to shareholders through dividends \
             and share repurchases.",
        )
        .with_metadata("company", json!("Apple Inc."))
        .with_metadata("ticker", json!("AAPL"))
        .with_metadata("title", json!("Apple FY2023 10-K"))
        .with_metadata("year", json!(2023))
        .with_metadata("source", json!("10-K")),
        Document::new(
            "MSFT_2023_10K",
            "Microsoft Corporation reported revenue of $211.9 billion for fiscal year 2023, \
             an increase of 7% year over year. Intelligent Cloud revenue was $87.9 billion, \
             driven by Azure and other cloud services growth of 29%. Operating income was \
             $88.5 billion and net income was $72.4 billion.",
        )
        .with_metadata("company", json!("Microsoft Corporation"))
        .with_metadata("ticker", json!("MSFT"))
        .with_metadata("title", json!("Microsoft FY2023 10-K"))
        .with_metadata("year", json!(2023))
        .with_metadata("source", json!("10-K")),
        Document::new(
            "GOOGL_2023_10K",
            "Alphabet Inc. reported revenues of $307.4 billion for the year ended December 31, \
             2023, an increase of 9%. Google Search remained the largest contributor, while \
             Google Cloud revenue grew 26% to $33.1 billion and reached operating \
             profitability for the first full year. Net income was $73.8 billion.",
        )
        .with_metadata("company", json!("Alphabet Inc."))
        .with_metadata("ticker", json!("GOOGL"))
        .with_metadata("title", json!("Alphabet FY2023 10-K"))
        .with_metadata("year", json!(2023))
        .with_metadata("source", json!("10-K")),
        Document::new(
            "TSLA_2023_10K",
            "Tesla, Inc. reported total revenues of $96.8 billion for 2023, up 19% from the \
             prior year. The company delivered approximately 1.81 million vehicles during the \
             year. Automotive gross margin declined to 18.2% amid price reductions, while \
             energy generation and storage revenue grew 54% to $6.0 billion.",
        )
        .with_metadata("company", json!("Tesla, Inc."))
        .with_metadata("ticker", json!("TSLA"))
        .with_metadata("title", json!("Tesla FY2023 10-K"))
        .with_metadata("year", json!(2023))
        .with_metadata("source", json!("10-K")),
        Document::new(
            "NVDA_2024_10K",
            "NVIDIA Corporation reported revenue of $60.9 billion for fiscal year 2024, up \
             126% from a year ago. Data Center revenue was a record $47.5 billion, driven by \
             demand for generative AI training and inference. Gross margin expanded to 72.7% \
             and net income was $29.8 billion.",
        )
        .with_metadata("company", json!("NVIDIA Corporation"))
        .with_metadata("ticker", json!("NVDA"))
        .with_metadata("title", json!("NVIDIA FY2024 10-K"))
        .with_metadata("year", json!(2024))
        .with_metadata("source", json!("10-K")),
    ]
}
