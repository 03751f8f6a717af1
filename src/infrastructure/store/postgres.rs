//! Postgres/pgvector document store implementation

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::domain::document::{Document, DocumentMetadata, DocumentStore};
use crate::domain::DomainError;

/// Render an embedding as a pgvector literal, e.g. `[0.1,0.2]`
pub fn pgvector_literal(embedding: &[f32]) -> String {
    let values: Vec<String> = embedding.iter().map(|v| v.to_string()).collect();
    format!("[{}]", values.join(","))
}

/// Parse a pgvector text representation back into a vector
pub fn parse_pgvector(text: &str) -> Result<Vec<f32>, DomainError> {
    text.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.trim()
                .parse::<f32>()
                .map_err(|e| DomainError::storage(format!("Invalid vector component: {}", e)))
        })
        .collect()
}

/// Configuration for the pgvector document store
#[derive(Debug, Clone)]
pub struct PgDocumentStoreConfig {
    /// Embedding dimensions of the vector column
    pub dimensions: u32,
    /// Table name
    pub table_name: String,
}

impl PgDocumentStoreConfig {
    pub fn new(dimensions: u32) -> Self {
        Self {
            dimensions,
            table_name: "documents".to_string(),
        }
    }

    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = name.into();
        self
    }
}

/// pgvector-backed document store
#[derive(Debug)]
pub struct PgDocumentStore {
    pool: PgPool,
    config: PgDocumentStoreConfig,
}

impl PgDocumentStore {
    /// Create a new store over an existing pool
    pub fn new(pool: PgPool, config: PgDocumentStoreConfig) -> Self {
        Self { pool, config }
    }

    /// Ensure the pgvector extension and documents table exist
    pub async fn ensure_table(&self) -> Result<(), DomainError> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to create vector extension: {}", e))
            })?;

        let query = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id VARCHAR(255) PRIMARY KEY,
                content TEXT NOT NULL,
                metadata JSONB DEFAULT '{{}}',
                embedding vector({}) NOT NULL
            )
            "#,
            self.config.table_name, self.config.dimensions
        );

        sqlx::query(&query)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create table: {}", e)))?;

        // IVFFlat needs data to build; index creation failure is non-fatal
        let vector_index = format!(
            "CREATE INDEX IF NOT EXISTS idx_{}_embedding ON {} USING ivfflat (embedding vector_cosine_ops)",
            self.config.table_name, self.config.table_name
        );
        let _ = sqlx::query(&vector_index).execute(&self.pool).await;

        Ok(())
    }

    fn row_to_document(row: &sqlx::postgres::PgRow) -> Result<Document, DomainError> {
        let id: String = row.get("id");
        let content: String = row.get("content");
        let metadata_json: serde_json::Value = row.get("metadata");
        let embedding_text: String = row.get("embedding");

        let metadata: DocumentMetadata = serde_json::from_value(metadata_json).unwrap_or_default();
        let embedding = parse_pgvector(&embedding_text)?;

        Ok(Document::new(id, content)
            .with_all_metadata(metadata)
            .with_embedding(embedding))
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn upsert(&self, documents: Vec<Document>) -> Result<(), DomainError> {
        for doc in documents {
            let embedding = doc.embedding().ok_or_else(|| {
                DomainError::validation(format!("document '{}' has no embedding", doc.id()))
            })?;

            let metadata = serde_json::to_value(doc.metadata()).unwrap_or_default();

            let query = format!(
                r#"
                INSERT INTO {} (id, content, metadata, embedding)
                VALUES ($1, $2, $3, '{}'::vector)
                ON CONFLICT (id) DO UPDATE
                SET content = EXCLUDED.content,
                    metadata = EXCLUDED.metadata,
                    embedding = EXCLUDED.embedding
                "#,
                self.config.table_name,
                pgvector_literal(embedding)
            );

            sqlx::query(&query)
                .bind(doc.id())
                .bind(doc.content())
                .bind(metadata)
                .execute(&self.pool)
                .await
                .map_err(|e| DomainError::storage(format!("Upsert failed: {}", e)))?;
        }

        Ok(())
    }

    async fn nearest(
        &self,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<(Document, f32)>, DomainError> {
        let query = format!(
            r#"
            SELECT
                id,
                content,
                metadata,
                embedding::text as embedding,
                embedding <=> '{}' as distance
            FROM {}
            ORDER BY distance
            LIMIT {}
            "#,
            pgvector_literal(embedding),
            self.config.table_name,
            k
        );

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Similarity search failed: {}", e)))?;

        let mut results = Vec::with_capacity(rows.len());

        for row in &rows {
            let distance: f64 = row.get("distance");
            results.push((Self::row_to_document(row)?, distance as f32));
        }

        Ok(results)
    }

    async fn list(&self, limit: usize) -> Result<Vec<Document>, DomainError> {
        let query = format!(
            "SELECT id, content, metadata, embedding::text as embedding FROM {} ORDER BY id LIMIT {}",
            self.config.table_name, limit
        );

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("List failed: {}", e)))?;

        rows.iter().map(Self::row_to_document).collect()
    }

    async fn delete(&self, id: &str) -> Result<bool, DomainError> {
        let query = format!("DELETE FROM {} WHERE id = $1", self.config.table_name);

        let result = sqlx::query(&query)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Delete failed: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> Result<(), DomainError> {
        let query = format!("DELETE FROM {}", self.config.table_name);

        sqlx::query(&query)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Delete all failed: {}", e)))?;

        Ok(())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let query = format!("SELECT COUNT(*) as count FROM {}", self.config.table_name);

        let row = sqlx::query(&query)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Count failed: {}", e)))?;

        let count: i64 = row.get("count");

        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pgvector_literal() {
        assert_eq!(pgvector_literal(&[0.5, -1.0, 2.0]), "[0.5,-1,2]");
    }

    #[test]
    fn test_parse_pgvector_round_trip() {
        let original = vec![0.25, -0.5, 1.0];

        let parsed = parse_pgvector(&pgvector_literal(&original)).unwrap();

        assert_eq!(parsed, original);
    }

    #[test]
    fn test_parse_pgvector_empty() {
        assert_eq!(parse_pgvector("[]").unwrap(), Vec::<f32>::new());
    }

    #[test]
    fn test_parse_pgvector_invalid() {
        assert!(parse_pgvector("[1.0,abc]").is_err());
    }

    #[test]
    fn test_config_defaults() {
        let config = PgDocumentStoreConfig::new(768);

        assert_eq!(config.table_name, "documents");
        assert_eq!(config.dimensions, 768);
    }
}
