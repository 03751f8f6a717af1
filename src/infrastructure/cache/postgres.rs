//! Postgres/pgvector cache store implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::domain::cache::{CacheEntry, CacheMatch, CacheStore};
use crate::domain::DomainError;
use crate::infrastructure::store::{parse_pgvector, pgvector_literal};

/// Configuration for the pgvector cache store
#[derive(Debug, Clone)]
pub struct PgCacheStoreConfig {
    /// Embedding dimensions of the vector column
    pub dimensions: u32,
    /// Table name
    pub table_name: String,
}

impl PgCacheStoreConfig {
    pub fn new(dimensions: u32) -> Self {
        Self {
            dimensions,
            table_name: "cache_entries".to_string(),
        }
    }

    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = name.into();
        self
    }
}

/// pgvector-backed cache store
#[derive(Debug)]
pub struct PgCacheStore {
    pool: PgPool,
    config: PgCacheStoreConfig,
}

impl PgCacheStore {
    /// Create a new store over an existing pool
    pub fn new(pool: PgPool, config: PgCacheStoreConfig) -> Self {
        Self { pool, config }
    }

    /// Ensure the cache_entries table exists
    pub async fn ensure_table(&self) -> Result<(), DomainError> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to create vector extension: {}", e)))?;

        let query = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                query_hash VARCHAR(64) PRIMARY KEY,
                query TEXT NOT NULL,
                query_embedding vector({}) NOT NULL,
                response TEXT NOT NULL,
                timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                hit_count INTEGER NOT NULL DEFAULT 1
            )
            "#,
            self.config.table_name, self.config.dimensions
        );

        sqlx::query(&query)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to create table: {}", e)))?;

        Ok(())
    }

    fn row_to_entry(row: &sqlx::postgres::PgRow) -> Result<CacheEntry, DomainError> {
        let query_hash: String = row.get("query_hash");
        let query: String = row.get("query");
        let embedding_text: String = row.get("query_embedding");
        let response: String = row.get("response");
        let timestamp: DateTime<Utc> = row.get("timestamp");
        let hit_count: i32 = row.get("hit_count");

        Ok(CacheEntry::from_parts(
            query_hash,
            query,
            parse_pgvector(&embedding_text)?,
            response,
            timestamp,
            hit_count.max(0) as u32,
        ))
    }
}

#[async_trait]
impl CacheStore for PgCacheStore {
    async fn find_similar(
        &self,
        embedding: &[f32],
        threshold: f32,
    ) -> Result<Option<CacheMatch>, DomainError> {
        let query = format!(
            r#"
            SELECT
                query_hash,
                query,
                query_embedding::text as query_embedding,
                response,
                timestamp,
                hit_count,
                1 - (query_embedding <=> '{}') as similarity
            FROM {}
            ORDER BY similarity DESC
            LIMIT 1
            "#,
            pgvector_literal(embedding),
            self.config.table_name
        );

        let row = sqlx::query(&query)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::cache(format!("Similarity lookup failed: {}", e)))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let similarity: f64 = row.get("similarity");
        let similarity = similarity as f32;

        if similarity < threshold {
            return Ok(None);
        }

        Ok(Some(CacheMatch::new(Self::row_to_entry(&row)?, similarity)))
    }

    async fn upsert(&self, entry: CacheEntry) -> Result<(), DomainError> {
        let query = format!(
            r#"
            INSERT INTO {} (query_hash, query, query_embedding, response, timestamp, hit_count)
            VALUES ($1, $2, '{}'::vector, $3, $4, $5)
            ON CONFLICT (query_hash) DO UPDATE
            SET query = EXCLUDED.query,
                query_embedding = EXCLUDED.query_embedding,
                response = EXCLUDED.response,
                timestamp = EXCLUDED.timestamp,
                hit_count = EXCLUDED.hit_count
            "#,
            self.config.table_name,
            pgvector_literal(entry.query_embedding())
        );

        sqlx::query(&query)
            .bind(entry.query_hash())
            .bind(entry.query())
            .bind(entry.response())
            .bind(entry.timestamp())
            .bind(entry.hit_count() as i32)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::cache(format!("Upsert failed: {}", e)))?;

        Ok(())
    }

    async fn increment_hits(&self, query_hash: &str) -> Result<(), DomainError> {
        let query = format!(
            "UPDATE {} SET hit_count = hit_count + 1 WHERE query_hash = $1",
            self.config.table_name
        );

        let result = sqlx::query(&query)
            .bind(query_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::cache(format!("Hit count update failed: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "cache entry '{}'",
                query_hash
            )));
        }

        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<CacheEntry>, DomainError> {
        let query = format!(
            r#"
            SELECT
                query_hash,
                query,
                query_embedding::text as query_embedding,
                response,
                timestamp,
                hit_count
            FROM {}
            "#,
            self.config.table_name
        );

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::cache(format!("List failed: {}", e)))?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    async fn delete(&self, query_hash: &str) -> Result<bool, DomainError> {
        let query = format!(
            "DELETE FROM {} WHERE query_hash = $1",
            self.config.table_name
        );

        let result = sqlx::query(&query)
            .bind(query_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::cache(format!("Delete failed: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> Result<(), DomainError> {
        let query = format!("DELETE FROM {}", self.config.table_name);

        sqlx::query(&query)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::cache(format!("Delete all failed: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = PgCacheStoreConfig::new(768);

        assert_eq!(config.table_name, "cache_entries");
        assert_eq!(config.dimensions, 768);
    }

    #[test]
    fn test_config_custom_table() {
        let config = PgCacheStoreConfig::new(768).with_table_name("answers");

        assert_eq!(config.table_name, "answers");
    }
}
