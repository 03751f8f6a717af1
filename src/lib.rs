//! finsearch
//!
//! A financial research pipeline: semantically cached question answering over
//! indexed SEC filings, with heuristic routing to live web search and a
//! tiered answer generation fallback chain.

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use config::StorageBackend;
use domain::cache::CacheStore;
use domain::document::DocumentStore;
use domain::embedding::EmbeddingProvider;
use domain::routing::QueryRouter;
use domain::web_search::WebSearchProvider;
use infrastructure::cache::{InMemoryCacheStore, PgCacheStore, PgCacheStoreConfig};
use infrastructure::embedding::NomicEmbeddingProvider;
use infrastructure::generation::OpenAiGenerationProvider;
use infrastructure::http_client::HttpClient;
use infrastructure::services::{AnswerGenerator, Retriever, SearchService, SemanticCacheService};
use infrastructure::store::{
    InMemoryDocumentStore, PgDocumentStore, PgDocumentStoreConfig,
};
use infrastructure::web_search::{BraveSearchProvider, OfflineSearchProvider, WebSearchClient};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// The assembled query pipeline plus direct handles to the services the CLI
/// maintenance commands operate on
pub struct Pipeline {
    pub search: SearchService,
    pub retriever: Arc<Retriever>,
    pub cache: Arc<SemanticCacheService>,
}

/// Build the pipeline from configuration: providers, storage backends and
/// services wired together.
pub async fn create_pipeline(config: &AppConfig) -> anyhow::Result<Pipeline> {
    let http = HttpClient::with_timeout(HTTP_TIMEOUT);

    let embeddings: Arc<dyn EmbeddingProvider> = Arc::new(
        NomicEmbeddingProvider::new(http.clone(), config.providers.nomic_api_key.clone())
            .context("embedding provider requires NOMIC_API_KEY")?,
    );

    let generation = Arc::new(
        OpenAiGenerationProvider::new(http.clone(), config.providers.openai_api_key.clone())
            .context("generation provider requires OPENAI_API_KEY")?,
    );

    let web_provider: Arc<dyn WebSearchProvider> = if config.providers.brave_api_key.is_empty() {
        info!("no Brave API key configured, using offline web search data");
        Arc::new(OfflineSearchProvider::new())
    } else {
        Arc::new(
            BraveSearchProvider::new(http, config.providers.brave_api_key.clone())
                .context("failed to build Brave search provider")?,
        )
    };

    let (document_store, cache_store) = create_stores(config, embeddings.dimensions()).await?;

    let cache = Arc::new(SemanticCacheService::with_threshold(
        cache_store,
        embeddings.clone(),
        config.cache.similarity_threshold,
    ));
    let retriever = Arc::new(Retriever::new(document_store, embeddings));

    if config.retrieval.seed_sample_data {
        let added = retriever
            .seed_sample_data()
            .await
            .context("failed to seed sample documents")?;
        if added > 0 {
            info!(added, "seeded sample 10-K corpus");
        }
    }

    let search = SearchService::new(
        cache.clone(),
        retriever.clone(),
        QueryRouter::new(),
        Arc::new(WebSearchClient::new(web_provider)),
        AnswerGenerator::new(generation),
    )
    .with_top_k(config.retrieval.top_k);

    Ok(Pipeline {
        search,
        retriever,
        cache,
    })
}

async fn create_stores(
    config: &AppConfig,
    dimensions: usize,
) -> anyhow::Result<(Arc<dyn DocumentStore>, Arc<dyn CacheStore>)> {
    match config.storage.backend {
        StorageBackend::InMemory => {
            info!("using in-memory storage");
            Ok((
                Arc::new(InMemoryDocumentStore::new()),
                Arc::new(InMemoryCacheStore::new()),
            ))
        }
        StorageBackend::Postgres => {
            let database_url = config
                .storage
                .database_url
                .as_deref()
                .context("postgres backend requires storage.database_url")?;

            info!("connecting to PostgreSQL");
            let pool = sqlx::PgPool::connect(database_url)
                .await
                .context("failed to connect to PostgreSQL")?;

            let dimensions = dimensions as u32;
            let documents = PgDocumentStore::new(pool.clone(), PgDocumentStoreConfig::new(dimensions));
            documents.ensure_table().await?;

            let cache = PgCacheStore::new(pool, PgCacheStoreConfig::new(dimensions));
            cache.ensure_table().await?;

            Ok((Arc::new(documents), Arc::new(cache)))
        }
    }
}
