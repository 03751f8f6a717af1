use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub providers: ProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Storage backend selection. Postgres requires `database_url`; the
/// in-memory backend needs nothing and loses data on exit.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    InMemory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Similarity threshold for serving a cached answer
    pub similarity_threshold: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    /// Documents retrieved per query
    pub top_k: usize,
    /// Whether to seed the sample 10-K corpus into an empty store at startup
    pub seed_sample_data: bool,
}

/// Provider API keys. Resolved from the environment so they never land in a
/// config file; empty values disable the corresponding live provider.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default)]
    pub nomic_api_key: String,
    #[serde(default)]
    pub brave_api_key: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_url: None,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.98,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            seed_sample_data: true,
        }
    }
}

impl AppConfig {
    /// Load configuration: `config/default` then `config/local` files, then
    /// `FINSEARCH__`-prefixed environment variables, each layer overriding
    /// the previous. Provider keys additionally fall back to their
    /// conventional environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("FINSEARCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut loaded: Self = config.try_deserialize()?;
        loaded.providers.apply_env_fallbacks();

        Ok(loaded)
    }
}

impl ProviderConfig {
    fn apply_env_fallbacks(&mut self) {
        if self.openai_api_key.is_empty() {
            self.openai_api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        }
        if self.nomic_api_key.is_empty() {
            self.nomic_api_key = std::env::var("NOMIC_API_KEY").unwrap_or_default();
        }
        if self.brave_api_key.is_empty() {
            self.brave_api_key = std::env::var("BRAVE_API_KEY").unwrap_or_default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.storage.backend, StorageBackend::InMemory);
        assert!((config.cache.similarity_threshold - 0.98).abs() < f32::EPSILON);
        assert_eq!(config.retrieval.top_k, 5);
        assert!(config.retrieval.seed_sample_data);
    }
}
