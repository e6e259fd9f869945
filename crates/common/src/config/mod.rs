//! Configuration management for HydraDoc services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Pre-parsed manual corpus
    #[serde(default)]
    pub corpus: CorpusConfig,

    /// Ontology source
    #[serde(default)]
    pub ontology: OntologyConfig,

    /// Query expansion tuning
    #[serde(default)]
    pub expansion: ExpansionConfig,

    /// Hybrid retrieval tuning
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Context assembly budget
    #[serde(default)]
    pub context: ContextConfig,

    /// Text generation service
    #[serde(default)]
    pub llm: LlmConfig,

    /// Embedding service configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorpusConfig {
    /// Directory holding one JSON file per parsed manual
    #[serde(default = "default_corpus_path")]
    pub path: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OntologyConfig {
    /// JSON ontology replacing the built-in tables
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExpansionConfig {
    /// Context terms pulled in per matched concept
    #[serde(default = "default_max_context_terms")]
    pub max_context_terms: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    /// Passages requested from each ranker before fusion
    #[serde(default = "default_per_retriever_top_k")]
    pub per_retriever_top_k: usize,

    /// Passages kept after fusion
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// RRF constant
    #[serde(default = "default_rrf_k")]
    pub rrf_k: f32,

    /// Weight applied to lexical reciprocal ranks
    #[serde(default = "default_fusion_weight")]
    pub lexical_weight: f32,

    /// Weight applied to semantic reciprocal ranks
    #[serde(default = "default_fusion_weight")]
    pub semantic_weight: f32,

    /// Per-retriever timeout in milliseconds
    #[serde(default = "default_retrieval_timeout")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContextConfig {
    /// Maximum characters of assembled context
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    /// Drop the passage that overflows instead of cutting mid-passage
    #[serde(default)]
    pub truncate_at_passage_boundary: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Generation provider: openai, mock
    #[serde(default = "default_provider")]
    pub provider: String,

    /// API key for the generation service
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Model to use
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,

    /// Maximum output tokens
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: usize,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Attempts per answer, including the first call
    #[serde(default = "default_llm_attempts")]
    pub max_attempts: u32,

    /// Initial delay before a retry in milliseconds
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// Embedding provider: openai, mock
    #[serde(default = "default_provider")]
    pub provider: String,

    /// API key for embedding service
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Model to use
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Request timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries
    #[serde(default = "default_embedding_retries")]
    pub max_retries: u32,

    /// Batch size for embedding requests
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second (global)
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 60 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_corpus_path() -> String { "data/corpus".to_string() }
fn default_max_context_terms() -> usize { 3 }
fn default_per_retriever_top_k() -> usize { 12 }
fn default_top_k() -> usize { 15 }
fn default_rrf_k() -> f32 { 60.0 }
fn default_fusion_weight() -> f32 { 1.0 }
fn default_retrieval_timeout() -> u64 { 10_000 }
fn default_max_chars() -> usize { 24_000 }
fn default_provider() -> String { "openai".to_string() }
fn default_llm_model() -> String { crate::DEFAULT_GENERATION_MODEL.to_string() }
fn default_llm_max_tokens() -> usize { 1500 }
fn default_llm_timeout() -> u64 { 60 }
fn default_llm_attempts() -> u32 { 2 }
fn default_retry_backoff() -> u64 { 500 }
fn default_embedding_model() -> String { crate::DEFAULT_EMBEDDING_MODEL.to_string() }
fn default_embedding_dimension() -> usize { 1536 }
fn default_embedding_timeout() -> u64 { 30 }
fn default_embedding_retries() -> u32 { 3 }
fn default_batch_size() -> usize { 64 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "hydradoc".to_string() }
fn default_rate_limit() -> u32 { 10 }
fn default_burst() -> u32 { 20 }
fn default_enabled() -> bool { true }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., APP__RETRIEVAL__TOP_K=20
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: AppConfig = config.try_deserialize()?;
        config.apply_key_fallbacks(std::env::var("OPENAI_API_KEY").ok());
        Ok(config)
    }

    /// Load from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: AppConfig = config.try_deserialize()?;
        config.apply_key_fallbacks(std::env::var("OPENAI_API_KEY").ok());
        Ok(config)
    }

    /// Fill missing service keys from the conventional provider variable
    fn apply_key_fallbacks(&mut self, openai_key: Option<String>) {
        let Some(key) = openai_key.filter(|k| !k.trim().is_empty()) else {
            return;
        };
        if self.llm.api_key.is_none() {
            self.llm.api_key = Some(key.clone());
        }
        if self.embedding.api_key.is_none() {
            self.embedding.api_key = Some(key);
        }
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }
}

impl RetrievalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: default_corpus_path(),
        }
    }
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            max_context_terms: default_max_context_terms(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            per_retriever_top_k: default_per_retriever_top_k(),
            top_k: default_top_k(),
            rrf_k: default_rrf_k(),
            lexical_weight: default_fusion_weight(),
            semantic_weight: default_fusion_weight(),
            timeout_ms: default_retrieval_timeout(),
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            truncate_at_passage_boundary: false,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: None,
            api_base: None,
            model: default_llm_model(),
            temperature: 0.0,
            max_tokens: default_llm_max_tokens(),
            timeout_secs: default_llm_timeout(),
            max_attempts: default_llm_attempts(),
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: None,
            api_base: None,
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            timeout_secs: default_embedding_timeout(),
            max_retries: default_embedding_retries(),
            batch_size: default_batch_size(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: default_enabled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.retrieval.per_retriever_top_k, 12);
        assert_eq!(config.retrieval.top_k, 15);
        assert_eq!(config.expansion.max_context_terms, 3);
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.max_attempts, 2);
        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert!(!config.context.truncate_at_passage_boundary);
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "retrieval": { "top_k": 5 },
            "llm": { "provider": "mock" }
        }))
        .unwrap();
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.per_retriever_top_k, 12);
        assert_eq!(config.llm.provider, "mock");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.corpus.path, "data/corpus");
    }

    #[test]
    fn test_key_fallback_only_fills_missing() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("explicit".into());
        config.apply_key_fallbacks(Some("from-env".into()));
        assert_eq!(config.llm.api_key.as_deref(), Some("explicit"));
        assert_eq!(config.embedding.api_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_timeouts() {
        let config = AppConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert_eq!(config.retrieval.timeout(), Duration::from_millis(10_000));
    }
}
