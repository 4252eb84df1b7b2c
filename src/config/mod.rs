//! Configuration for Deskribe

mod embedding;
mod llm;
mod retrieval;
mod server;
mod store;
mod vector;

pub use embedding::EmbeddingConfig;
pub use llm::LlmConfig;
pub use retrieval::{ChunkingConfig, RetrievalConfig};
pub use server::ServerConfig;
pub use store::StoreConfig;
pub use vector::VectorConfig;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for the Deskribe service.
///
/// Every section and every field has a default, so an empty TOML file is a
/// valid configuration and a partial one only overrides what it names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP service configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Hybrid retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Embedding client configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// Vector backend configuration
    #[serde(default)]
    pub vector: VectorConfig,
    /// Language model configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Document snapshot configuration
    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            retrieval: RetrievalConfig::default(),
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            vector: VectorConfig::default(),
            llm: LlmConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration fields.
    ///
    /// Collects all validation errors and reports them together so the user
    /// can fix everything in one pass rather than playing whack-a-mole.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        // Retrieval validation
        if self.retrieval.top_k == 0 {
            errors.push("top_k must be positive".to_string());
        }
        if self.retrieval.max_top_k == 0 {
            errors.push("max_top_k must be positive".to_string());
        }
        if self.retrieval.top_k > self.retrieval.max_top_k {
            errors.push(format!(
                "top_k ({}) must not exceed max_top_k ({})",
                self.retrieval.top_k, self.retrieval.max_top_k
            ));
        }
        if self.retrieval.keyword_top_k == 0 {
            errors.push("keyword_top_k must be positive".to_string());
        }
        if self.retrieval.semantic_top_k == 0 {
            errors.push("semantic_top_k must be positive".to_string());
        }
        if self.retrieval.alpha < 0.0 || self.retrieval.alpha > 1.0 {
            errors.push("alpha must be between 0.0 and 1.0".to_string());
        }
        if self.retrieval.max_query_len == 0 {
            errors.push("max_query_len must be positive".to_string());
        }
        if self.retrieval.semantic_timeout_secs == 0 {
            errors.push("semantic_timeout_secs must be positive".to_string());
        }

        // Chunking validation
        if self.chunking.chunk_size == 0 {
            errors.push("chunk_size must be positive".to_string());
        }
        if self.chunking.chunk_size > 8192 {
            errors.push("chunk_size must be <= 8192".to_string());
        }
        if self.chunking.chunk_size > 0 && self.chunking.chunk_overlap >= self.chunking.chunk_size {
            errors.push(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            ));
        }
        if self.chunking.min_chunk_size > self.chunking.chunk_size {
            errors.push(format!(
                "min_chunk_size ({}) must not exceed chunk_size ({})",
                self.chunking.min_chunk_size, self.chunking.chunk_size
            ));
        }

        // Embedding validation
        if self.embedding.dimensions == 0 {
            errors.push("embedding dimensions must be positive".to_string());
        }
        if self.embedding.dimensions > 4096 {
            errors.push("embedding dimensions must be <= 4096".to_string());
        }
        if self.embedding.endpoint.is_empty() {
            errors.push("embedding endpoint must not be empty".to_string());
        }
        if self.embedding.batch_size == 0 {
            errors.push("embedding batch_size must be positive".to_string());
        }

        // Vector backend validation
        if let Err(e) = url::Url::parse(&self.vector.url) {
            errors.push(format!("vector url '{}' is not a valid URL: {}", self.vector.url, e));
        }
        if self.vector.collection.is_empty() {
            errors.push("vector collection must not be empty".to_string());
        }

        // LLM validation
        if self.llm.model.is_empty() {
            errors.push("llm model must not be empty".to_string());
        }
        if self.llm.temperature < 0.0 || self.llm.temperature > 2.0 {
            errors.push("llm temperature must be between 0.0 and 2.0".to_string());
        }
        if self.llm.max_tokens == 0 {
            errors.push("llm max_tokens must be positive".to_string());
        }

        // Server validation
        if self.server.listen_addr.is_empty() {
            errors.push("server listen_addr must not be empty".to_string());
        } else if let Some(port_str) = self.server.listen_addr.rsplit(':').next() {
            if let Ok(port) = port_str.parse::<u32>() {
                if port == 0 || port > 65535 {
                    errors.push(format!(
                        "server listen port must be between 1 and 65535, got {}",
                        port
                    ));
                }
            }
        }

        // Store validation
        if self.store.snapshot_path.as_os_str().is_empty() {
            errors.push("store snapshot_path must not be empty".to_string());
        }
        if self.store.cleaned_dir.as_os_str().is_empty() {
            errors.push("store cleaned_dir must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }
}
