//! Embedding client configuration

use serde::{Deserialize, Serialize};

/// Embedding model configuration.
///
/// Points at any OpenAI-compatible `/v1/embeddings` endpoint. The defaults
/// target a local text-embeddings-inference server hosting the multilingual
/// MiniLM model the corpus was indexed with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embeddings endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model name passed through to the server
    #[serde(default = "default_model")]
    pub model: String,
    /// Vector dimensionality the collection was created with
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    /// API key (falls back to the OPENAI_API_KEY environment variable)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Texts per embedding request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_endpoint() -> String {
    "http://localhost:8080/v1/embeddings".to_string()
}

fn default_model() -> String {
    "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2".to_string()
}

fn default_dimensions() -> usize {
    384
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_batch_size() -> usize {
    64
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            dimensions: default_dimensions(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            batch_size: default_batch_size(),
        }
    }
}
