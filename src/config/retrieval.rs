//! Retrieval and chunking configuration

use serde::{Deserialize, Serialize};

/// Hybrid retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Unique pages returned per search unless the caller overrides
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Passages fetched from the vector backend before deduplication
    #[serde(default = "default_semantic_top_k")]
    pub semantic_top_k: usize,
    /// Pages fetched from the BM25 index before fusion
    #[serde(default = "default_keyword_top_k")]
    pub keyword_top_k: usize,
    /// Weight of the weaker signal in the fused score (0.0-1.0)
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    /// Largest top_k a caller may request
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,
    /// Longest accepted query, in characters
    #[serde(default = "default_max_query_len")]
    pub max_query_len: usize,
    /// Deadline for the semantic path before degrading to lexical-only
    #[serde(default = "default_semantic_timeout_secs")]
    pub semantic_timeout_secs: u64,
}

fn default_top_k() -> usize {
    5
}

fn default_semantic_top_k() -> usize {
    15
}

fn default_keyword_top_k() -> usize {
    10
}

fn default_alpha() -> f32 {
    0.5
}

fn default_max_top_k() -> usize {
    20
}

fn default_max_query_len() -> usize {
    1000
}

fn default_semantic_timeout_secs() -> u64 {
    5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            semantic_top_k: default_semantic_top_k(),
            keyword_top_k: default_keyword_top_k(),
            alpha: default_alpha(),
            max_top_k: default_max_top_k(),
            max_query_len: default_max_query_len(),
            semantic_timeout_secs: default_semantic_timeout_secs(),
        }
    }
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Characters of trailing context repeated at the start of the next chunk
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Shorter chunks are merged into a neighbor
    #[serde(default = "default_min_chunk_size")]
    pub min_chunk_size: usize,
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    50
}

fn default_min_chunk_size() -> usize {
    80
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            min_chunk_size: default_min_chunk_size(),
        }
    }
}
