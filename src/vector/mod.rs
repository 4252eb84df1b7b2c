//! Vector backend for passage-level semantic search.
//!
//! Passages live in an external Qdrant instance; this module owns the REST
//! client and the trait seam retrieval and indexing go through.

mod qdrant;

pub use qdrant::QdrantBackend;

use crate::types::{Category, Embedding, Passage, SemanticHit};
use std::fmt::Debug;

/// Errors from the vector backend
#[derive(Debug, thiserror::Error)]
pub enum VectorStoreError {
    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a failure
    #[error("Backend error: {0}")]
    Backend(String),

    /// Backend URL is not parseable
    #[error("Invalid backend URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type for vector store operations
pub type VectorStoreResult<T> = Result<T, VectorStoreError>;

/// Vector backend seam: nearest-passage queries plus the indexing side.
///
/// Object-safe so the retriever can hold a `dyn VectorBackend` and tests
/// can substitute a stub.
#[async_trait::async_trait]
pub trait VectorBackend: Send + Sync + Debug {
    /// Nearest passages to the query vector, best first. When a category is
    /// given the filter is applied server-side.
    async fn query(
        &self,
        vector: &[f32],
        limit: usize,
        category: Option<Category>,
    ) -> VectorStoreResult<Vec<SemanticHit>>;

    /// Drop and recreate the passage collection for vectors of the given size
    async fn recreate_collection(&self, dimensions: usize) -> VectorStoreResult<()>;

    /// Insert or update passages with their vectors
    async fn upsert(&self, passages: &[Passage], vectors: &[Embedding]) -> VectorStoreResult<()>;

    /// Whether the backend currently answers at all
    async fn is_healthy(&self) -> bool;
}
