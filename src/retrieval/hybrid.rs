//! Hybrid retrieval joining the lexical and semantic paths

use super::fusion::fuse;
use super::lexical::LexicalIndex;
use crate::config::RetrievalConfig;
use crate::embedding::Embedder;
use crate::store::DocumentStore;
use crate::types::{Category, RetrievedDocument, SemanticHit};
use crate::vector::VectorBackend;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Request validation errors.
///
/// Everything past validation degrades instead of failing: a dead vector
/// backend still yields lexical answers.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("query must not be empty")]
    EmptyQuery,
    #[error("query exceeds {max} characters")]
    QueryTooLong { max: usize },
    #[error("top_k must be between 1 and {max}, got {got}")]
    InvalidTopK { got: usize, max: usize },
    #[error("alpha must be within [0.0, 1.0], got {got}")]
    InvalidAlpha { got: f32 },
}

/// Hybrid retrieval engine combining both search paths
pub struct HybridRetriever {
    /// BM25 index over whole pages
    index: Arc<LexicalIndex>,
    /// Snapshot of full page texts, keyed by URL
    store: Arc<DocumentStore>,
    /// Embedding client for query encoding
    embedder: Arc<dyn Embedder>,
    /// Vector backend holding passage embeddings
    vectors: Arc<dyn VectorBackend>,
    /// Configuration
    config: RetrievalConfig,
}

impl HybridRetriever {
    /// Create a new hybrid retriever
    pub fn new(
        index: Arc<LexicalIndex>,
        store: Arc<DocumentStore>,
        embedder: Arc<dyn Embedder>,
        vectors: Arc<dyn VectorBackend>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            index,
            store,
            embedder,
            vectors,
            config,
        }
    }

    /// Retrieval settings this instance was built with
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Search using hybrid retrieval.
    ///
    /// Both paths run concurrently. The lexical path is in-memory and always
    /// answers; the semantic path is bounded by a deadline and degrades to an
    /// empty hit set on timeout or backend error, so the worst case is a
    /// lexical-only result list.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        category: Option<Category>,
        alpha: f32,
    ) -> Result<Vec<RetrievedDocument>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        if query.chars().count() > self.config.max_query_len {
            return Err(SearchError::QueryTooLong {
                max: self.config.max_query_len,
            });
        }
        if top_k == 0 || top_k > self.config.max_top_k {
            return Err(SearchError::InvalidTopK {
                got: top_k,
                max: self.config.max_top_k,
            });
        }
        if !(0.0..=1.0).contains(&alpha) {
            return Err(SearchError::InvalidAlpha { got: alpha });
        }

        let deadline = Duration::from_secs(self.config.semantic_timeout_secs);
        let (lexical_hits, semantic) = tokio::join!(
            async { self.index.search(query, self.config.keyword_top_k, category) },
            timeout(deadline, self.semantic_hits(query, category)),
        );

        let semantic_hits = match semantic {
            Ok(Ok(hits)) => hits,
            Ok(Err(err)) => {
                warn!("semantic path failed, serving lexical results only: {err:#}");
                Vec::new()
            }
            Err(_) => {
                warn!(
                    "semantic path timed out after {}s, serving lexical results only",
                    self.config.semantic_timeout_secs
                );
                Vec::new()
            }
        };

        debug!(
            "paths answered: {} lexical, {} semantic",
            lexical_hits.len(),
            semantic_hits.len()
        );

        let mut candidates = fuse(&lexical_hits, &semantic_hits, alpha);
        candidates.truncate(top_k);

        let results: Vec<RetrievedDocument> = candidates
            .into_iter()
            .map(|c| {
                let full_text = self.store.resolve(&c.url);
                RetrievedDocument {
                    url: c.url,
                    title: c.title,
                    category: c.category,
                    full_text,
                    hybrid_score: c.hybrid_score,
                    bm25_norm: c.bm25_norm,
                    sem_norm: c.sem_norm,
                    match_kind: c.match_kind,
                }
            })
            .collect();

        info!(
            "hybrid search for '{}': {} results",
            clip(query, 50),
            results.len()
        );

        Ok(results)
    }

    /// Embed the query and ask the vector backend for the nearest passages
    async fn semantic_hits(
        &self,
        query: &str,
        category: Option<Category>,
    ) -> anyhow::Result<Vec<SemanticHit>> {
        let embedding = self.embedder.embed(query).await?;
        let hits = self
            .vectors
            .query(&embedding, self.config.semantic_top_k, category)
            .await?;
        Ok(hits)
    }
}

/// Cap query text in log lines, respecting char boundaries
fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    }
}
