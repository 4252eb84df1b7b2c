//! HTTP API request/response types

use crate::types::RetrievedDocument;
use serde::{Deserialize, Serialize};

/// Ask request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    /// The question text
    pub question: String,
    /// Number of source documents used for the context (default: 5)
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Optional category filter: "main", "news", or "people"
    #[serde(default)]
    pub category: Option<String>,
}

fn default_top_k() -> usize {
    5
}

/// One source the answer was grounded in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocumentJson {
    /// Page title
    pub title: String,
    /// Page URL
    pub source_url: String,
    /// Category tag ("main", "news", "people")
    pub category: String,
    /// Hybrid score, rounded to four decimal places
    pub score: f32,
    /// Which retrieval paths matched ("lexical", "semantic", "hybrid")
    pub match_type: String,
}

impl From<&RetrievedDocument> for SourceDocumentJson {
    fn from(doc: &RetrievedDocument) -> Self {
        Self {
            title: doc.title.clone(),
            source_url: doc.url.clone(),
            category: doc.category.as_str().to_string(),
            score: (doc.hybrid_score * 10_000.0).round() / 10_000.0,
            match_type: doc.match_kind.as_str().to_string(),
        }
    }
}

/// Ask response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    /// Generated answer
    pub answer: String,
    /// The question as received
    pub query: String,
    /// Sources used for the answer, in rank order
    pub sources: Vec<SourceDocumentJson>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "ok" when every backend answers, "degraded" otherwise
    pub status: String,
    /// Model answers are generated with
    pub model: String,
    /// Whether the vector backend responded to a probe
    pub qdrant_connected: bool,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}
