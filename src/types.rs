//! Core types for the deskribe retrieval service

use serde::{Deserialize, Serialize};
use std::fmt;

/// Embedding vector type
pub type Embedding = Vec<f32>;

/// Placeholder body for a URL that is ranked but missing from the snapshot
pub const MISSING_TEXT_SENTINEL: &str = "(полный текст недоступен)";

// ============================================================================
// Categories
// ============================================================================

/// Content category a document belongs to, derived from its location in the
/// source site (news feed, staff pages, or the main section tree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Main,
    News,
    People,
}

impl Category {
    /// Parse a category name. Unknown or empty strings yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "main" => Some(Category::Main),
            "news" => Some(Category::News),
            "people" => Some(Category::People),
            _ => None,
        }
    }

    /// Get the lowercase name used on the wire and in payload filters
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Main => "main",
            Category::News => "news",
            Category::People => "people",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Documents and passages
// ============================================================================

/// A full page from the document snapshot, keyed by URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub url: String,
    pub title: String,
    pub text: String,
    pub category: Category,
}

impl Document {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            text: text.into(),
            category: Category::Main,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }
}

/// A passage of a document, the unit stored in the vector backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    /// Stable id of the form `{url}#{chunk_index}`
    pub chunk_id: String,
    pub url: String,
    pub title: String,
    pub category: Category,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub text: String,
}

// ============================================================================
// Search hits and fused results
// ============================================================================

/// Which retrieval path produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Lexical,
    Semantic,
    Hybrid,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Lexical => "lexical",
            MatchKind::Semantic => "semantic",
            MatchKind::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A document-level hit from the lexical path. `raw_score` is unbounded BM25.
#[derive(Debug, Clone)]
pub struct LexicalHit {
    pub url: String,
    pub title: String,
    pub category: Category,
    pub raw_score: f32,
}

/// A passage-level hit from the vector backend. `similarity` is cosine, in [0, 1].
#[derive(Debug, Clone)]
pub struct SemanticHit {
    pub url: String,
    pub title: String,
    pub category: Category,
    pub similarity: f32,
}

/// One URL after both paths are merged, before full texts are attached.
/// Built fresh per query.
#[derive(Debug, Clone)]
pub struct FusedCandidate {
    pub url: String,
    pub title: String,
    pub category: Category,
    pub hybrid_score: f32,
    pub bm25_norm: f32,
    pub sem_norm: f32,
    pub match_kind: MatchKind,
}

/// Final output unit: a whole page with its fused score and provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub url: String,
    pub title: String,
    pub category: Category,
    pub full_text: String,
    pub hybrid_score: f32,
    pub bm25_norm: f32,
    pub sem_norm: f32,
    pub match_kind: MatchKind,
}
