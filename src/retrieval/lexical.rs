//! BM25 lexical search over whole pages.
//!
//! Hand-rolled inverted index with Okapi BM25 scoring. The raw, unbounded
//! scores are part of the contract: the fusion stage squashes them with a
//! logistic curve, which needs the absolute magnitudes an embedded search
//! engine would hide.

use crate::retrieval::tokenizer::tokenize;
use crate::types::{Category, Document, LexicalHit};
use std::collections::HashMap;
use tracing::debug;

/// BM25 term-frequency saturation parameter
pub const BM25_K1: f32 = 1.5;
/// BM25 length normalization parameter
pub const BM25_B: f32 = 0.75;

/// A single entry in a term's postings list
#[derive(Debug, Clone)]
struct Posting {
    doc_id: u32,
    term_frequency: u32,
}

/// Per-document metadata carried into hits
#[derive(Debug, Clone)]
struct DocEntry {
    url: String,
    title: String,
    category: Category,
    token_count: u32,
}

/// In-memory BM25 index at whole-document granularity.
///
/// Built once at startup from the document snapshot; read-only afterwards.
#[derive(Debug, Default)]
pub struct LexicalIndex {
    /// term → postings, one posting per document containing the term
    postings: HashMap<String, Vec<Posting>>,
    docs: Vec<DocEntry>,
    total_doc_length: u64,
}

impl LexicalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index over a document collection in one pass.
    pub fn from_documents<'a>(documents: impl IntoIterator<Item = &'a Document>) -> Self {
        let mut index = Self::new();
        for doc in documents {
            index.add_document(doc);
        }
        debug!(
            "lexical index built: {} documents, {} terms, avgdl {:.1}",
            index.doc_count(),
            index.term_count(),
            index.average_doc_length()
        );
        index
    }

    /// Index a whole page. Title terms are indexed alongside body terms.
    pub fn add_document(&mut self, doc: &Document) {
        let doc_id = self.docs.len() as u32;
        let tokens = tokenize(&format!("{} {}", doc.title, doc.text));

        let mut tf_map: HashMap<&str, u32> = HashMap::new();
        for token in &tokens {
            *tf_map.entry(token.as_str()).or_insert(0) += 1;
        }
        for (term, tf) in tf_map {
            self.postings.entry(term.to_string()).or_default().push(Posting {
                doc_id,
                term_frequency: tf,
            });
        }

        self.total_doc_length += tokens.len() as u64;
        self.docs.push(DocEntry {
            url: doc.url.clone(),
            title: doc.title.clone(),
            category: doc.category,
            token_count: tokens.len() as u32,
        });
    }

    pub fn doc_count(&self) -> usize {
        self.docs.len()
    }

    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Average document length across the corpus, in tokens
    pub fn average_doc_length(&self) -> f32 {
        if self.docs.is_empty() {
            return 0.0;
        }
        self.total_doc_length as f32 / self.docs.len() as f32
    }

    /// Search the corpus, returning up to `limit` hits in descending score
    /// order.
    ///
    /// The candidate walk stops at the first score <= 0: candidates come out
    /// best-first, so everything after it scores no better. Documents outside
    /// the requested category are stepped over without consuming `limit`.
    /// An empty or fully-unmatched query yields an empty list.
    pub fn search(&self, query: &str, limit: usize, category: Option<Category>) -> Vec<LexicalHit> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() || self.docs.is_empty() || limit == 0 {
            return Vec::new();
        }

        let avgdl = self.average_doc_length();
        let n = self.docs.len() as f32;

        let mut scores: HashMap<u32, f32> = HashMap::new();
        for token in &query_tokens {
            if let Some(postings) = self.postings.get(token.as_str()) {
                let df = postings.len() as f32;
                // IDF: ln((N - df + 0.5) / (df + 0.5) + 1)
                let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();

                for posting in postings {
                    let dl = self.docs[posting.doc_id as usize].token_count as f32;
                    let tf = posting.term_frequency as f32;
                    let tf_norm =
                        (tf * (BM25_K1 + 1.0)) / (tf + BM25_K1 * (1.0 - BM25_B + BM25_B * dl / avgdl));
                    *scores.entry(posting.doc_id).or_insert(0.0) += idf * tf_norm;
                }
            }
        }

        // Rank candidates best-first; doc id breaks score ties so the walk
        // below never depends on hash iteration order.
        let mut ranked: Vec<(u32, f32)> = scores.into_iter().collect();
        ranked.sort_unstable_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        let mut hits = Vec::with_capacity(limit.min(ranked.len()));
        for (doc_id, score) in ranked {
            if score <= 0.0 {
                break;
            }
            let entry = &self.docs[doc_id as usize];
            if let Some(wanted) = category {
                if entry.category != wanted {
                    continue;
                }
            }
            hits.push(LexicalHit {
                url: entry.url.clone(),
                title: entry.title.clone(),
                category: entry.category,
                raw_score: score,
            });
            if hits.len() >= limit {
                break;
            }
        }

        debug!("lexical search for '{}': {} hits", query, hits.len());
        hits
    }
}
