//! Score normalization ahead of fusion.
//!
//! The two paths produce incompatible scales: BM25 is unbounded, cosine
//! similarity already lives in [0, 1]. Raw BM25 goes through a logistic
//! curve; min-max scaling would destroy the absolute gap between an exact
//! name match (19.3) and an incidental term overlap (2.6).

use crate::types::{LexicalHit, SemanticHit};
use std::collections::HashMap;

/// Steepness of the logistic curve applied to raw BM25 scores
pub const SIGMOID_K: f32 = 1.0;
/// Midpoint of the logistic curve: a raw score of 3.0 maps to 0.5
pub const SIGMOID_X0: f32 = 3.0;

/// Squash a raw BM25 score into (0, 1)
pub fn sigmoid_normalize(raw: f32) -> f32 {
    1.0 / (1.0 + (-SIGMOID_K * (raw - SIGMOID_X0)).exp())
}

/// Collapse lexical hits to one normalized score per URL, keeping the
/// maximum when a URL appears more than once.
pub fn lexical_scores(hits: &[LexicalHit]) -> HashMap<String, f32> {
    let mut scores: HashMap<String, f32> = HashMap::new();
    for hit in hits {
        if hit.url.is_empty() {
            continue;
        }
        let norm = sigmoid_normalize(hit.raw_score);
        let entry = scores.entry(hit.url.clone()).or_insert(0.0);
        if norm > *entry {
            *entry = norm;
        }
    }
    scores
}

/// Collapse passage-level semantic hits to one score per URL. Several
/// passages of the same page may match; the page keeps the best one.
/// Similarities pass through unchanged.
pub fn semantic_scores(hits: &[SemanticHit]) -> HashMap<String, f32> {
    let mut scores: HashMap<String, f32> = HashMap::new();
    for hit in hits {
        if hit.url.is_empty() {
            continue;
        }
        let entry = scores.entry(hit.url.clone()).or_insert(0.0);
        if hit.similarity > *entry {
            *entry = hit.similarity;
        }
    }
    scores
}
