//! Fusion of lexical and semantic hit sets into one ranked list.
//!
//! The combination rule is
//!
//! ```text
//! hybrid = max(bm25_norm, sem_norm) + alpha * min(bm25_norm, sem_norm)
//! ```
//!
//! so one very strong signal (an exact name match, say) outranks two
//! mediocre ones, and `alpha` pays a bonus when both paths agree. Plain
//! averaging would let two middling scores beat one excellent score.

use crate::retrieval::normalize::{lexical_scores, semantic_scores};
use crate::types::{Category, FusedCandidate, LexicalHit, MatchKind, SemanticHit};
use std::collections::HashMap;

/// Default weight of the agreement bonus
pub const DEFAULT_ALPHA: f32 = 0.5;

/// Fuse both hit sets into candidates ordered by hybrid score descending.
///
/// A URL present on only one side contributes 0.0 for the missing score.
/// `match_kind` is `Hybrid` exactly when the URL occurs in both raw hit
/// sets. Equal scores are ordered by URL ascending so the ranking never
/// depends on map iteration order.
pub fn fuse(lexical: &[LexicalHit], semantic: &[SemanticHit], alpha: f32) -> Vec<FusedCandidate> {
    let bm25 = lexical_scores(lexical);
    let sem = semantic_scores(semantic);

    // First hit to mention a URL supplies its title and category; the
    // semantic set is consulted first, as its payload carries both fields
    // for every passage.
    let mut meta: HashMap<&str, (&str, Category)> = HashMap::new();
    for hit in semantic {
        meta.entry(hit.url.as_str())
            .or_insert((hit.title.as_str(), hit.category));
    }
    for hit in lexical {
        meta.entry(hit.url.as_str())
            .or_insert((hit.title.as_str(), hit.category));
    }

    let mut urls: Vec<&String> = bm25.keys().chain(sem.keys()).collect();
    urls.sort_unstable();
    urls.dedup();

    let mut candidates: Vec<FusedCandidate> = Vec::with_capacity(urls.len());
    for url in urls {
        let s_bm25 = bm25.get(url).copied().unwrap_or(0.0);
        let s_sem = sem.get(url).copied().unwrap_or(0.0);
        let hybrid_score = s_bm25.max(s_sem) + alpha * s_bm25.min(s_sem);

        let in_bm25 = bm25.contains_key(url);
        let in_sem = sem.contains_key(url);
        let match_kind = if in_bm25 && in_sem {
            MatchKind::Hybrid
        } else if in_bm25 {
            MatchKind::Lexical
        } else {
            MatchKind::Semantic
        };

        let (title, category) = meta
            .get(url.as_str())
            .copied()
            .unwrap_or(("", Category::Main));

        candidates.push(FusedCandidate {
            url: url.clone(),
            title: title.to_string(),
            category,
            hybrid_score,
            bm25_norm: s_bm25,
            sem_norm: s_sem,
            match_kind,
        });
    }

    candidates.sort_by(|a, b| {
        b.hybrid_score
            .partial_cmp(&a.hybrid_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.url.cmp(&b.url))
    });

    candidates
}
