use std::collections::HashSet;

use retrieval_core::types::HybridHit;

/// Lexical hits first, then vector hits; keeps the first occurrence of each
/// distinct text and stops at `k`.
pub fn merge(vector_hits: Vec<HybridHit>, lexical_hits: Vec<HybridHit>, k: usize) -> Vec<HybridHit> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::with_capacity(k.min(vector_hits.len() + lexical_hits.len()));
    for hit in lexical_hits.into_iter().chain(vector_hits) {
        if merged.len() >= k { break; }
        if seen.insert(hit.text.clone()) { merged.push(hit); }
    }
    merged
}

/// Maps a squared L2 distance onto a higher-is-better score in `(0, 1]`.
pub fn similarity(distance: f32) -> f32 { 1.0 / (1.0 + distance) }
