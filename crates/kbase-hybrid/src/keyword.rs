//! Keyword sub-search: raw term-frequency scoring over the chunk corpus.

use kbase_core::types::Chunk;

/// Score chunks by term frequency: the sum over lowercase query tokens of
/// that token's occurrence count in the lowercased chunk text. Zero-score
/// chunks are dropped; the rest are sorted descending (stable, so corpus
/// order breaks ties) and truncated to `limit`.
///
/// Occurrences are non-overlapping substring matches, so "policy" also
/// counts inside "policyholder". No stemming, no punctuation handling.
pub fn keyword_scores(chunks: Vec<Chunk>, query: &str, limit: usize) -> Vec<(Chunk, f32)> {
    let query_lower = query.to_lowercase();
    let terms: Vec<&str> = query_lower.split_whitespace().collect();

    let mut scored: Vec<(Chunk, f32)> = Vec::new();
    for chunk in chunks {
        let content_lower = chunk.content.to_lowercase();
        let count: usize = terms.iter().map(|t| content_lower.matches(t).count()).sum();
        if count > 0 {
            scored.push((chunk, count as f32));
        }
    }
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored
}
