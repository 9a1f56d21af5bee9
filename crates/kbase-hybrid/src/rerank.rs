//! Lightweight secondary re-rank between retrieval and context assembly.

use std::collections::HashSet;

use kbase_core::types::SearchResult;

/// Reorder results by term overlap with the query: each result's combined
/// score is boosted by `1 + 0.1 * overlap`, where overlap is the number of
/// distinct query terms that also appear in the content, for ordering
/// purposes only. The stored scores are not modified, and equal boosted
/// scores keep their incoming order.
pub fn rerank(query: &str, results: Vec<SearchResult>) -> Vec<SearchResult> {
    let query_lower = query.to_lowercase();
    let query_terms: HashSet<&str> = query_lower.split_whitespace().collect();

    let mut keyed: Vec<(f32, SearchResult)> = results
        .into_iter()
        .map(|r| {
            let content_lower = r.content.to_lowercase();
            let overlap = content_lower
                .split_whitespace()
                .collect::<HashSet<&str>>()
                .intersection(&query_terms)
                .count();
            (r.combined_score * (1.0 + overlap as f32 * 0.1), r)
        })
        .collect();
    keyed.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    keyed.into_iter().map(|(_, r)| r).collect()
}
