//! Score fusion: merge the two sub-searches, normalize per column, blend.

use std::collections::HashMap;

use kbase_core::types::{Chunk, ChunkId, SearchResult};

/// Merge semantic and keyword candidates into one insertion-ordered result
/// set, normalize each score column by its in-batch maximum, and blend:
///
/// `combined = (1 - keyword_weight) * norm_semantic + keyword_weight * norm_keyword`
///
/// Semantic candidates enter first (in their returned order), then
/// keyword-only candidates in keyword-rank order; a chunk found by both
/// keeps both raw scores. The final sort is stable and descending on the
/// combined score, so ties keep that insertion order. Normalization is
/// relative to the candidate batch of this one call, not to the corpus.
pub fn fuse(
    semantic: Vec<(Chunk, f32)>,
    keyword: Vec<(Chunk, f32)>,
    keyword_weight: f32,
) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = Vec::new();
    let mut by_id: HashMap<ChunkId, usize> = HashMap::new();

    for (chunk, score) in semantic {
        let pos = results.len();
        let mut result = SearchResult::from_chunk(chunk);
        result.semantic_score = score;
        by_id.insert(result.id.clone(), pos);
        results.push(result);
    }
    for (chunk, score) in keyword {
        if let Some(&pos) = by_id.get(&chunk.id) {
            results[pos].keyword_score = score;
        } else {
            let pos = results.len();
            let mut result = SearchResult::from_chunk(chunk);
            result.keyword_score = score;
            by_id.insert(result.id.clone(), pos);
            results.push(result);
        }
    }

    let max_semantic = column_max(results.iter().map(|r| r.semantic_score));
    let max_keyword = column_max(results.iter().map(|r| r.keyword_score));
    let semantic_weight = 1.0 - keyword_weight;
    for r in &mut results {
        let norm_semantic = normalize(r.semantic_score, max_semantic);
        let norm_keyword = normalize(r.keyword_score, max_keyword);
        r.combined_score = semantic_weight * norm_semantic + keyword_weight * norm_keyword;
    }

    results.sort_by(|a, b| {
        b.combined_score
            .partial_cmp(&a.combined_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results
}

fn column_max(scores: impl Iterator<Item = f32>) -> f32 {
    scores.fold(0.0, f32::max)
}

fn normalize(score: f32, max: f32) -> f32 {
    if max > 0.0 {
        score / max
    } else {
        0.0
    }
}
