//! Context assembly: prompt context text, per-document citations, and the
//! advisory confidence estimate.

use std::collections::HashSet;

use serde::Serialize;

use kbase_core::types::SearchResult;

/// One cited document. Deduplicated by document: the first (best-ranked)
/// chunk of a document supplies its relevance score.
#[derive(Debug, Clone, Serialize)]
pub struct Citation {
    pub doc_id: String,
    pub source: String,
    pub relevance: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssembledContext {
    pub context: String,
    pub citations: Vec<Citation>,
    pub confidence: f32,
}

impl AssembledContext {
    pub fn is_empty(&self) -> bool {
        self.context.is_empty()
    }
}

/// Build the prompt context from ranked results. Every chunk's content is
/// included (chunk ids are unique already); only the citation list is
/// deduplicated by document.
pub fn assemble(results: &[SearchResult]) -> AssembledContext {
    let mut parts = Vec::with_capacity(results.len());
    let mut citations: Vec<Citation> = Vec::new();
    let mut seen_docs: HashSet<&str> = HashSet::new();

    for (idx, r) in results.iter().enumerate() {
        parts.push(format!(
            "[Source {} - {} (Section {})]:\n{}\n",
            idx + 1,
            r.source,
            r.chunk_index + 1,
            r.content
        ));
        if seen_docs.insert(&r.doc_id) {
            citations.push(Citation {
                doc_id: r.doc_id.clone(),
                source: r.source.clone(),
                relevance: r.combined_score,
            });
        }
    }

    AssembledContext {
        context: parts.join("\n---\n"),
        citations,
        confidence: confidence(results),
    }
}

/// Mean of the combined scores of the top (up to) 3 results; when three or
/// more results all clear 0.7 the mean is boosted by 1.2, capped at 1.0.
/// Empty input scores 0.0. Rounded to two decimals. Advisory only: it is a
/// trust signal for the end user, never a gate on answering.
pub fn confidence(results: &[SearchResult]) -> f32 {
    if results.is_empty() {
        return 0.0;
    }
    let top: Vec<f32> = results.iter().take(3).map(|r| r.combined_score).collect();
    let mut score = top.iter().sum::<f32>() / top.len() as f32;
    if top.len() >= 3 && top.iter().all(|s| *s > 0.7) {
        score = (score * 1.2).min(1.0);
    }
    (score * 100.0).round() / 100.0
}
