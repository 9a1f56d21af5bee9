use std::collections::HashMap;

use kbase_core::error::Error;
use kbase_core::traits::{Embedder, EmbeddingIndex};
use kbase_core::types::{Chunk, Meta, Neighbor};
use kbase_embed::HashEmbedder;
use kbase_hybrid::{assemble, rerank, HybridRetriever, DEFAULT_KEYWORD_WEIGHT};
use kbase_index::MemoryIndex;

fn chunk(id: &str, doc_id: &str, content: &str) -> Chunk {
    Chunk {
        id: id.to_string(),
        doc_id: doc_id.to_string(),
        source: format!("{doc_id}.txt"),
        content: content.to_string(),
        chunk_index: 0,
        metadata: HashMap::new(),
    }
}

fn doc_filter(doc_id: &str) -> Meta {
    let mut f = Meta::new();
    f.insert("document_id".to_string(), doc_id.to_string());
    f
}

/// Index with scripted nearest-neighbor answers, for pinning semantic
/// similarities exactly.
struct CannedIndex {
    chunks: Vec<Chunk>,
    // (chunk position, distance) returned by nearest, already ordered
    neighbors: Vec<(usize, f32)>,
}

impl EmbeddingIndex for CannedIndex {
    fn index(&self, _chunks: &[Chunk], _embeddings: &[Vec<f32>]) -> anyhow::Result<()> {
        Ok(())
    }

    fn nearest(
        &self,
        _query_vec: &[f32],
        k: usize,
        filter: Option<&Meta>,
    ) -> anyhow::Result<Vec<Neighbor>> {
        Ok(self
            .neighbors
            .iter()
            .map(|&(pos, distance)| Neighbor { chunk: self.chunks[pos].clone(), distance })
            .filter(|n| filter.map_or(true, |f| n.chunk.matches(f)))
            .take(k)
            .collect())
    }

    fn get_all(&self, filter: Option<&Meta>) -> anyhow::Result<Vec<Chunk>> {
        Ok(self
            .chunks
            .iter()
            .filter(|c| filter.map_or(true, |f| c.matches(f)))
            .cloned()
            .collect())
    }
}

/// Index whose reads always fail, standing in for an unreachable store.
struct FailingIndex;

impl EmbeddingIndex for FailingIndex {
    fn index(&self, _chunks: &[Chunk], _embeddings: &[Vec<f32>]) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("store unreachable"))
    }

    fn nearest(
        &self,
        _query_vec: &[f32],
        _k: usize,
        _filter: Option<&Meta>,
    ) -> anyhow::Result<Vec<Neighbor>> {
        Err(anyhow::anyhow!("store unreachable"))
    }

    fn get_all(&self, _filter: Option<&Meta>) -> anyhow::Result<Vec<Chunk>> {
        Err(anyhow::anyhow!("store unreachable"))
    }
}

fn helpdesk_retriever() -> HybridRetriever<MemoryIndex> {
    let embedder = HashEmbedder::new(64);
    let chunks = vec![
        chunk("a_0", "a", "vacation policy is 15 days per year"),
        chunk("b_0", "b", "expense report forms must be filed monthly"),
        chunk("c_0", "c", "the cafeteria closes at three"),
    ];
    let vectors: Vec<Vec<f32>> = chunks
        .iter()
        .map(|c| embedder.embed(&c.content).expect("embed"))
        .collect();
    let index = MemoryIndex::new();
    index.index(&chunks, &vectors).expect("index");
    HybridRetriever::new(index, Box::new(HashEmbedder::new(64)))
}

#[test]
fn empty_corpus_returns_empty_not_error() {
    let retriever =
        HybridRetriever::new(MemoryIndex::new(), Box::new(HashEmbedder::new(64)));
    let results = retriever
        .hybrid_search("anything at all", 5, None, DEFAULT_KEYWORD_WEIGHT)
        .expect("search");
    assert!(results.is_empty());
}

#[test]
fn result_length_is_min_of_top_k_and_corpus() {
    let retriever = helpdesk_retriever();
    let results = retriever
        .hybrid_search("policy", 10, None, DEFAULT_KEYWORD_WEIGHT)
        .expect("search");
    assert_eq!(results.len(), 3, "top_k beyond the corpus returns everything");

    let results = retriever
        .hybrid_search("policy", 1, None, DEFAULT_KEYWORD_WEIGHT)
        .expect("search");
    assert_eq!(results.len(), 1);
}

#[test]
fn identical_calls_give_identical_rankings() {
    let retriever = helpdesk_retriever();
    let first = retriever
        .hybrid_search("expense policy", 3, None, 0.4)
        .expect("search");
    let second = retriever
        .hybrid_search("expense policy", 3, None, 0.4)
        .expect("search");

    let ids = |rs: &[kbase_core::types::SearchResult]| {
        rs.iter().map(|r| r.id.clone()).collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&second));
    for (a, b) in first.iter().zip(second.iter()) {
        assert!((a.combined_score - b.combined_score).abs() < 1e-6);
    }
}

#[test]
fn filter_restricts_both_sub_searches() {
    let retriever = helpdesk_retriever();
    let filter = doc_filter("b");
    let results = retriever
        .hybrid_search("expense policy report", 10, Some(&filter), 0.5)
        .expect("search");
    assert!(!results.is_empty());
    assert!(results.iter().all(|r| r.doc_id == "b"));
}

#[test]
fn combined_scores_stay_in_unit_range() {
    let retriever = helpdesk_retriever();
    for weight in [0.0, 0.3, 0.5, 1.0] {
        let results = retriever
            .hybrid_search("expense policy vacation", 3, None, weight)
            .expect("search");
        for r in &results {
            assert!(
                (0.0..=1.0).contains(&r.combined_score),
                "combined {} out of range at weight {weight}",
                r.combined_score
            );
        }
    }
}

// The worked scenario: semantic similarities pinned at 0.9 (A) and 0.4 (B),
// query "expense policy" against contents giving keyword counts 1 (A) and
// 3 (B). At keyword_weight 0.5:
//   A: 0.5 * (0.9/0.9) + 0.5 * (1/3)  = 0.6667
//   B: 0.5 * (0.4/0.9) + 0.5 * (3/3)  = 0.7222  -> B outranks A
#[test]
fn blended_scores_follow_the_documented_formula() {
    let chunks = vec![
        chunk("a_0", "a", "vacation policy is 15 days"),
        chunk("b_0", "b", "expense expense policy forms"),
        chunk("c_0", "c", "completely unrelated text"),
    ];
    let index = CannedIndex {
        chunks,
        neighbors: vec![(0, 0.1), (1, 0.6)],
    };
    let retriever = HybridRetriever::new(index, Box::new(HashEmbedder::new(16)));

    let results = retriever
        .hybrid_search("expense policy", 2, None, 0.5)
        .expect("search");

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "b_0");
    assert_eq!(results[1].id, "a_0");
    let b = &results[0];
    let a = &results[1];
    assert!((b.combined_score - (0.5 * (0.4 / 0.9) + 0.5)).abs() < 1e-4);
    assert!((a.combined_score - (0.5 + 0.5 / 3.0)).abs() < 1e-4);
    assert!((a.semantic_score - 0.9).abs() < 1e-6);
    assert!((b.keyword_score - 3.0).abs() < 1e-6);
}

#[test]
fn backend_failure_propagates_as_backend_error() {
    let retriever = HybridRetriever::new(FailingIndex, Box::new(HashEmbedder::new(16)));
    let err = retriever
        .hybrid_search("expense policy", 3, None, DEFAULT_KEYWORD_WEIGHT)
        .expect_err("must fail");
    assert!(matches!(err, Error::Backend(_)));
}

#[test]
fn invalid_query_is_rejected_before_any_backend_call() {
    let retriever = HybridRetriever::new(FailingIndex, Box::new(HashEmbedder::new(16)));
    let err = retriever
        .hybrid_search("   ", 3, None, DEFAULT_KEYWORD_WEIGHT)
        .expect_err("must fail");
    assert!(
        matches!(err, Error::InvalidQuery(_)),
        "validation precedes the backend, so the failing store is never hit"
    );
}

#[test]
fn top_k_zero_returns_empty() {
    let retriever = helpdesk_retriever();
    let results = retriever
        .hybrid_search("policy", 0, None, DEFAULT_KEYWORD_WEIGHT)
        .expect("search");
    assert!(results.is_empty());
}

#[test]
fn retrieve_rerank_assemble_pipeline() {
    let retriever = helpdesk_retriever();
    let results = retriever
        .hybrid_search("expense report policy", 3, None, 0.5)
        .expect("search");
    let ranked = rerank("expense report policy", results);
    let assembled = assemble(&ranked);

    assert!(!assembled.is_empty());
    assert!(assembled.confidence > 0.0);
    assert_eq!(
        assembled.citations.len(),
        ranked
            .iter()
            .map(|r| r.doc_id.clone())
            .collect::<std::collections::HashSet<_>>()
            .len()
    );
    assert!(assembled.context.contains("[Source 1 -"));
}

#[test]
fn semantic_search_alone_orders_by_similarity() {
    let retriever = helpdesk_retriever();
    let results = retriever
        .semantic_search("vacation policy is 15 days per year", 3, None)
        .expect("search");
    assert!(!results.is_empty());
    assert_eq!(results[0].id, "a_0", "verbatim text is the nearest neighbor");
    for pair in results.windows(2) {
        assert!(pair[0].combined_score >= pair[1].combined_score);
    }
    for r in &results {
        assert!((r.combined_score - r.semantic_score).abs() < 1e-6);
        assert_eq!(r.keyword_score, 0.0);
    }
}
