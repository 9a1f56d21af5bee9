//! Hybrid retrieval over an embedding index: semantic nearest-neighbor
//! search blended with keyword term-frequency search, a lightweight
//! term-overlap re-rank, and context assembly with a confidence estimate.
//!
//! The retriever is synchronous and stateless per call; it owns no corpus
//! of its own and reads everything through the `EmbeddingIndex` trait.
//! Backend failures propagate unchanged as `Error::Backend`: no retries,
//! no partial results.

pub mod context;
pub mod fusion;
pub mod keyword;
pub mod rerank;

use tracing::debug;

use kbase_core::error::{Error, Result};
use kbase_core::traits::{Embedder, EmbeddingIndex};
use kbase_core::types::{Chunk, Meta, SearchResult};

pub use context::{assemble, confidence, AssembledContext, Citation};
pub use rerank::rerank;

/// Default blend weight of the keyword column; semantic gets the rest.
pub const DEFAULT_KEYWORD_WEIGHT: f32 = 0.3;

pub struct HybridRetriever<I: EmbeddingIndex> {
    index: I,
    embedder: Box<dyn Embedder>,
}

impl<I: EmbeddingIndex> HybridRetriever<I> {
    pub fn new(index: I, embedder: Box<dyn Embedder>) -> Self {
        Self { index, embedder }
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    /// Hybrid search: semantic and keyword sub-searches over-fetched at
    /// `2 * top_k`, merged by chunk id, column-normalized, blended with
    /// `keyword_weight` in [0,1], stably sorted, truncated to `top_k`.
    ///
    /// An empty corpus or a query nothing matches yields an empty vec, not
    /// an error; `top_k` beyond the corpus size returns what exists.
    pub fn hybrid_search(
        &self,
        query: &str,
        top_k: usize,
        filter: Option<&Meta>,
        keyword_weight: f32,
    ) -> Result<Vec<SearchResult>> {
        let query = valid_query(query)?;
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let fetch = top_k * 2;

        let semantic = self.semantic_candidates(query, fetch, filter)?;
        let corpus = self.index.get_all(filter).map_err(Error::Backend)?;
        let keyword = keyword::keyword_scores(corpus, query, fetch);
        debug!(
            "query '{query}': {} semantic / {} keyword candidates",
            semantic.len(),
            keyword.len()
        );

        let mut results = fusion::fuse(semantic, keyword, keyword_weight);
        results.truncate(top_k);
        Ok(results)
    }

    /// Plain semantic search: nearest neighbors only, scores as similarity,
    /// no keyword blending (`combined_score` equals `semantic_score`).
    pub fn semantic_search(
        &self,
        query: &str,
        top_k: usize,
        filter: Option<&Meta>,
    ) -> Result<Vec<SearchResult>> {
        let query = valid_query(query)?;
        let candidates = self.semantic_candidates(query, top_k, filter)?;
        Ok(candidates
            .into_iter()
            .map(|(chunk, score)| {
                let mut result = SearchResult::from_chunk(chunk);
                result.semantic_score = score;
                result.combined_score = score;
                result
            })
            .collect())
    }

    fn semantic_candidates(
        &self,
        query: &str,
        k: usize,
        filter: Option<&Meta>,
    ) -> Result<Vec<(Chunk, f32)>> {
        let query_vec = self.embedder.embed(query).map_err(Error::Backend)?;
        let neighbors = self
            .index
            .nearest(&query_vec, k, filter)
            .map_err(Error::Backend)?;
        Ok(neighbors
            .into_iter()
            .map(|n| (n.chunk, 1.0 - n.distance))
            .collect())
    }
}

fn valid_query(query: &str) -> Result<&str> {
    if query.trim().is_empty() {
        return Err(Error::InvalidQuery(
            "query must not be empty or whitespace-only".to_string(),
        ));
    }
    Ok(query)
}
