use crate::types::{Chunk, Meta, Neighbor};

/// Converts text into fixed-length, L2-normalized vectors. All vectors from
/// one embedder share the same dimension, and the corpus inherits it.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// The backing store for indexed chunks and their vectors. Supports
/// nearest-neighbor lookup and full (filtered) enumeration; the keyword
/// path of retrieval is built on `get_all`.
pub trait EmbeddingIndex: Send + Sync {
    /// Upsert chunks with their embedding vectors, parallel by position.
    fn index(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> anyhow::Result<()>;

    /// The `k` chunks closest to `query_vec`, ascending by cosine distance,
    /// restricted to chunks matching `filter` when one is given.
    fn nearest(
        &self,
        query_vec: &[f32],
        k: usize,
        filter: Option<&Meta>,
    ) -> anyhow::Result<Vec<Neighbor>>;

    /// Every indexed chunk matching `filter`, in insertion order.
    fn get_all(&self, filter: Option<&Meta>) -> anyhow::Result<Vec<Chunk>>;
}
