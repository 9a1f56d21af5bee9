//! Domain types shared by the embedding, index, and retrieval engines.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type ChunkId = String;
pub type Meta = HashMap<String, String>;

/// A chunk of a source document that is independently indexed.
///
/// - `id`: globally unique chunk identifier, `{doc_id}_{chunk_index}`
/// - `doc_id`: content-addressed document identity (digest of filename +
///   leading text, stable across re-ingestion of identical content)
/// - `source`: origin path or filename of the parent document
/// - `content`: the text payload of the chunk, non-empty
/// - `chunk_index`: position within the parent document
/// - `metadata`: additional free-form keys (e.g. `indexed_at`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub doc_id: String,
    pub source: String,
    pub content: String,
    pub chunk_index: usize,
    #[serde(default)]
    pub metadata: Meta,
}

impl Chunk {
    /// Exact-match metadata filter. The keys `document_id`, `source` and
    /// `chunk_index` resolve to the typed fields; any other key resolves to
    /// the `metadata` map. Every entry of the filter must match.
    pub fn matches(&self, filter: &Meta) -> bool {
        filter.iter().all(|(key, value)| match key.as_str() {
            "document_id" => self.doc_id == *value,
            "source" => self.source == *value,
            "chunk_index" => self.chunk_index.to_string() == *value,
            _ => self.metadata.get(key) == Some(value),
        })
    }
}

/// A chunk returned from nearest-neighbor search together with its cosine
/// distance. Lower is closer; similarity is `1.0 - distance`.
#[derive(Debug, Clone)]
pub struct Neighbor {
    pub chunk: Chunk,
    pub distance: f32,
}

/// A scored reference to a chunk, created fresh for every retrieval call.
///
/// `semantic_score` is nearest-neighbor similarity (nominally [0,1]),
/// `keyword_score` is a raw term-frequency count (unbounded, corpus
/// dependent), and `combined_score` is the blended, normalized score in
/// [0,1] that ranking uses. Results are never mutated after the final sort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: ChunkId,
    pub doc_id: String,
    pub source: String,
    pub content: String,
    pub chunk_index: usize,
    pub metadata: Meta,
    pub semantic_score: f32,
    pub keyword_score: f32,
    pub combined_score: f32,
}

impl SearchResult {
    /// Carry a chunk into a result with all scores at zero.
    pub fn from_chunk(chunk: Chunk) -> Self {
        Self {
            id: chunk.id,
            doc_id: chunk.doc_id,
            source: chunk.source,
            content: chunk.content,
            chunk_index: chunk.chunk_index,
            metadata: chunk.metadata,
            semantic_score: 0.0,
            keyword_score: 0.0,
            combined_score: 0.0,
        }
    }
}
