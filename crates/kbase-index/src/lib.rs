//! In-memory embedding index: the reference `EmbeddingIndex` collaborator.
//!
//! Stores chunks with their vectors in first-insertion order, answers
//! nearest-neighbor queries by full cosine scan, and enforces the one
//! corpus / one embedding dimension invariant at insert time. A JSON
//! snapshot (`save`/`load`) carries a corpus between processes; anything
//! beyond that is the concern of a real vector database behind the same
//! trait.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info};

use kbase_core::error::Error;
use kbase_core::traits::EmbeddingIndex;
use kbase_core::types::{Chunk, ChunkId, Meta, Neighbor};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    chunk: Chunk,
    vector: Vec<f32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Inner {
    entries: Vec<Entry>,
    dim: Option<usize>,
    #[serde(skip)]
    by_id: HashMap<ChunkId, usize>,
}

impl Inner {
    fn rebuild_id_map(&mut self) {
        self.by_id = self
            .entries
            .iter()
            .enumerate()
            .map(|(pos, e)| (e.chunk.id.clone(), pos))
            .collect();
    }
}

/// Corpus statistics, surfaced by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_chunks: usize,
    pub total_documents: usize,
    pub dim: Option<usize>,
}

#[derive(Default)]
pub struct MemoryIndex {
    inner: RwLock<Inner>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a previously saved snapshot.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("reading index snapshot {}", path.display()))?;
        let mut inner: Inner = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing index snapshot {}", path.display()))?;
        inner.rebuild_id_map();
        info!("loaded {} chunks from {}", inner.entries.len(), path.display());
        Ok(Self { inner: RwLock::new(inner) })
    }

    /// Write the corpus to a JSON snapshot.
    pub fn save(&self, path: &Path) -> Result<()> {
        let inner = self.read()?;
        let bytes = serde_json::to_vec(&*inner)?;
        fs::write(path, bytes)
            .with_context(|| format!("writing index snapshot {}", path.display()))?;
        info!("saved {} chunks to {}", inner.entries.len(), path.display());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.read().map(|g| g.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> Result<IndexStats> {
        let inner = self.read()?;
        let mut docs = std::collections::HashSet::new();
        for e in &inner.entries {
            docs.insert(e.chunk.doc_id.as_str());
        }
        Ok(IndexStats {
            total_chunks: inner.entries.len(),
            total_documents: docs.len(),
            dim: inner.dim,
        })
    }

    /// Remove every chunk belonging to `doc_id`. Returns how many were
    /// removed.
    pub fn delete_document(&self, doc_id: &str) -> Result<usize> {
        let mut inner = self.write()?;
        let before = inner.entries.len();
        inner.entries.retain(|e| e.chunk.doc_id != doc_id);
        let removed = before - inner.entries.len();
        if removed > 0 {
            inner.rebuild_id_map();
            if inner.entries.is_empty() {
                inner.dim = None;
            }
        }
        debug!("deleted {removed} chunks of document {doc_id}");
        Ok(removed)
    }

    /// Drop the whole corpus, including the locked-in dimension.
    pub fn clear(&self) -> Result<()> {
        let mut inner = self.write()?;
        inner.entries.clear();
        inner.by_id.clear();
        inner.dim = None;
        Ok(())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(|_| anyhow!("index lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(|_| anyhow!("index lock poisoned"))
    }
}

impl EmbeddingIndex for MemoryIndex {
    fn index(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
        anyhow::ensure!(
            chunks.len() == embeddings.len(),
            "chunk/embedding count mismatch: {} vs {}",
            chunks.len(),
            embeddings.len()
        );
        let mut inner = self.write()?;
        for (chunk, vector) in chunks.iter().zip(embeddings.iter()) {
            let expected = *inner.dim.get_or_insert(vector.len());
            if vector.len() != expected {
                return Err(Error::DimensionMismatch { expected, actual: vector.len() }.into());
            }
            let entry = Entry { chunk: chunk.clone(), vector: vector.clone() };
            let existing = inner.by_id.get(&chunk.id).copied();
            if let Some(pos) = existing {
                inner.entries[pos] = entry;
            } else {
                let pos = inner.entries.len();
                inner.entries.push(entry);
                inner.by_id.insert(chunk.id.clone(), pos);
            }
        }
        Ok(())
    }

    fn nearest(
        &self,
        query_vec: &[f32],
        k: usize,
        filter: Option<&Meta>,
    ) -> Result<Vec<Neighbor>> {
        let inner = self.read()?;
        if let Some(expected) = inner.dim {
            if query_vec.len() != expected {
                return Err(
                    Error::DimensionMismatch { expected, actual: query_vec.len() }.into(),
                );
            }
        }
        let mut neighbors: Vec<Neighbor> = inner
            .entries
            .iter()
            .filter(|e| filter.map_or(true, |f| e.chunk.matches(f)))
            .map(|e| Neighbor {
                chunk: e.chunk.clone(),
                distance: 1.0 - cosine_similarity(query_vec, &e.vector),
            })
            .collect();
        neighbors.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        neighbors.truncate(k);
        Ok(neighbors)
    }

    fn get_all(&self, filter: Option<&Meta>) -> Result<Vec<Chunk>> {
        let inner = self.read()?;
        Ok(inner
            .entries
            .iter()
            .filter(|e| filter.map_or(true, |f| e.chunk.matches(f)))
            .map(|e| e.chunk.clone())
            .collect())
    }
}

/// Cosine similarity, clamped to [-1, 1]. Zero vectors score 0.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}
