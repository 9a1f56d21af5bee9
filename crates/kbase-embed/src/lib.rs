//! Embedder implementations and provider selection.
//!
//! The shipped default is [`HashEmbedder`], a deterministic token-hash
//! projection: no model files, no network, identical vectors across runs.
//! Model-backed providers plug in behind [`embedder_by_name`] as additional
//! implementations of the core `Embedder` trait; choosing one is a
//! configuration change, never a branch inside retrieval code.

use anyhow::{anyhow, Result};
use std::hash::{Hash, Hasher};
use tracing::debug;
use twox_hash::XxHash64;

use kbase_core::config::Config;
use kbase_core::traits::Embedder;

pub const DEFAULT_DIM: usize = 384;

/// Deterministic embedder: each whitespace token is hashed into a bucket
/// with a hash-derived magnitude, positions contribute a small rotation,
/// and the vector is L2-normalized.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIM)
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        Ok(v)
    }
}

/// Build the embedder selected by configuration: `embedding.provider` and
/// `embedding.dim`.
pub fn embedder_from_config(config: &Config) -> Result<Box<dyn Embedder>> {
    let provider: String = config
        .get("embedding.provider")
        .unwrap_or_else(|_| "hash".to_string());
    let dim: usize = config.get("embedding.dim").unwrap_or(DEFAULT_DIM);
    embedder_by_name(&provider, dim)
}

/// Build the default embedder, honoring the `KBASE_EMBEDDER` env override.
pub fn default_embedder() -> Result<Box<dyn Embedder>> {
    let provider =
        std::env::var("KBASE_EMBEDDER").unwrap_or_else(|_| "hash".to_string());
    embedder_by_name(&provider, DEFAULT_DIM)
}

pub fn embedder_by_name(name: &str, dim: usize) -> Result<Box<dyn Embedder>> {
    debug!("embedder provider: {name} (dim {dim})");
    match name {
        "hash" => Ok(Box::new(HashEmbedder::new(dim))),
        other => Err(anyhow!("Unknown embedding provider '{other}'")),
    }
}
