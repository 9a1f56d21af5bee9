use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Empty or whitespace-only query, rejected before any backend call.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A vector does not match the corpus embedding dimension.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The embedding index or embedder failed. Propagated unchanged, never
    /// retried here; the caller decides whether to degrade.
    #[error("Retrieval backend failure: {0}")]
    Backend(#[source] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
