use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Backend returned {actual} vectors for {expected} texts")]
    CountMismatch { expected: usize, actual: usize },

    #[error("Unknown embedding provider: {0}")]
    UnknownProvider(String),
}

/// Trait for embedding backends (Ollama, OpenAI, local hashing).
///
/// Implementations must return the same vector for the same text within one
/// process.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, returning one vector per input text (in order).
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// The dimensionality of the output vectors.
    fn dimensions(&self) -> usize;
}
