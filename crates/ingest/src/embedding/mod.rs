pub mod batcher;
pub mod cache;
pub mod hashing;
pub mod ollama;
pub mod openai;
pub mod traits;

pub use batcher::{embed_all, EmbeddingBatcher};
pub use cache::{CachedEmbedder, EmbeddingCache};
pub use hashing::HashingEmbedder;
pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;
pub use traits::{Embedder, EmbeddingError};
