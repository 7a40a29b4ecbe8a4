//! Embedding backend selection from `EmbeddingConfig`.

use std::sync::Arc;

use tracing::{info, warn};

use varscope_core::config::EmbeddingConfig;
use varscope_ingest::embedding::{
    CachedEmbedder, Embedder, EmbeddingError, HashingEmbedder, OllamaEmbedder, OpenAiEmbedder,
};

/// Build the configured embedder, wrapped in an LRU cache when
/// `cache_capacity > 0`.
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    let inner: Arc<dyn Embedder> = match config.provider.as_str() {
        "hashing" => {
            info!(dims = config.dimensions, "embedding provider ready: hashing");
            Arc::new(HashingEmbedder::new(config.dimensions))
        }
        "ollama" => {
            info!(
                url = %config.ollama_url,
                model = %config.ollama_model,
                dims = config.dimensions,
                "embedding provider ready: ollama"
            );
            Arc::new(OllamaEmbedder::new(
                config.ollama_url.clone(),
                config.ollama_model.clone(),
                config.dimensions,
            ))
        }
        "openai" => {
            let Some(api_key) = config.openai_api_key.clone() else {
                warn!("EMBEDDING_PROVIDER=openai but OPENAI_API_KEY is empty");
                return Err(EmbeddingError::Api("OPENAI_API_KEY is not set".into()));
            };
            info!(
                model = %config.openai_model,
                dims = config.dimensions,
                "embedding provider ready: openai"
            );
            Arc::new(OpenAiEmbedder::new(
                api_key,
                config.openai_model.clone(),
                config.openai_base_url.clone(),
                config.dimensions,
            ))
        }
        other => return Err(EmbeddingError::UnknownProvider(other.to_string())),
    };

    if config.cache_capacity == 0 {
        return Ok(inner);
    }
    Ok(Arc::new(CachedEmbedder::new(inner, config.cache_capacity)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: &str) -> EmbeddingConfig {
        EmbeddingConfig {
            provider: provider.to_string(),
            dimensions: 16,
            batch_size: 8,
            cache_capacity: 32,
            ollama_url: "http://localhost:11434".into(),
            ollama_model: "all-minilm".into(),
            openai_api_key: None,
            openai_model: "text-embedding-3-small".into(),
            openai_base_url: None,
        }
    }

    #[tokio::test]
    async fn hashing_backend_embeds_offline() {
        let embedder = build_embedder(&config("hashing")).unwrap();
        assert_eq!(embedder.dimensions(), 16);
        let out = embedder.embed_batch(&["A B", "A B"]).await.unwrap();
        assert_eq!(out[0], out[1]);
    }

    #[test]
    fn unknown_provider_is_an_error() {
        assert!(matches!(
            build_embedder(&config("word2vec")),
            Err(EmbeddingError::UnknownProvider(p)) if p == "word2vec"
        ));
    }

    #[test]
    fn openai_requires_key() {
        assert!(build_embedder(&config("openai")).is_err());
    }
}
