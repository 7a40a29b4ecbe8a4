use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{Embedder, EmbeddingError};

/// Embedder backed by a local Ollama instance (`POST /api/embed`).
pub struct OllamaEmbedder {
    client: Client,
    url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedder {
    pub fn new(url: String, model: String, dimensions: usize) -> Self {
        Self {
            client: Client::new(),
            url: url.trim_end_matches('/').to_string(),
            model,
            dimensions,
        }
    }
}

#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        debug!(model = %self.model, batch = texts.len(), "ollama embed request");
        let request = OllamaEmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(format!("{}/api/embed", self.url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api(format!("{status}: {body}")));
        }

        let parsed: OllamaEmbedResponse = response.json().await?;
        if parsed.embeddings.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: parsed.embeddings.len(),
            });
        }
        if let Some(bad) = parsed.embeddings.iter().find(|e| e.len() != self.dimensions) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimensions,
                actual: bad.len(),
            });
        }

        Ok(parsed.embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
