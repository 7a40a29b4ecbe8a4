use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;

use super::traits::{Embedder, EmbeddingError};

/// Deterministic, dependency-free embedder based on signed feature hashing.
///
/// Each whitespace token and each adjacent token pair is hashed into one of
/// `dimensions` buckets with a hash-derived sign, then the vector is
/// L2-normalized. Texts sharing many tokens and transitions end up close in
/// cosine and Euclidean distance, which is enough to group variants offline
/// when no model server is reachable.
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    /// Embed a single text synchronously.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let tokens: Vec<&str> = text.split_whitespace().collect();

        for token in &tokens {
            self.accumulate(&mut vector, &("u", *token), 1.0);
        }
        for pair in tokens.windows(2) {
            self.accumulate(&mut vector, &("b", pair[0], pair[1]), 0.5);
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in vector.iter_mut() {
                *v /= norm;
            }
        }
        vector
    }

    fn accumulate<T: Hash>(&self, vector: &mut [f32], feature: &T, weight: f32) {
        let mut hasher = DefaultHasher::new();
        feature.hash(&mut hasher);
        let h = hasher.finish();
        let bucket = (h % self.dimensions as u64) as usize;
        let sign = if (h >> 63) & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
