use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::Mutex;
use tracing::debug;

use super::traits::{Embedder, EmbeddingError};

/// LRU cache mapping text hash to embedding vector.
pub struct EmbeddingCache {
    cache: LruCache<u64, Vec<f32>>,
    hits: u64,
    misses: u64,
}

impl EmbeddingCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            hits: 0,
            misses: 0,
        }
    }

    fn hash_text(text: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        hasher.finish()
    }

    /// Look up a cached embedding by text.
    pub fn get(&mut self, text: &str) -> Option<Vec<f32>> {
        let key = Self::hash_text(text);
        if let Some(vec) = self.cache.get(&key) {
            self.hits += 1;
            Some(vec.clone())
        } else {
            self.misses += 1;
            None
        }
    }

    /// Store an embedding for a text.
    pub fn put(&mut self, text: &str, embedding: Vec<f32>) {
        let key = Self::hash_text(text);
        self.cache.put(key, embedding);
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// Wraps an [`Embedder`] so repeated texts are embedded only once.
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    cache: Mutex<EmbeddingCache>,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn Embedder>, capacity: usize) -> Self {
        Self {
            inner,
            cache: Mutex::new(EmbeddingCache::new(capacity)),
        }
    }

    /// (hits, misses) so far.
    pub async fn stats(&self) -> (u64, u64) {
        let cache = self.cache.lock().await;
        (cache.hits(), cache.misses())
    }
}

#[async_trait]
impl Embedder for CachedEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut out: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut missing: Vec<usize> = Vec::new();
        {
            let mut cache = self.cache.lock().await;
            for (i, text) in texts.iter().enumerate() {
                let hit = cache.get(text);
                if hit.is_none() {
                    missing.push(i);
                }
                out.push(hit);
            }
        }

        if !missing.is_empty() {
            let miss_texts: Vec<&str> = missing.iter().map(|&i| texts[i]).collect();
            let fresh = self.inner.embed_batch(&miss_texts).await?;
            if fresh.len() != miss_texts.len() {
                return Err(EmbeddingError::CountMismatch {
                    expected: miss_texts.len(),
                    actual: fresh.len(),
                });
            }
            let mut cache = self.cache.lock().await;
            for (&i, vector) in missing.iter().zip(fresh) {
                cache.put(texts[i], vector.clone());
                out[i] = Some(vector);
            }
        }
        debug!(requested = texts.len(), embedded = missing.len(), "cached embed batch");

        // Every slot is filled: hits above, misses from `fresh`.
        Ok(out.into_iter().flatten().collect())
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}
