use tracing::debug;

use super::traits::{Embedder, EmbeddingError};

/// Collects (index, text) pairs and flushes when the batch is full.
pub struct EmbeddingBatcher<'a> {
    buffer: Vec<(usize, String)>,
    batch_size: usize,
    embedder: &'a dyn Embedder,
}

impl<'a> EmbeddingBatcher<'a> {
    pub fn new(embedder: &'a dyn Embedder, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            buffer: Vec::with_capacity(batch_size),
            batch_size,
            embedder,
        }
    }

    /// Add a text to the batch. Returns embeddings if the batch is full (auto-flush).
    pub async fn add(
        &mut self,
        index: usize,
        text: String,
    ) -> Result<Option<Vec<(usize, Vec<f32>)>>, EmbeddingError> {
        self.buffer.push((index, text));
        if self.buffer.len() >= self.batch_size {
            Ok(Some(self.flush().await?))
        } else {
            Ok(None)
        }
    }

    /// Force-flush remaining items.
    pub async fn flush(&mut self) -> Result<Vec<(usize, Vec<f32>)>, EmbeddingError> {
        if self.buffer.is_empty() {
            return Ok(Vec::new());
        }
        let batch: Vec<(usize, String)> = self.buffer.drain(..).collect();
        let texts: Vec<&str> = batch.iter().map(|(_, t)| t.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != batch.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: batch.len(),
                actual: embeddings.len(),
            });
        }

        Ok(batch
            .into_iter()
            .zip(embeddings)
            .map(|((idx, _), emb)| (idx, emb))
            .collect())
    }

    /// Number of items currently buffered.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// Embed every text, in order, using batches of `batch_size`.
///
/// Fails if the backend returns the wrong number of vectors or any vector
/// whose length differs from `embedder.dimensions()`.
pub async fn embed_all(
    embedder: &dyn Embedder,
    texts: &[String],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let expected_dim = embedder.dimensions();
    let mut slots: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
    let mut batcher = EmbeddingBatcher::new(embedder, batch_size);

    let mut place = |done: Vec<(usize, Vec<f32>)>| -> Result<(), EmbeddingError> {
        for (idx, vector) in done {
            if vector.len() != expected_dim {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: expected_dim,
                    actual: vector.len(),
                });
            }
            slots[idx] = Some(vector);
        }
        Ok(())
    };

    for (idx, text) in texts.iter().enumerate() {
        if let Some(done) = batcher.add(idx, text.clone()).await? {
            place(done)?;
        }
    }
    place(batcher.flush().await?)?;

    debug!(texts = texts.len(), dims = expected_dim, "embedded all texts");
    let embedded: Vec<Vec<f32>> = slots.into_iter().flatten().collect();
    if embedded.len() != texts.len() {
        return Err(EmbeddingError::CountMismatch {
            expected: texts.len(),
            actual: embedded.len(),
        });
    }
    Ok(embedded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeEmbedder {
        call_count: AtomicUsize,
        dims: usize,
    }

    impl FakeEmbedder {
        fn new(dims: usize) -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                dims,
            }
        }
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| vec![t.len() as f32; self.dims]).collect())
        }

        fn dimensions(&self) -> usize {
            self.dims
        }
    }

    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            4
        }
    }

    #[tokio::test]
    async fn flush_on_batch_size() {
        let embedder = FakeEmbedder::new(4);
        let mut batcher = EmbeddingBatcher::new(&embedder, 3);

        assert!(batcher.add(0, "a".into()).await.unwrap().is_none());
        assert!(batcher.add(1, "b".into()).await.unwrap().is_none());
        assert_eq!(batcher.pending(), 2);

        let result = batcher.add(2, "c".into()).await.unwrap();
        let embeddings = result.expect("batch should flush when full");
        assert_eq!(embeddings.len(), 3);
        assert_eq!(batcher.pending(), 0);
        assert_eq!(embedder.call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn flush_empty_is_noop() {
        let embedder = FakeEmbedder::new(4);
        let mut batcher = EmbeddingBatcher::new(&embedder, 10);

        let result = batcher.flush().await.unwrap();
        assert!(result.is_empty());
        assert_eq!(embedder.call_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn embed_all_preserves_order_across_batches() {
        let embedder = FakeEmbedder::new(2);
        let texts: Vec<String> = ["a", "bb", "ccc", "dddd", "eeeee"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let out = embed_all(&embedder, &texts, 2).await.unwrap();
        assert_eq!(out.len(), 5);
        for (i, v) in out.iter().enumerate() {
            assert_eq!(v, &vec![(i + 1) as f32; 2]);
        }
        assert_eq!(embedder.call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn embed_all_rejects_wrong_dimensions() {
        let texts = vec!["x".to_string()];
        let err = embed_all(&ShortEmbedder, &texts, 8).await.unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DimensionMismatch { expected: 4, actual: 1 }
        ));
    }
}
