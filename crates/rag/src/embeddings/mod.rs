//! Embedding engine.
//!
//! Wraps a provider with batching, output validation and L2 normalization so
//! that every stored and query vector has unit length.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};

use docqa_core::{AppError, AppResult};
use std::sync::Arc;

/// Tolerance for the unit-norm invariant.
pub const NORM_TOLERANCE: f32 = 1e-5;

/// Normalize a vector to unit L2 length in place.
pub fn normalize(vector: &mut [f32]) -> AppResult<()> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if !norm.is_finite() || norm == 0.0 {
        return Err(AppError::Embedding(
            "Cannot normalize a zero or non-finite vector".to_string(),
        ));
    }

    for v in vector.iter_mut() {
        *v /= norm;
    }
    Ok(())
}

/// Provider-agnostic embedder used on both the indexing and query paths.
#[derive(Debug, Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl Embedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, batch_size: usize) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Embed texts in batches and return unit-length vectors, one per text.
    pub async fn embed_texts(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Err(AppError::Embedding("Nothing to embed".to_string()));
        }

        tracing::info!(
            "Embedding {} texts using provider '{}' (model: {})",
            texts.len(),
            self.provider.provider_name(),
            self.provider.model_name()
        );

        let dimensions = self.provider.dimensions();
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let vectors = self.provider.embed_batch(batch).await?;
            if vectors.len() != batch.len() {
                return Err(AppError::Embedding(format!(
                    "Provider returned {} embeddings for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }

            for mut vector in vectors {
                if vector.len() != dimensions {
                    return Err(AppError::Embedding(format!(
                        "Unexpected embedding dimensions: got {}, expected {}",
                        vector.len(),
                        dimensions
                    )));
                }
                normalize(&mut vector)?;
                embeddings.push(vector);
            }
        }

        tracing::debug!(
            "Generated {} embeddings of dimension {}",
            embeddings.len(),
            dimensions
        );

        Ok(embeddings)
    }

    /// Embed a single query.
    pub async fn embed_query(&self, query: &str) -> AppResult<Vec<f32>> {
        self.embed_texts(&[query.to_string()])
            .await?
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramProvider;

    #[derive(Debug)]
    struct FixedProvider {
        vectors: Vec<Vec<f32>>,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for FixedProvider {
        fn provider_name(&self) -> &str {
            "fixed"
        }

        fn model_name(&self) -> &str {
            "fixed"
        }

        fn dimensions(&self) -> usize {
            2
        }

        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            Ok(self.vectors.iter().take(texts.len()).cloned().collect())
        }
    }

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[tokio::test]
    async fn test_embeddings_have_unit_norm() {
        let embedder = Embedder::new(Arc::new(TrigramProvider::new(384)), 2);
        let texts: Vec<String> = ["alpha beta", "gamma", "delta epsilon zeta", ""]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let embeddings = embedder.embed_texts(&texts).await.unwrap();
        assert_eq!(embeddings.len(), 4);
        for e in embeddings {
            assert!((norm(&e) - 1.0).abs() < NORM_TOLERANCE);
        }
    }

    #[tokio::test]
    async fn test_zero_vector_is_embedding_error() {
        let provider = FixedProvider {
            vectors: vec![vec![0.0, 0.0]],
        };
        let embedder = Embedder::new(Arc::new(provider), 8);

        let err = embedder.embed_query("x").await.unwrap_err();
        assert_eq!(err.kind(), "embedding");
    }

    #[tokio::test]
    async fn test_count_mismatch_is_embedding_error() {
        let provider = FixedProvider {
            vectors: vec![vec![1.0, 0.0]],
        };
        let embedder = Embedder::new(Arc::new(provider), 8);
        let texts = vec!["a".to_string(), "b".to_string()];

        assert!(matches!(
            embedder.embed_texts(&texts).await,
            Err(AppError::Embedding(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_batch_is_rejected() {
        let embedder = Embedder::new(Arc::new(TrigramProvider::new(8)), 8);
        assert!(embedder.embed_texts(&[]).await.is_err());
    }

    #[test]
    fn test_normalize() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v).unwrap();
        assert_eq!(v, vec![0.6, 0.8]);
    }
}
