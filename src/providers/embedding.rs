use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OrchestrationError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    pub model: String,
    pub prompt: String,
}

impl EmbeddingRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
        }
    }
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, request: EmbeddingRequest) -> Result<Vec<f32>>;

    async fn embed_batch(&self, model: &str, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(EmbeddingRequest::new(model, text.clone())).await?);
        }
        Ok(embeddings)
    }
}

/// Cosine similarity in `[-1, 1]`. Zero-magnitude vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, OrchestrationError> {
    if a.len() != b.len() {
        return Err(OrchestrationError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot_product / (magnitude_a * magnitude_b)).clamp(-1.0, 1.0))
}

/// Deterministic embedder: character codes folded into a normalized vector.
pub struct MockEmbeddingProvider {
    dimensions: usize,
}

impl MockEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, request: EmbeddingRequest) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0; self.dimensions.max(1)];
        let len = embedding.len();
        for (i, c) in request.prompt.chars().enumerate() {
            embedding[i % len] += (c as u32 as f32) / 1000.0;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut embedding {
                *x /= norm;
            }
        }
        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical_vectors() {
        let a = vec![1.0, 2.0, 3.0];
        let result = cosine_similarity(&a, &a).unwrap();
        assert!((result - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal_vectors() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).unwrap().abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_opposite_vectors() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![-1.0, -2.0, -3.0];
        let result = cosine_similarity(&a, &b).unwrap();
        assert!((result + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_dimension_mismatch() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0, 2.0, 3.0];
        let err = cosine_similarity(&a, &b).unwrap_err();
        assert!(matches!(
            err,
            OrchestrationError::DimensionMismatch { left: 2, right: 3 }
        ));
    }

    #[tokio::test]
    async fn test_mock_embeddings_are_deterministic() {
        let provider = MockEmbeddingProvider::new(16);
        let a = provider
            .embed(EmbeddingRequest::new("nomic-embed-text", "blood pressure"))
            .await
            .unwrap();
        let b = provider
            .embed(EmbeddingRequest::new("nomic-embed-text", "blood pressure"))
            .await
            .unwrap();

        assert_eq!(a.len(), 16);
        assert!((cosine_similarity(&a, &b).unwrap() - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_embed_batch_default() {
        let provider = MockEmbeddingProvider::new(8);
        let texts = vec!["walk".to_string(), "sleep".to_string()];
        let embeddings = provider.embed_batch("nomic-embed-text", &texts).await.unwrap();
        assert_eq!(embeddings.len(), 2);
    }
}
