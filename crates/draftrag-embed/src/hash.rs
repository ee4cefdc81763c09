use async_trait::async_trait;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use draftrag_core::error::EmbeddingError;
use draftrag_core::traits::EmbeddingProvider;

/// Deterministic bag-of-tokens embedder for tests and offline development.
///
/// Each lower-cased alphanumeric token is hashed into one bucket; the
/// result is L2-normalized. Texts sharing tokens get positive similarity,
/// identical texts get identical vectors.
pub struct HashEmbeddingProvider {
    dim: usize,
    id: String,
}

impl HashEmbeddingProvider {
    pub fn new(dim: usize) -> Self {
        Self { dim, id: format!("hash:d{dim}") }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        if self.dim == 0 {
            return v;
        }
        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let token = token.to_lowercase();
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            #[allow(clippy::cast_possible_truncation)]
            let idx = (h % self.dim as u64) as usize;
            #[allow(clippy::cast_precision_loss)]
            let val = 0.5 + (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    fn provider_id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn vectors_are_normalized_and_deterministic() {
        let embedder = HashEmbeddingProvider::new(64);
        let a = embedder.embed_text("hello world");
        let b = embedder.embed_text("Hello,  WORLD!");
        assert_eq!(a.len(), 64);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() <= 1e-5, "norm={norm}");
        assert_eq!(a, b, "case and punctuation do not change the vector");
    }

    #[test]
    fn shared_tokens_raise_similarity() {
        let embedder = HashEmbeddingProvider::new(256);
        let query = embedder.embed_text("discount code");
        let close = embedder.embed_text("50% discount code today");
        let far = embedder.embed_text("quarterly weather outlook");
        assert!(cosine(&query, &close) > cosine(&query, &far));
    }

    #[test]
    fn empty_text_yields_zero_vector() {
        let embedder = HashEmbeddingProvider::new(8);
        assert!(embedder.embed_text("  ").iter().all(|x| *x == 0.0));
    }
}
