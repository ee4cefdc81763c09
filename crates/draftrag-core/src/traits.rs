use async_trait::async_trait;

use crate::error::{EmbeddingError, StoreError};
use crate::types::{Chunk, Scope, ScoredCandidate};

/// Upper bound on texts sent to a provider in one call.
pub const MAX_EMBED_BATCH: usize = 100;

/// Read-only access to persisted chunks.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Chunks of `project_id` visible to `owner_id`: owned by that owner or
    /// carrying no owner. Without an owner every chunk of the project.
    async fn find_eligible_chunks(
        &self,
        project_id: &str,
        owner_id: Option<&str>,
    ) -> Result<Vec<Chunk>, StoreError>;

    /// Whether the project exists and may be read by `owner_id`.
    async fn project_accessible(
        &self,
        project_id: &str,
        owner_id: Option<&str>,
    ) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `http:text-embedding-3-small:d1536`).
    fn provider_id(&self) -> &str;
    /// Embedding dimensionality.
    fn dim(&self) -> usize;
    /// Compute embeddings for a batch of input texts, in input order.
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_many(&[text.to_string()]).await?;
        match (vectors.pop(), vectors.is_empty()) {
            (Some(vector), true) => Ok(vector),
            _ => Err(EmbeddingError::InvalidResponse(
                "expected exactly one vector for a single text".to_string(),
            )),
        }
    }
}

/// Keyword scorer over a chunk snapshot. Returns only chunks with a
/// positive overlap, unsorted.
pub trait LexicalScorer: Send + Sync {
    fn name(&self) -> &str;
    fn score(&self, chunks: &[Chunk], scope: &Scope, query: &str) -> Vec<ScoredCandidate>;
}

/// Similarity scorer for a query vector. Implementations may scan the
/// snapshot or consult their own index; the output is unsorted.
pub trait DenseScorer: Send + Sync {
    fn name(&self) -> &str;
    fn score(&self, chunks: &[Chunk], scope: &Scope, query_vec: &[f32]) -> Vec<ScoredCandidate>;
}
