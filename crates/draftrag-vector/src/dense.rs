use draftrag_core::traits::DenseScorer;
use draftrag_core::types::{Chunk, Scope, ScoredCandidate};

use crate::similarity::checked_cosine;

/// Exact scan over every eligible chunk, O(chunks x dimension).
#[derive(Debug, Clone, Copy, Default)]
pub struct ExhaustiveDenseScorer;

impl ExhaustiveDenseScorer {
    pub fn new() -> Self {
        Self
    }
}

impl DenseScorer for ExhaustiveDenseScorer {
    fn name(&self) -> &str {
        "exhaustive"
    }

    fn score(&self, chunks: &[Chunk], scope: &Scope, query_vec: &[f32]) -> Vec<ScoredCandidate> {
        let mut skipped = 0usize;
        let hits: Vec<ScoredCandidate> = chunks
            .iter()
            .filter(|chunk| scope.admits(chunk))
            .filter_map(|chunk| {
                let vector = chunk.dense_vector()?;
                if let Some(score) = checked_cosine(query_vec, vector) {
                    Some(ScoredCandidate::dense(chunk.id.clone(), score))
                } else {
                    skipped += 1;
                    tracing::debug!(
                        chunk_id = %chunk.id,
                        dims = vector.len(),
                        expected = query_vec.len(),
                        "chunk excluded from dense scoring"
                    );
                    None
                }
            })
            .collect();
        if skipped > 0 {
            tracing::debug!(skipped, scored = hits.len(), "dense scan finished with exclusions");
        }
        hits
    }
}
