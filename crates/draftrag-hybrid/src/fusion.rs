//! Weighted score fusion of the dense and lexical candidate lists.
//!
//! Each side is min-max normalized on its own, then combined as
//! `w_dense * dense + w_lexical * lexical` with a missing side counting 0.
//! Ordering is total: fused score desc, raw dense similarity desc (chunks
//! without one last), chunk id asc.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use draftrag_core::config::FusionConfig;
use draftrag_core::types::{ChunkId, ScoredCandidate, SourceKind};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub dense: f64,
    pub lexical: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        FusionConfig::default().into()
    }
}

impl From<FusionConfig> for FusionWeights {
    fn from(config: FusionConfig) -> Self {
        Self { dense: config.dense_weight, lexical: config.lexical_weight }
    }
}

/// A chunk after fusion, before result assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedCandidate {
    pub chunk_id: ChunkId,
    pub score: f64,
    pub dense_raw: Option<f64>,
    pub lexical_raw: Option<f64>,
}

impl FusedCandidate {
    pub fn sources(&self) -> Vec<SourceKind> {
        let mut sources = Vec::with_capacity(2);
        if self.dense_raw.is_some() {
            sources.push(SourceKind::Dense);
        }
        if self.lexical_raw.is_some() {
            sources.push(SourceKind::Lexical);
        }
        sources
    }
}

/// Scale `scores` into `[0, 1]`. With fewer than two values, or when all
/// values are equal, every value maps to 1.0.
pub fn min_max_normalize(scores: &[f64]) -> Vec<f64> {
    let (min, max) = scores
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| (lo.min(s), hi.max(s)));
    let range = max - min;
    if scores.len() < 2 || !range.is_finite() || range <= 0.0 {
        return vec![1.0; scores.len()];
    }
    scores.iter().map(|s| (s - min) / range).collect()
}

/// First entry per chunk id, non-finite scores dropped.
fn dedupe(candidates: &[ScoredCandidate]) -> Vec<(&str, f64)> {
    let mut seen = HashSet::with_capacity(candidates.len());
    candidates
        .iter()
        .filter(|c| c.score.is_finite())
        .filter(|c| seen.insert(c.chunk_id.as_str()))
        .map(|c| (c.chunk_id.as_str(), c.score))
        .collect()
}

pub fn rank_order(a: &FusedCandidate, b: &FusedCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| match (a.dense_raw, b.dense_raw) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.chunk_id.cmp(&b.chunk_id))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FusionRanker {
    weights: FusionWeights,
}

impl FusionRanker {
    pub fn new(weights: FusionWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> FusionWeights {
        self.weights
    }

    /// Merge both lists into at most `k` distinct, ranked candidates.
    pub fn fuse(&self, dense: &[ScoredCandidate], lexical: &[ScoredCandidate], k: usize) -> Vec<FusedCandidate> {
        let dense = dedupe(dense);
        let lexical = dedupe(lexical);
        let dense_norm = min_max_normalize(&dense.iter().map(|(_, s)| *s).collect::<Vec<_>>());
        let lexical_norm = min_max_normalize(&lexical.iter().map(|(_, s)| *s).collect::<Vec<_>>());

        let mut merged: BTreeMap<&str, FusedCandidate> = BTreeMap::new();
        for ((id, raw), norm) in dense.iter().zip(&dense_norm) {
            let entry = merged.entry(*id).or_insert_with(|| empty_candidate(id));
            entry.dense_raw = Some(*raw);
            entry.score += self.weights.dense * norm;
        }
        for ((id, raw), norm) in lexical.iter().zip(&lexical_norm) {
            let entry = merged.entry(*id).or_insert_with(|| empty_candidate(id));
            entry.lexical_raw = Some(*raw);
            entry.score += self.weights.lexical * norm;
        }

        let mut fused: Vec<FusedCandidate> = merged.into_values().collect();
        fused.sort_by(rank_order);
        fused.truncate(k);
        fused
    }
}

fn empty_candidate(id: &str) -> FusedCandidate {
    FusedCandidate { chunk_id: id.to_string(), score: 0.0, dense_raw: None, lexical_raw: None }
}

/// Leading `max_chars` characters of `text`, cut back to a word boundary,
/// with an ellipsis when anything was dropped.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut head: String = text.chars().take(max_chars).collect();
    if let Some(pos) = head.rfind(char::is_whitespace) {
        if pos > 0 {
            head.truncate(pos);
        }
    }
    let mut out = head.trim_end().to_string();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(fused: &[FusedCandidate]) -> Vec<&str> {
        fused.iter().map(|c| c.chunk_id.as_str()).collect()
    }

    #[test]
    fn normalizes_into_unit_interval() {
        assert_eq!(min_max_normalize(&[2.0, 4.0, 3.0]), vec![0.0, 1.0, 0.5]);
    }

    #[test]
    fn single_or_flat_lists_normalize_to_one() {
        assert!(min_max_normalize(&[]).is_empty());
        assert_eq!(min_max_normalize(&[0.2]), vec![1.0]);
        assert_eq!(min_max_normalize(&[-0.3]), vec![1.0]);
        assert_eq!(min_max_normalize(&[0.7, 0.7, 0.7]), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn normalization_is_independent_per_side() {
        let dense = vec![ScoredCandidate::dense("a", 0.9), ScoredCandidate::dense("b", 0.1)];
        let lexical = vec![ScoredCandidate::lexical("b", 50.0), ScoredCandidate::lexical("a", 10.0)];
        let ranker = FusionRanker::new(FusionWeights { dense: 0.5, lexical: 0.5 });
        let fused = ranker.fuse(&dense, &lexical, 10);
        assert!(fused.iter().all(|c| (c.score - 0.5).abs() < 1e-12));
        assert_eq!(ids(&fused), vec!["a", "b"], "equal fused scores fall back to raw dense similarity");
    }

    #[test]
    fn missing_side_contributes_zero() {
        let dense = vec![ScoredCandidate::dense("a", 0.9), ScoredCandidate::dense("c", 0.1)];
        let lexical = vec![ScoredCandidate::lexical("a", 2.0), ScoredCandidate::lexical("b", 2.0)];
        let fused = FusionRanker::default().fuse(&dense, &lexical, 10);
        assert_eq!(ids(&fused), vec!["a", "b", "c"]);
        assert!((fused[0].score - 1.0).abs() < 1e-12);
        assert!((fused[1].score - 0.35).abs() < 1e-12);
        assert!(fused[2].score.abs() < 1e-12);
        assert_eq!(fused[0].sources(), vec![SourceKind::Dense, SourceKind::Lexical]);
        assert_eq!(fused[1].sources(), vec![SourceKind::Lexical]);
        assert_eq!(fused[2].sources(), vec![SourceKind::Dense]);
    }

    #[test]
    fn ties_break_on_dense_then_id() {
        let lexical = vec![
            ScoredCandidate::lexical("z", 1.0),
            ScoredCandidate::lexical("m", 1.0),
            ScoredCandidate::lexical("a", 1.0),
        ];
        let fused = FusionRanker::new(FusionWeights { dense: 0.0, lexical: 1.0 }).fuse(
            &[ScoredCandidate::dense("z", 0.2)],
            &lexical,
            10,
        );
        assert_eq!(ids(&fused), vec!["z", "a", "m"]);
    }

    #[test]
    fn duplicate_ids_keep_first_entry() {
        let dense = vec![
            ScoredCandidate::dense("a", 0.2),
            ScoredCandidate::dense("a", 0.9),
            ScoredCandidate::dense("b", 0.5),
        ];
        let fused = FusionRanker::default().fuse(&dense, &[], 10);
        assert_eq!(ids(&fused), vec!["b", "a"]);
        assert_eq!(fused[1].dense_raw, Some(0.2));
    }

    #[test]
    fn non_finite_scores_are_dropped() {
        let dense = vec![ScoredCandidate::dense("nan", f64::NAN), ScoredCandidate::dense("ok", 0.4)];
        let fused = FusionRanker::default().fuse(&dense, &[], 10);
        assert_eq!(ids(&fused), vec!["ok"]);
    }

    #[test]
    fn truncates_to_k() {
        let lexical: Vec<_> = (0..10).map(|i| ScoredCandidate::lexical(format!("c{i}"), f64::from(i))).collect();
        let fused = FusionRanker::default().fuse(&[], &lexical, 3);
        assert_eq!(ids(&fused), vec!["c9", "c8", "c7"]);
    }

    #[test]
    fn snippet_cuts_on_word_boundary() {
        assert_eq!(snippet("  short text ", 40), "short text");
        assert_eq!(snippet("alpha beta gamma", 12), "alpha beta…");
        assert_eq!(snippet("unbroken", 4), "unbr…");
    }
}
