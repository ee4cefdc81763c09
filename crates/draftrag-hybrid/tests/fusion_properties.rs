use std::collections::HashSet;

use draftrag_core::types::ScoredCandidate;
use draftrag_hybrid::{min_max_normalize, rank_order, FusionRanker, FusionWeights};
use proptest::prelude::*;

fn candidates(dense: bool) -> impl Strategy<Value = Vec<ScoredCandidate>> {
    prop::collection::vec((0u8..30, -1.0f64..10.0), 0..40).prop_map(move |raw| {
        raw.into_iter()
            .map(|(id, score)| {
                let id = format!("c{id:02}");
                if dense { ScoredCandidate::dense(id, score) } else { ScoredCandidate::lexical(id, score) }
            })
            .collect()
    })
}

fn weights() -> impl Strategy<Value = FusionWeights> {
    (0.0f64..1.0, 0.0f64..1.0).prop_map(|(dense, lexical)| FusionWeights { dense, lexical })
}

proptest! {
    #[test]
    fn fused_list_is_bounded_distinct_and_sorted(
        dense in candidates(true),
        lexical in candidates(false),
        weights in weights(),
        k in 1usize..50,
    ) {
        let fused = FusionRanker::new(weights).fuse(&dense, &lexical, k);
        prop_assert!(fused.len() <= k);

        let distinct: HashSet<&str> = fused.iter().map(|c| c.chunk_id.as_str()).collect();
        prop_assert_eq!(distinct.len(), fused.len());

        for pair in fused.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
            prop_assert_eq!(rank_order(&pair[0], &pair[1]), std::cmp::Ordering::Less);
        }
    }

    #[test]
    fn fusion_is_deterministic(dense in candidates(true), lexical in candidates(false), k in 1usize..50) {
        let ranker = FusionRanker::default();
        prop_assert_eq!(ranker.fuse(&dense, &lexical, k), ranker.fuse(&dense, &lexical, k));
    }

    #[test]
    fn normalized_scores_stay_in_unit_interval(scores in prop::collection::vec(-100.0f64..100.0, 0..40)) {
        let normalized = min_max_normalize(&scores);
        prop_assert_eq!(normalized.len(), scores.len());
        prop_assert!(normalized.iter().all(|s| (0.0..=1.0).contains(s)));
    }
}
