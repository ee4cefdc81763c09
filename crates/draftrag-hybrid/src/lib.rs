//! draftrag-hybrid
//!
//! The retrieval engine: runs the lexical and dense retrievers over one
//! store snapshot, fuses their scores and degrades to lexical-only when no
//! query embedding is available.

pub mod engine;
pub mod fusion;

pub use engine::RetrievalEngine;
pub use fusion::{min_max_normalize, rank_order, snippet, FusedCandidate, FusionRanker, FusionWeights};
