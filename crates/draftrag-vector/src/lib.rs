//! draftrag-vector
//!
//! Dense retrieval: the cosine similarity primitive, an exhaustive scan
//! behind the `DenseScorer` trait, and the query embedding cache.

pub mod cache;
pub mod dense;
pub mod similarity;

pub use cache::{normalize_query, CacheKey, QueryEmbeddingCache};
pub use dense::ExhaustiveDenseScorer;
pub use similarity::{checked_cosine, cosine_similarity};
