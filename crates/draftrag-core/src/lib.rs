//! draftrag-core
//!
//! Domain types, error taxonomy, collaborator traits and configuration shared
//! by the retrieval crates. See `store` for the reference chunk stores.

pub mod config;
pub mod error;
pub mod store;
pub mod traits;
pub mod types;
pub mod validation;

pub use error::{EmbeddingError, ErrorKind, RetrievalError, StoreError};
pub use traits::{ChunkStore, DenseScorer, EmbeddingProvider, LexicalScorer};
pub use types::{
    Chunk, ChunkId, RetrievalRequest, RetrievalResponse, RetrievalResult, Scope, ScoredCandidate, SourceKind,
};
