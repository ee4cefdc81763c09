//! draftrag-embed
//!
//! Embedding providers: an HTTP client for OpenAI-compatible endpoints and a
//! deterministic hashing embedder for tests and offline use.

pub mod hash;
pub mod http;

use std::sync::Arc;

use draftrag_core::config::{EmbeddingBackend, EmbeddingConfig};
use draftrag_core::error::EmbeddingError;
use draftrag_core::traits::EmbeddingProvider;

pub use hash::HashEmbeddingProvider;
pub use http::HttpEmbeddingProvider;

/// Build the provider selected by `config.backend`. `Ok(None)` when
/// embeddings are disabled; retrieval then runs lexical-only.
pub fn build_provider(config: &EmbeddingConfig) -> Result<Option<Arc<dyn EmbeddingProvider>>, EmbeddingError> {
    let provider: Arc<dyn EmbeddingProvider> = match config.backend {
        EmbeddingBackend::Disabled => return Ok(None),
        EmbeddingBackend::Hash => Arc::new(HashEmbeddingProvider::new(config.dimension)),
        EmbeddingBackend::Http => Arc::new(HttpEmbeddingProvider::new(config)?),
    };
    tracing::info!(provider = provider.provider_id(), dim = provider.dim(), "embedding provider ready");
    Ok(Some(provider))
}
