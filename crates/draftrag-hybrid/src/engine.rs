use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use draftrag_core::config::{EngineConfig, RetrievalConfig};
use draftrag_core::error::{EmbeddingError, RetrievalError};
use draftrag_core::traits::{ChunkStore, DenseScorer, EmbeddingProvider, LexicalScorer};
use draftrag_core::types::{Chunk, RetrievalRequest, RetrievalResponse, RetrievalResult, Scope, ScoredCandidate};
use draftrag_core::validation::validate_request;
use draftrag_text::LexicalRetriever;
use draftrag_vector::{normalize_query, CacheKey, ExhaustiveDenseScorer, QueryEmbeddingCache};

use crate::fusion::{snippet, FusedCandidate, FusionRanker};

/// Hybrid retrieval over one chunk store.
///
/// A request runs validation and the project access check, then two
/// independent branches over one store snapshot: lexical scoring, and the
/// query embedding followed by dense scoring. When the embedding cannot be
/// obtained the response is lexical-only and marked degraded. Store failures
/// are returned as errors.
pub struct RetrievalEngine {
    store: Arc<dyn ChunkStore>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    dense: Arc<dyn DenseScorer>,
    lexical: Arc<dyn LexicalScorer>,
    ranker: FusionRanker,
    cache: QueryEmbeddingCache,
    retrieval: RetrievalConfig,
    embed_timeout: Duration,
}

impl RetrievalEngine {
    pub fn new(
        store: Arc<dyn ChunkStore>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            dense: Arc::new(ExhaustiveDenseScorer::new()),
            lexical: Arc::new(LexicalRetriever::new(&config.lexical)),
            ranker: FusionRanker::new(config.fusion.into()),
            cache: QueryEmbeddingCache::new(config.embedding.cache_capacity),
            retrieval: config.retrieval.clone(),
            embed_timeout: config.embedding.timeout(),
        }
    }

    /// Engine with the provider selected by `config.embedding.backend`.
    pub fn from_config(store: Arc<dyn ChunkStore>, config: &EngineConfig) -> Result<Self, EmbeddingError> {
        let embedder = draftrag_embed::build_provider(&config.embedding)?;
        Ok(Self::new(store, embedder, config))
    }

    #[must_use]
    pub fn with_dense_scorer(mut self, scorer: Arc<dyn DenseScorer>) -> Self {
        self.dense = scorer;
        self
    }

    #[must_use]
    pub fn with_lexical_scorer(mut self, scorer: Arc<dyn LexicalScorer>) -> Self {
        self.lexical = scorer;
        self
    }

    pub fn cache(&self) -> &QueryEmbeddingCache {
        &self.cache
    }

    pub async fn retrieve(
        &self,
        project_id: &str,
        owner_id: Option<&str>,
        query: &str,
        k: i64,
    ) -> Result<RetrievalResponse, RetrievalError> {
        let mut request = RetrievalRequest::new(project_id, query).with_k(k);
        request.owner_id = owner_id.map(str::to_string);
        self.handle(&request).await
    }

    pub async fn handle(&self, request: &RetrievalRequest) -> Result<RetrievalResponse, RetrievalError> {
        self.retrieve_with_cancel(request, CancellationToken::new()).await
    }

    /// Like [`handle`](Self::handle); cancelling `cancel` abandons the
    /// embedding call and finishes lexical-only.
    #[tracing::instrument(skip_all, fields(project = %request.project_id))]
    pub async fn retrieve_with_cancel(
        &self,
        request: &RetrievalRequest,
        cancel: CancellationToken,
    ) -> Result<RetrievalResponse, RetrievalError> {
        let started = Instant::now();
        let validated = validate_request(request, &self.retrieval)?;
        let scope = validated.scope;

        if !self.store.project_accessible(&scope.project_id, scope.owner()).await? {
            return Err(RetrievalError::ProjectNotFound(scope.project_id));
        }

        let normalized = normalize_query(&validated.query);
        // One snapshot per request, loaded by whichever branch needs it first.
        let snapshot: OnceCell<Arc<Vec<Chunk>>> = OnceCell::new();
        let (store, scope_ref) = (&self.store, &scope);
        let load = move || async move {
            store.find_eligible_chunks(&scope_ref.project_id, scope_ref.owner()).await.map(Arc::new)
        };

        let lexical_branch = async {
            let chunks = snapshot.get_or_try_init(load).await?;
            let hits = self.score_lexical(chunks, &scope, &validated.query).await?;
            Ok::<_, RetrievalError>((Arc::clone(chunks), hits))
        };
        let dense_branch = async {
            match self.query_embedding(&scope.project_id, &normalized, &cancel).await {
                Ok(vector) => {
                    let chunks = snapshot.get_or_try_init(load).await?;
                    Ok::<_, RetrievalError>((self.score_dense(chunks, &scope, vector).await?, None))
                }
                Err(err) => {
                    tracing::warn!(error = %err, "query embedding unavailable; returning lexical results only");
                    Ok((Vec::new(), Some(err.to_string())))
                }
            }
        };
        let ((chunks, lexical_hits), (dense_hits, degraded_reason)) =
            tokio::try_join!(lexical_branch, dense_branch)?;

        let results = self.assemble(&chunks, &scope, dense_hits, lexical_hits, validated.k);
        tracing::info!(
            chunks = chunks.len(),
            results = results.len(),
            degraded = degraded_reason.is_some(),
            elapsed_ms = started.elapsed().as_millis(),
            "retrieval finished"
        );
        Ok(RetrievalResponse { results, degraded: degraded_reason.is_some(), degraded_reason })
    }

    async fn query_embedding(
        &self,
        project_id: &str,
        normalized: &str,
        cancel: &CancellationToken,
    ) -> Result<Arc<[f32]>, EmbeddingError> {
        let provider = self.embedder.as_ref().ok_or(EmbeddingError::Disabled)?;
        let key = CacheKey::new(provider.provider_id(), project_id, normalized);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!("query embedding served from cache");
            return Ok(hit);
        }

        let vector = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(EmbeddingError::Cancelled),
            result = tokio::time::timeout(self.embed_timeout, provider.embed(normalized)) => match result {
                Ok(embedded) => embedded?,
                Err(_) => return Err(EmbeddingError::Timeout(self.embed_timeout)),
            },
        };
        if vector.len() != provider.dim() {
            return Err(EmbeddingError::DimensionMismatch { expected: provider.dim(), actual: vector.len() });
        }

        let vector: Arc<[f32]> = Arc::from(vector);
        self.cache.insert(key, Arc::clone(&vector));
        Ok(vector)
    }

    async fn score_lexical(
        &self,
        chunks: &Arc<Vec<Chunk>>,
        scope: &Scope,
        query: &str,
    ) -> Result<Vec<ScoredCandidate>, RetrievalError> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }
        let scorer = Arc::clone(&self.lexical);
        let (snapshot, scope, query) = (Arc::clone(chunks), scope.clone(), query.to_string());
        let hits = tokio::task::spawn_blocking(move || scorer.score(&snapshot, &scope, &query))
            .await
            .map_err(RetrievalError::internal)?;
        tracing::debug!(scorer = self.lexical.name(), hits = hits.len(), "lexical scoring done");
        Ok(hits)
    }

    async fn score_dense(
        &self,
        chunks: &Arc<Vec<Chunk>>,
        scope: &Scope,
        query_vec: Arc<[f32]>,
    ) -> Result<Vec<ScoredCandidate>, RetrievalError> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }
        let scorer = Arc::clone(&self.dense);
        let (snapshot, scope) = (Arc::clone(chunks), scope.clone());
        let hits = tokio::task::spawn_blocking(move || scorer.score(&snapshot, &scope, &query_vec))
            .await
            .map_err(RetrievalError::internal)?;
        tracing::debug!(scorer = self.dense.name(), hits = hits.len(), "dense scoring done");
        Ok(hits)
    }

    fn assemble(
        &self,
        chunks: &[Chunk],
        scope: &Scope,
        mut dense: Vec<ScoredCandidate>,
        mut lexical: Vec<ScoredCandidate>,
        k: usize,
    ) -> Vec<RetrievalResult> {
        // Scorers may be swapped out, so only ids present in the scoped snapshot survive.
        let by_id: HashMap<&str, &Chunk> =
            chunks.iter().filter(|c| scope.admits(c)).map(|c| (c.id.as_str(), c)).collect();
        dense.retain(|c| by_id.contains_key(c.chunk_id.as_str()));
        lexical.retain(|c| by_id.contains_key(c.chunk_id.as_str()));

        self.ranker
            .fuse(&dense, &lexical, k)
            .into_iter()
            .filter_map(|fused| {
                let chunk = by_id.get(fused.chunk_id.as_str())?;
                Some(self.to_result(fused, chunk))
            })
            .collect()
    }

    fn to_result(&self, fused: FusedCandidate, chunk: &Chunk) -> RetrievalResult {
        RetrievalResult {
            sources: fused.sources(),
            chunk_id: fused.chunk_id,
            score: fused.score,
            snippet: snippet(&chunk.text, self.retrieval.snippet_chars),
            path: chunk.path.clone(),
        }
    }
}
