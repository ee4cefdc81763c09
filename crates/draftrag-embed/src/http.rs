//! Remote embedding provider speaking the OpenAI-compatible
//! `POST {base_url}/embeddings` protocol.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use draftrag_core::config::EmbeddingConfig;
use draftrag_core::error::EmbeddingError;
use draftrag_core::traits::EmbeddingProvider;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingResponse {
    pub(crate) data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingDatum {
    pub(crate) embedding: Vec<f32>,
    #[serde(default)]
    pub(crate) index: Option<usize>,
}

pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    dim: usize,
    batch_size: usize,
    config_timeout: std::time::Duration,
    id: String,
}

impl HttpEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| EmbeddingError::Transport(e.to_string()))?;
        let api_key = config.api_key.clone().or_else(|| std::env::var("OPENAI_API_KEY").ok());
        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key,
            dim: config.dimension,
            batch_size: config.batch_size.max(1),
            config_timeout: config.timeout(),
            id: format!("http:{}:d{}", config.model, config.dimension),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut request = self.client.post(&self.endpoint).json(&EmbeddingRequest { model: &self.model, input: batch });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await.map_err(|e| self.map_transport(&e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Transport(format!("{status}: {}", truncate(&body, 200))));
        }
        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;
        order_vectors(parsed, batch.len(), self.dim)
    }

    fn map_transport(&self, err: &reqwest::Error) -> EmbeddingError {
        if err.is_timeout() {
            EmbeddingError::Timeout(self.config_timeout)
        } else {
            EmbeddingError::Transport(err.to_string())
        }
    }
}

/// Consecutive request batches of at most `batch_size` texts, in input order.
pub(crate) fn batches(texts: &[String], batch_size: usize) -> std::slice::Chunks<'_, String> {
    texts.chunks(batch_size.max(1))
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Put vectors back in input order and check count and dimension.
pub(crate) fn order_vectors(
    response: EmbeddingResponse,
    expected: usize,
    dim: usize,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let mut data = response.data;
    if data.len() != expected {
        return Err(EmbeddingError::InvalidResponse(format!(
            "expected {expected} vectors, got {}",
            data.len()
        )));
    }
    // Servers that omit `index` answer in input order.
    if data.iter().all(|d| d.index.is_some()) {
        data.sort_by_key(|d| d.index);
    }
    if data.iter().enumerate().any(|(i, d)| d.index.is_some_and(|idx| idx != i)) {
        return Err(EmbeddingError::InvalidResponse("response indices are not 0..n".to_string()));
    }
    data.into_iter()
        .map(|d| {
            if d.embedding.len() == dim {
                Ok(d.embedding)
            } else {
                Err(EmbeddingError::DimensionMismatch { expected: dim, actual: d.embedding.len() })
            }
        })
        .collect()
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    fn provider_id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in batches(texts, self.batch_size) {
            tracing::debug!(batch = batch.len(), endpoint = %self.endpoint, "requesting embeddings");
            out.extend(self.post_batch(batch).await?);
        }
        Ok(out)
    }
}
