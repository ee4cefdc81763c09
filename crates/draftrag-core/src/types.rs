//! Domain types shared by the retrievers, the fusion ranker and the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type ChunkId = String;

/// Default number of results when a request does not name `k`.
pub const DEFAULT_K: i64 = 5;

/// A unit of ingested content as read from the chunk store.
///
/// - `id`: unique within its project
/// - `owner_id`: `None` for legacy rows written before owners were tracked
/// - `path`: ordered heading trail of the section the chunk came from
/// - `embedding`: dense vector computed at ingestion time, if any
///
/// The retrieval engine never mutates chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    pub fn new(id: impl Into<String>, project_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            owner_id: None,
            text: text.into(),
            path: Vec::new(),
            embedding: None,
        }
    }

    #[must_use]
    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    #[must_use]
    pub fn with_path<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// The stored embedding, if present and non-empty.
    pub fn dense_vector(&self) -> Option<&[f32]> {
        self.embedding.as_deref().filter(|v| !v.is_empty())
    }
}

/// Project and owner boundary for a single request.
///
/// With an owner given, chunks owned by that owner and chunks with no
/// recorded owner are visible; chunks of other owners never are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub project_id: String,
    pub owner_id: Option<String>,
}

impl Scope {
    pub fn new(project_id: impl Into<String>, owner_id: Option<&str>) -> Self {
        Self { project_id: project_id.into(), owner_id: owner_id.map(str::to_string) }
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    pub fn admits(&self, chunk: &Chunk) -> bool {
        if chunk.project_id != self.project_id {
            return false;
        }
        match (&self.owner_id, &chunk.owner_id) {
            (None, _) | (Some(_), None) => true,
            (Some(wanted), Some(actual)) => wanted == actual,
        }
    }
}

/// Indicates which retriever produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Dense,
    Lexical,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Dense => write!(f, "dense"),
            SourceKind::Lexical => write!(f, "lexical"),
        }
    }
}

/// Raw, un-normalized score from one retriever. Higher is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub chunk_id: ChunkId,
    pub score: f64,
    pub source: SourceKind,
}

impl ScoredCandidate {
    pub fn dense(chunk_id: impl Into<String>, score: f64) -> Self {
        Self { chunk_id: chunk_id.into(), score, source: SourceKind::Dense }
    }

    pub fn lexical(chunk_id: impl Into<String>, score: f64) -> Self {
        Self { chunk_id: chunk_id.into(), score, source: SourceKind::Lexical }
    }
}

/// Logical retrieval request as received from the route layer.
///
/// `k` is signed so that zero and negative values reach validation
/// instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalRequest {
    pub project_id: String,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

impl RetrievalRequest {
    pub fn new(project_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self { project_id: project_id.into(), query: query.into(), k: None, owner_id: None }
    }

    #[must_use]
    pub fn with_k(mut self, k: i64) -> Self {
        self.k = Some(k);
        self
    }

    #[must_use]
    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub chunk_id: ChunkId,
    pub score: f64,
    pub sources: Vec<SourceKind>,
    pub snippet: String,
    #[serde(rename = "hierarchical_path")]
    pub path: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RetrievalResponse {
    pub results: Vec<RetrievalResult>,
    pub degraded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded_reason: Option<String>,
}
