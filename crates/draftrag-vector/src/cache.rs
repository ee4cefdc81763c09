//! In-process query embedding cache keyed by `(embedder_id, project_id, content_hash)`.
//!
//! The engine consults the cache before calling a provider and writes
//! through on misses. Entries are independent, so one mutex around the map
//! is enough; the oldest entry is evicted once `capacity` is reached.
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub embedder_id: String,
    pub project_id: String,
    pub content_hash: String,
}

impl CacheKey {
    pub fn new(embedder_id: &str, project_id: &str, normalized_query: &str) -> Self {
        Self {
            embedder_id: embedder_id.to_string(),
            project_id: project_id.to_string(),
            content_hash: blake3::hash(normalized_query.as_bytes()).to_hex().to_string(),
        }
    }
}

/// Trim, collapse inner whitespace and lower-case.
pub fn normalize_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, Arc<[f32]>>,
    order: VecDeque<CacheKey>,
}

pub struct QueryEmbeddingCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

impl QueryEmbeddingCache {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, state: Mutex::new(CacheState::default()) }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<[f32]>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).entries.get(key).cloned()
    }

    pub fn insert(&self, key: CacheKey, vector: Arc<[f32]>) {
        if self.capacity == 0 {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.entries.insert(key.clone(), vector).is_some() {
            return;
        }
        state.order.push_back(key);
        while state.entries.len() > self.capacity {
            match state.order.pop_front() {
                Some(oldest) => {
                    state.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }
}
