//! Reference `ChunkStore` implementations.
//!
//! `MemoryChunkStore` backs tests and hosts that already hold chunks in
//! memory. `JsonlChunkStore` reads a directory snapshot laid out as
//! `<root>/<project_id>/**/*.jsonl`, one serialized `Chunk` per line, with an
//! optional `<root>/<project_id>/project.json` holding `{"owner_id": ...}`.
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use crate::error::StoreError;
use crate::traits::ChunkStore;
use crate::types::{Chunk, Scope};
use crate::validation::validate_project_id;

#[derive(Default)]
struct MemoryState {
    // project id -> owner (None = readable by anyone)
    projects: HashMap<String, Option<String>>,
    chunks: Vec<Chunk>,
}

#[derive(Default)]
pub struct MemoryChunkStore {
    inner: RwLock<MemoryState>,
}

impl MemoryChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from chunks, registering every referenced project
    /// without an owner.
    pub fn from_chunks(chunks: impl IntoIterator<Item = Chunk>) -> Self {
        let store = Self::new();
        for chunk in chunks {
            store.insert(chunk);
        }
        store
    }

    pub fn add_project(&self, project_id: &str, owner_id: Option<&str>) {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        state.projects.insert(project_id.to_string(), owner_id.map(str::to_string));
    }

    pub fn insert(&self, chunk: Chunk) {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        state.projects.entry(chunk.project_id.clone()).or_insert(None);
        state.chunks.retain(|c| !(c.project_id == chunk.project_id && c.id == chunk.id));
        state.chunks.push(chunk);
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ChunkStore for MemoryChunkStore {
    async fn find_eligible_chunks(
        &self,
        project_id: &str,
        owner_id: Option<&str>,
    ) -> Result<Vec<Chunk>, StoreError> {
        let scope = Scope::new(project_id, owner_id);
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.chunks.iter().filter(|c| scope.admits(c)).cloned().collect())
    }

    async fn project_accessible(
        &self,
        project_id: &str,
        owner_id: Option<&str>,
    ) -> Result<bool, StoreError> {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(owner_may_read(state.projects.get(project_id), owner_id))
    }
}

fn owner_may_read(project: Option<&Option<String>>, owner_id: Option<&str>) -> bool {
    match (project, owner_id) {
        (None, _) => false,
        (Some(None), _) | (Some(Some(_)), None) => true,
        (Some(Some(project_owner)), Some(owner)) => project_owner == owner,
    }
}

#[derive(Debug, Default, Deserialize)]
struct ProjectManifest {
    #[serde(default)]
    owner_id: Option<String>,
}

pub struct JsonlChunkStore {
    root: PathBuf,
}

impl JsonlChunkStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of `project_id`, or `None` when the id could step outside
    /// the root. Such ids never name a project.
    fn project_dir(&self, project_id: &str) -> Option<PathBuf> {
        if let Err(e) = validate_project_id(project_id) {
            tracing::warn!(error = %e, "refusing project id outside the chunk root");
            return None;
        }
        Some(self.root.join(project_id))
    }

    fn ensure_root(&self) -> Result<(), StoreError> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(StoreError::Unavailable(format!("{} is not a directory", self.root.display())))
        }
    }

    fn read_manifest(dir: &Path) -> Result<ProjectManifest, StoreError> {
        let path = dir.join("project.json");
        if !path.exists() {
            return Ok(ProjectManifest::default());
        }
        let raw = fs::read_to_string(&path)
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
            location: path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn load_project(dir: &Path, project_id: &str) -> Result<Vec<Chunk>, StoreError> {
        let mut chunks = Vec::new();
        for file_path in list_jsonl_files(dir)? {
            let content = fs::read_to_string(&file_path)
                .map_err(|e| StoreError::Unavailable(format!("{}: {e}", file_path.display())))?;
            for (line_no, line) in content.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<Chunk>(line) {
                    Ok(chunk) if chunk.project_id == project_id => chunks.push(chunk),
                    Ok(chunk) => tracing::warn!(
                        file = %file_path.display(),
                        line = line_no + 1,
                        chunk_project = %chunk.project_id,
                        "skipping chunk filed under the wrong project"
                    ),
                    Err(e) => tracing::warn!(
                        file = %file_path.display(),
                        line = line_no + 1,
                        error = %e,
                        "skipping unreadable chunk record"
                    ),
                }
            }
        }
        Ok(chunks)
    }
}

fn list_jsonl_files(root: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root) {
        let entry = entry.map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

#[async_trait]
impl ChunkStore for JsonlChunkStore {
    async fn find_eligible_chunks(
        &self,
        project_id: &str,
        owner_id: Option<&str>,
    ) -> Result<Vec<Chunk>, StoreError> {
        self.ensure_root()?;
        let Some(dir) = self.project_dir(project_id).filter(|d| d.is_dir()) else {
            return Ok(Vec::new());
        };
        let scope = Scope::new(project_id, owner_id);
        let project = project_id.to_string();
        let chunks = tokio::task::spawn_blocking(move || Self::load_project(&dir, &project))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))??;
        Ok(chunks.into_iter().filter(|c| scope.admits(c)).collect())
    }

    async fn project_accessible(
        &self,
        project_id: &str,
        owner_id: Option<&str>,
    ) -> Result<bool, StoreError> {
        self.ensure_root()?;
        let Some(dir) = self.project_dir(project_id).filter(|d| d.is_dir()) else {
            return Ok(false);
        };
        let manifest = Self::read_manifest(&dir)?;
        Ok(owner_may_read(Some(&manifest.owner_id), owner_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_filters_by_project_and_owner() {
        let store = MemoryChunkStore::from_chunks(vec![
            Chunk::new("a", "p1", "mine").with_owner("u1"),
            Chunk::new("b", "p1", "theirs").with_owner("u2"),
            Chunk::new("c", "p1", "legacy"),
            Chunk::new("d", "p2", "other project"),
        ]);
        let mut ids: Vec<String> = store
            .find_eligible_chunks("p1", Some("u1"))
            .await
            .expect("read")
            .into_iter()
            .map(|c| c.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn memory_store_reinsert_replaces_chunk() {
        let store = MemoryChunkStore::new();
        store.insert(Chunk::new("a", "p1", "v1"));
        store.insert(Chunk::new("a", "p1", "v2"));
        assert_eq!(store.len(), 1);
        let chunks = store.find_eligible_chunks("p1", None).await.expect("read");
        assert_eq!(chunks[0].text, "v2");
    }

    #[tokio::test]
    async fn memory_store_project_access_honours_owner() {
        let store = MemoryChunkStore::new();
        store.add_project("p1", Some("u1"));
        store.add_project("open", None);
        assert!(store.project_accessible("p1", Some("u1")).await.expect("read"));
        assert!(!store.project_accessible("p1", Some("u2")).await.expect("read"));
        assert!(store.project_accessible("open", Some("u2")).await.expect("read"));
        assert!(!store.project_accessible("missing", None).await.expect("read"));
    }
}
