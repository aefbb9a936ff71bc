//! Persisted embedding snapshot for a corpus.
//!
//! The cache holds one record: the corpus identifiers in order and one
//! vector per identifier. It is either reused whole or recomputed whole.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

use crate::error::{EmbeddingError, Result};
use crate::matrix::EmbeddingMatrix;

/// Vectors for a corpus snapshot, row `i` belonging to `ids[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedEmbeddings {
    /// Item identifiers in row order.
    pub ids: Vec<String>,

    /// One vector per identifier.
    pub vectors: EmbeddingMatrix,

    /// Model used to generate the vectors.
    pub model: String,

    /// Which item field was embedded (for example `annotation`).
    #[serde(default)]
    pub source: String,

    /// When the vectors were computed.
    pub created_at: DateTime<Utc>,
}

impl CachedEmbeddings {
    /// Pair identifiers with their vectors.
    pub fn new(ids: Vec<String>, vectors: EmbeddingMatrix, model: impl Into<String>) -> Result<Self> {
        if ids.len() != vectors.len() {
            return Err(EmbeddingError::RowCountMismatch {
                ids: ids.len(),
                rows: vectors.len(),
            });
        }

        Ok(Self {
            ids,
            vectors,
            model: model.into(),
            source: String::new(),
            created_at: Utc::now(),
        })
    }

    /// Record which item field the vectors were computed from.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Whether this snapshot still describes `current_ids`.
    pub fn is_valid_for(&self, current_ids: &[String]) -> bool {
        is_valid(&self.ids, current_ids)
    }
}

/// Strict, order-sensitive freshness check.
///
/// Any reordering, insertion or deletion makes the whole cache stale.
pub fn is_valid(cached_ids: &[String], current_ids: &[String]) -> bool {
    cached_ids == current_ids
}

/// File-backed store for a single [`CachedEmbeddings`] record.
#[derive(Debug, Clone)]
pub struct EmbeddingCache {
    path: PathBuf,
}

impl EmbeddingCache {
    /// Create a cache stored at `path`. Nothing is read until [`Self::load`].
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn corrupt(&self, reason: impl ToString) -> EmbeddingError {
        EmbeddingError::CacheCorrupt {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    /// Load the persisted record.
    ///
    /// Returns `Ok(None)` when no cache file exists, and
    /// [`EmbeddingError::CacheCorrupt`] when one exists but is unusable.
    pub async fn load(&self) -> Result<Option<CachedEmbeddings>> {
        let content = match fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No embedding cache at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(self.corrupt(e)),
        };

        let record: CachedEmbeddings =
            serde_json::from_slice(&content).map_err(|e| self.corrupt(e))?;

        if record.ids.len() != record.vectors.len() {
            return Err(self.corrupt(format!(
                "{} ids but {} vectors",
                record.ids.len(),
                record.vectors.len()
            )));
        }

        info!(
            "Loaded {} cached embeddings from {}",
            record.ids.len(),
            self.path.display()
        );
        Ok(Some(record))
    }

    /// Persist `record`, replacing any previous snapshot.
    ///
    /// The record is written to a sibling temp file and renamed into place so
    /// a reader never observes a half-written cache.
    pub async fn save(&self, record: &CachedEmbeddings) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_vec(record)?;
        let temp_path = self.temp_path();
        fs::write(&temp_path, &content).await?;
        fs::rename(&temp_path, &self.path).await?;

        info!(
            "Saved {} embeddings to {}",
            record.ids.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    fn sample() -> CachedEmbeddings {
        let vectors =
            EmbeddingMatrix::from_rows(vec![vec![1.0, 0.5, -0.25], vec![0.0, 2.0, 3.5]]).unwrap();
        CachedEmbeddings::new(ids(&["1", "2"]), vectors, "model-1")
            .unwrap()
            .with_source("annotation")
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let cache = EmbeddingCache::new(dir.path().join("nested/embeddings.json"));
        let record = sample();

        cache.save(&record).await.unwrap();
        let loaded = cache.load().await.unwrap().unwrap();

        assert_eq!(loaded.ids, record.ids);
        assert_eq!(loaded.vectors, record.vectors);
        assert_eq!(loaded, record);
        assert_eq!(loaded.source, "annotation");
        assert!(!cache.temp_path().exists());
    }

    #[tokio::test]
    async fn test_missing_file_is_absent() {
        let dir = TempDir::new().unwrap();
        let cache = EmbeddingCache::new(dir.path().join("nope.json"));
        assert!(cache.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_garbage_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("embeddings.json");
        std::fs::write(&path, b"not json at all").unwrap();

        let err = EmbeddingCache::new(&path).load().await.unwrap_err();
        assert!(matches!(err, EmbeddingError::CacheCorrupt { .. }));
    }

    #[tokio::test]
    async fn test_misaligned_record_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("embeddings.json");
        let body = serde_json::json!({
            "ids": ["1", "2", "3"],
            "vectors": [[1.0], [2.0]],
            "model": "m",
            "created_at": "2024-01-01T00:00:00Z"
        });
        std::fs::write(&path, body.to_string()).unwrap();

        let err = EmbeddingCache::new(&path).load().await.unwrap_err();
        assert!(matches!(err, EmbeddingError::CacheCorrupt { .. }));
    }

    #[tokio::test]
    async fn test_record_without_source_loads_with_empty_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("embeddings.json");
        let body = serde_json::json!({
            "ids": ["1"],
            "vectors": [[1.0, 0.0]],
            "model": "m",
            "created_at": "2024-01-01T00:00:00Z"
        });
        std::fs::write(&path, body.to_string()).unwrap();

        let loaded = EmbeddingCache::new(&path).load().await.unwrap().unwrap();
        assert_eq!(loaded.source, "");
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let cache = EmbeddingCache::new(dir.path().join("embeddings.json"));
        cache.save(&sample()).await.unwrap();

        let replacement = CachedEmbeddings::new(
            ids(&["9"]),
            EmbeddingMatrix::from_rows(vec![vec![4.0]]).unwrap(),
            "model-2",
        )
        .unwrap();
        cache.save(&replacement).await.unwrap();

        let loaded = cache.load().await.unwrap().unwrap();
        assert_eq!(loaded.ids, ids(&["9"]));
        assert_eq!(loaded.model, "model-2");
    }

    #[test]
    fn test_is_valid_is_order_sensitive() {
        assert!(is_valid(&ids(&["a", "b"]), &ids(&["a", "b"])));
        assert!(!is_valid(&ids(&["a", "b"]), &ids(&["b", "a"])));
        assert!(!is_valid(&ids(&["a", "b"]), &ids(&["a", "b", "c"])));
        assert!(!is_valid(&ids(&["a", "b"]), &ids(&["a"])));
        assert!(is_valid(&[], &[]));
    }

    #[test]
    fn test_new_rejects_misaligned_rows() {
        let vectors = EmbeddingMatrix::from_rows(vec![vec![1.0]]).unwrap();
        let err = CachedEmbeddings::new(ids(&["a", "b"]), vectors, "m").unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::RowCountMismatch { ids: 2, rows: 1 }
        ));
    }
}
