//! Vector index over a corpus snapshot.
//!
//! [`VectorIndex`] is the seam between callers and the search strategy.
//! The only strategy today is [`BruteForceIndex`], an exact linear scan.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EmbeddingError, Result};
use crate::matrix::EmbeddingMatrix;
use crate::similarity::{BestMatch, find_best_match, find_top_k};

/// A search hit resolved to its item identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexHit {
    /// Identifier of the matched item.
    pub id: String,

    /// Row position of the item.
    pub index: usize,

    /// Similarity score.
    pub score: f32,
}

/// Searchable collection of item vectors.
pub trait VectorIndex: Send + Sync {
    /// Number of indexed items.
    fn len(&self) -> usize;

    /// Whether the index holds no items.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The single most similar item.
    fn best_match(&self, query: &[f32]) -> Result<IndexHit>;

    /// Up to `k` most similar items, best first.
    fn top_k(&self, query: &[f32], k: usize, min_score: f32) -> Result<Vec<IndexHit>>;
}

/// Exact cosine search over every row.
#[derive(Debug, Clone)]
pub struct BruteForceIndex {
    ids: Vec<String>,
    matrix: EmbeddingMatrix,
}

impl BruteForceIndex {
    /// Create an index from aligned identifiers and vectors.
    pub fn new(ids: Vec<String>, matrix: EmbeddingMatrix) -> Result<Self> {
        if ids.len() != matrix.len() {
            return Err(EmbeddingError::RowCountMismatch {
                ids: ids.len(),
                rows: matrix.len(),
            });
        }
        debug!("Built brute-force index over {} rows", ids.len());
        Ok(Self { ids, matrix })
    }

    fn check_dimension(&self, query: &[f32]) -> Result<()> {
        match self.matrix.dimension() {
            Some(expected) if expected != query.len() => Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: query.len(),
            }),
            _ => Ok(()),
        }
    }

    fn hit(&self, m: BestMatch) -> IndexHit {
        IndexHit {
            id: self.ids[m.index].clone(),
            index: m.index,
            score: m.score,
        }
    }
}

impl VectorIndex for BruteForceIndex {
    fn len(&self) -> usize {
        self.ids.len()
    }

    fn best_match(&self, query: &[f32]) -> Result<IndexHit> {
        self.check_dimension(query)?;
        let best = find_best_match(query, &self.matrix)?;
        Ok(self.hit(best))
    }

    fn top_k(&self, query: &[f32], k: usize, min_score: f32) -> Result<Vec<IndexHit>> {
        self.check_dimension(query)?;
        let matches = find_top_k(query, &self.matrix, k, min_score)?;
        Ok(matches.into_iter().map(|m| self.hit(m)).collect())
    }
}
