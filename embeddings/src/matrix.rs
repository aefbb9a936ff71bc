//! Row-major matrix of embeddings.

use serde::{Deserialize, Serialize};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};

/// An ordered set of embeddings that all share one dimension.
///
/// Row `i` belongs to the `i`-th item of whatever sequence produced the
/// matrix; the matrix itself carries no identifiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Embedding>", into = "Vec<Embedding>")]
pub struct EmbeddingMatrix {
    rows: Vec<Embedding>,
}

impl EmbeddingMatrix {
    /// Build a matrix, checking that every row has the same length.
    pub fn from_rows(rows: Vec<Embedding>) -> Result<Self> {
        if let Some(first) = rows.first() {
            let expected = first.len();
            if let Some(bad) = rows.iter().find(|row| row.len() != expected) {
                return Err(EmbeddingError::DimensionMismatch {
                    expected,
                    actual: bad.len(),
                });
            }
        }
        Ok(Self { rows })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Length of each row, or `None` for an empty matrix.
    pub fn dimension(&self) -> Option<usize> {
        self.rows.first().map(Vec::len)
    }

    /// Get a row by position.
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Iterate rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

impl TryFrom<Vec<Embedding>> for EmbeddingMatrix {
    type Error = EmbeddingError;

    fn try_from(rows: Vec<Embedding>) -> Result<Self> {
        Self::from_rows(rows)
    }
}

impl From<EmbeddingMatrix> for Vec<Embedding> {
    fn from(matrix: EmbeddingMatrix) -> Self {
        matrix.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ragged_rows_rejected() {
        let result = EmbeddingMatrix::from_rows(vec![vec![1.0, 0.0], vec![1.0]]);
        assert!(matches!(
            result,
            Err(EmbeddingError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_empty_matrix_has_no_dimension() {
        let matrix = EmbeddingMatrix::default();
        assert!(matrix.is_empty());
        assert_eq!(matrix.dimension(), None);
    }

    #[test]
    fn test_deserialize_validates_shape() {
        let ok: EmbeddingMatrix = serde_json::from_str("[[1.0,2.0],[3.0,4.0]]").unwrap();
        assert_eq!(ok.len(), 2);
        assert_eq!(ok.row(1), Some(&[3.0f32, 4.0][..]));

        let bad = serde_json::from_str::<EmbeddingMatrix>("[[1.0,2.0],[3.0]]");
        assert!(bad.is_err());
    }
}
