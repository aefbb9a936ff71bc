//! Similarity computation for embeddings.

use std::cmp::Reverse;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::{EmbeddingError, Result};
use crate::matrix::EmbeddingMatrix;

/// Compute the dot product between two embeddings.
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}

/// Compute the cosine similarity between two embeddings.
///
/// Returns a value between -1.0 and 1.0, where:
/// - 1.0 means identical direction
/// - 0.0 means orthogonal vectors
/// - -1.0 means opposite vectors
///
/// If either vector has zero magnitude the result is exactly 0.0, so an
/// all-zero vector matches nothing.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    let dot = dot_product(a, b)?;
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (magnitude_a * magnitude_b))
}

/// The winning row of a search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestMatch {
    /// Row index in the searched matrix.
    pub index: usize,

    /// Cosine similarity between the query and that row.
    pub score: f32,
}

fn score_rows(query: &[f32], corpus: &EmbeddingMatrix) -> Result<Vec<f32>> {
    corpus
        .rows()
        .map(|row| cosine_similarity(query, row))
        .collect()
}

/// Find the corpus row most similar to `query`.
///
/// Scans every row. Only a strictly greater score replaces the current
/// best, so among equal scores the lowest index wins.
pub fn find_best_match(query: &[f32], corpus: &EmbeddingMatrix) -> Result<BestMatch> {
    let scores = score_rows(query, corpus)?;

    let mut best: Option<BestMatch> = None;
    for (index, score) in scores.into_iter().enumerate() {
        match best {
            Some(current) if score <= current.score || score.is_nan() => {}
            _ => best = Some(BestMatch { index, score }),
        }
    }

    best.ok_or(EmbeddingError::EmptyCorpus)
}

/// Find the `k` corpus rows most similar to `query`, best first.
///
/// Rows scoring below `min_score` are dropped. Equal scores keep row order.
pub fn find_top_k(
    query: &[f32],
    corpus: &EmbeddingMatrix,
    k: usize,
    min_score: f32,
) -> Result<Vec<BestMatch>> {
    if corpus.is_empty() {
        return Err(EmbeddingError::EmptyCorpus);
    }

    let mut matches: Vec<BestMatch> = score_rows(query, corpus)?
        .into_iter()
        .enumerate()
        .filter(|(_, score)| !score.is_nan() && *score >= min_score)
        .map(|(index, score)| BestMatch { index, score })
        .collect();

    // Stable sort keeps lower indices first among equal scores.
    matches.sort_by_key(|m| Reverse(OrderedFloat(m.score)));
    matches.truncate(k);

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn matrix(rows: Vec<Vec<f32>>) -> EmbeddingMatrix {
        EmbeddingMatrix::from_rows(rows).unwrap()
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![0.3, -1.2, 4.0];
        let sim = cosine_similarity(&a, &a).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![-1.0, 0.0, 0.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim - (-1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let v = vec![0.2, 0.4, 0.6];
        let zero = vec![0.0; 3];
        assert_eq!(cosine_similarity(&v, &zero).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&zero, &v).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero).unwrap(), 0.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!(cosine_similarity(&a, &b).is_err());
    }

    #[test]
    fn test_find_best_match() {
        let corpus = matrix(vec![
            vec![0.0, 1.0, 0.0],
            vec![0.7, 0.7, 0.0],
            vec![1.0, 0.0, 0.0],
        ]);
        let best = find_best_match(&[1.0, 0.1, 0.0], &corpus).unwrap();
        assert_eq!(best.index, 2);
        assert!(best.score > 0.99);
    }

    #[test]
    fn test_find_best_match_tie_prefers_lowest_index() {
        let corpus = matrix(vec![
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![0.5, 0.5],
            vec![1.0, 0.0],
        ]);
        let best = find_best_match(&[1.0, 0.0], &corpus).unwrap();
        assert_eq!(best.index, 1);
    }

    #[test]
    fn test_find_best_match_is_deterministic() {
        let corpus = matrix(vec![vec![0.1, 0.9], vec![0.9, 0.1], vec![0.5, 0.5]]);
        let query = [0.6, 0.4];
        let first = find_best_match(&query, &corpus).unwrap();
        for _ in 0..10 {
            assert_eq!(find_best_match(&query, &corpus).unwrap(), first);
        }
    }

    #[test]
    fn test_find_best_match_empty_corpus() {
        let err = find_best_match(&[1.0], &EmbeddingMatrix::default()).unwrap_err();
        assert!(matches!(err, EmbeddingError::EmptyCorpus));
    }

    #[test]
    fn test_zero_query_matches_first_row() {
        let corpus = matrix(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let best = find_best_match(&[0.0, 0.0], &corpus).unwrap();
        assert_eq!(best, BestMatch { index: 0, score: 0.0 });
    }

    #[test]
    fn test_find_top_k() {
        let corpus = matrix(vec![
            vec![1.0, 0.0, 0.0], // similarity 1.0
            vec![0.0, 1.0, 0.0], // similarity 0.0
            vec![0.7, 0.7, 0.0], // similarity ~0.7
            vec![1.0, 0.0, 0.0], // similarity 1.0, ties with row 0
        ]);

        let results = find_top_k(&[1.0, 0.0, 0.0], &corpus, 3, 0.0).unwrap();
        let order: Vec<usize> = results.iter().map(|m| m.index).collect();
        assert_eq!(order, vec![0, 3, 2]);

        let filtered = find_top_k(&[1.0, 0.0, 0.0], &corpus, 10, 0.5).unwrap();
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn test_nan_rows_never_rank() {
        let corpus = matrix(vec![vec![f32::NAN, 1.0], vec![0.0, 1.0], vec![1.0, 0.0]]);
        let query = [1.0, 0.0];

        let ranked = find_top_k(&query, &corpus, 3, -1.0).unwrap();
        let order: Vec<usize> = ranked.iter().map(|m| m.index).collect();
        assert_eq!(order, vec![2, 1]);

        assert_eq!(find_best_match(&query, &corpus).unwrap().index, 2);
    }
}
