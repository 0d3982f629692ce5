//! Sakuna Vector - Embeddings and cosine similarity
//!
//! Provides the text-embedding oracle abstraction used by the disaster-type
//! classifier, a moka-backed embedding cache, and a dense category matrix
//! for batched cosine similarity.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use sakuna_core::{Result, SakunaError};

pub mod cache;
pub mod embedding;

pub use cache::CachedEmbedding;
pub use embedding::{
    create_embedding_client, EmbeddingClient, HashingEmbedding, OllamaEmbedding, OpenAiEmbedding,
};

/// Cosine similarity of two vectors; 0 when either has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let a = ArrayView1::from(a);
    let b = ArrayView1::from(b);
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        a.dot(&b) / (norm_a * norm_b)
    } else {
        0.0
    }
}

/// Index and value of the first maximum; `None` for an empty slice
pub fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &score) in scores.iter().enumerate() {
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((idx, score)),
        }
    }
    best
}

/// Row-normalised matrix of reference embeddings
#[derive(Debug, Clone)]
pub struct EmbeddingMatrix {
    rows: Array2<f32>,
}

impl EmbeddingMatrix {
    /// Build from equally sized vectors
    pub fn from_rows(vectors: &[Vec<f32>]) -> Result<Self> {
        let dimension = vectors.first().map(Vec::len).unwrap_or(0);

        let mut rows = Array2::<f32>::zeros((vectors.len(), dimension));
        for (idx, vector) in vectors.iter().enumerate() {
            if vector.len() != dimension {
                return Err(SakunaError::Embedding(format!(
                    "embedding {idx} has dimension {}, expected {dimension}",
                    vector.len()
                )));
            }
            let mut row = rows.row_mut(idx);
            row.assign(&ArrayView1::from(vector.as_slice()));
            let norm = row.dot(&row).sqrt();
            if norm > 0.0 {
                row /= norm;
            }
        }

        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dimension(&self) -> usize {
        self.rows.len_of(Axis(1))
    }

    /// Cosine similarity of `query` against every row
    pub fn similarities(&self, query: &[f32]) -> Result<Vec<f32>> {
        if query.len() != self.dimension() {
            return Err(SakunaError::Embedding(format!(
                "query has dimension {}, expected {}",
                query.len(),
                self.dimension()
            )));
        }

        let mut query = Array1::from(query.to_vec());
        let norm = query.dot(&query).sqrt();
        if norm == 0.0 {
            return Ok(vec![0.0; self.len()]);
        }
        query /= norm;

        Ok(self.rows.dot(&query).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-2.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.2, 0.9, 0.9, 0.1]), Some((1, 0.9)));
        assert_eq!(argmax(&[-0.5, -0.7]), Some((0, -0.5)));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_matrix_similarities() {
        let matrix = EmbeddingMatrix::from_rows(&[vec![2.0, 0.0], vec![0.0, 3.0], vec![0.0, 0.0]]).unwrap();
        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix.dimension(), 2);

        let scores = matrix.similarities(&[1.0, 1.0]).unwrap();
        assert!((scores[0] - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert!((scores[1] - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert_eq!(scores[2], 0.0);

        assert_eq!(matrix.similarities(&[0.0, 0.0]).unwrap(), vec![0.0; 3]);
        assert!(matrix.similarities(&[1.0]).is_err());
    }

    #[test]
    fn test_matrix_rejects_ragged_rows() {
        assert!(EmbeddingMatrix::from_rows(&[vec![1.0, 0.0], vec![1.0]]).is_err());
    }
}
