//! Pluggable distance functions for embedding comparison.
//!
//! The Postgres matcher computes distance in-database with the pgvector
//! `<=>` operator; this module provides the same metric for in-memory
//! implementations (test fakes, future index-backed matchers) behind a
//! narrow trait so the nearest-neighbor mechanism stays swappable.

/// A distance metric over embedding vectors.
///
/// Implementations must be consistent with whatever the storage layer
/// computes: same scale, same ordering.
pub trait DistanceMetric: Send + Sync {
    /// Distance between two vectors of equal dimension.
    fn distance(&self, a: &[f32], b: &[f32]) -> f64;
}

/// Normalized cosine distance on the [0, 2] scale, matching pgvector `<=>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineDistance;

impl DistanceMetric for CosineDistance {
    fn distance(&self, a: &[f32], b: &[f32]) -> f64 {
        debug_assert_eq!(a.len(), b.len(), "embedding dimensions must match");

        let mut dot = 0.0f64;
        let mut norm_a = 0.0f64;
        let mut norm_b = 0.0f64;
        for (x, y) in a.iter().zip(b.iter()) {
            dot += (*x as f64) * (*y as f64);
            norm_a += (*x as f64) * (*x as f64);
            norm_b += (*y as f64) * (*y as f64);
        }

        if norm_a == 0.0 || norm_b == 0.0 {
            // A zero vector has no direction; report maximum distance so it
            // never clears the candidate threshold.
            return 2.0;
        }

        let cosine = dot / (norm_a.sqrt() * norm_b.sqrt());
        // Guard against floating-point drift outside [-1, 1].
        1.0 - cosine.clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors_distance_zero() {
        let v = vec![0.3, -0.5, 0.8];
        let d = CosineDistance.distance(&v, &v);
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn test_opposite_vectors_distance_two() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        let d = CosineDistance.distance(&a, &b);
        assert!((d - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_orthogonal_vectors_distance_one() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        let d = CosineDistance.distance(&a, &b);
        assert!((d - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_vector_never_matches() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 1.0];
        assert_eq!(CosineDistance.distance(&a, &b), 2.0);
    }

    #[test]
    fn test_scale_invariance() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![2.0, 4.0, 6.0];
        let d = CosineDistance.distance(&a, &b);
        assert!(d.abs() < 1e-9);
    }
}
