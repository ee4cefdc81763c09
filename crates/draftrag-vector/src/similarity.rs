//! Cosine similarity over embedding vectors.
//!
//! Components are widened to f64 before accumulation so the result does not
//! depend on the magnitude of the stored vectors.

/// `dot(a, b) / (|a| * |b|)`, clamped to `[-1, 1]`.
///
/// `None` when the vectors are empty, differ in length, contain non-finite
/// components, or either has zero norm.
pub fn checked_cosine(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.is_empty() || a.len() != b.len() {
        return None;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if !dot.is_finite() || !denom.is_finite() || denom == 0.0 {
        return None;
    }
    Some((dot / denom).clamp(-1.0, 1.0))
}

/// Like [`checked_cosine`] but maps every degenerate case to `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    checked_cosine(a, b).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-9
    }

    #[test]
    fn cosine_is_one_for_identical_vectors() {
        let v = vec![1.0, 2.0, 3.0, 4.0];
        assert!(approx_eq(cosine_similarity(&v, &v), 1.0));
    }

    #[test]
    fn cosine_is_minus_one_for_opposite_vectors() {
        assert!(approx_eq(cosine_similarity(&[1.0, -2.0], &[-1.0, 2.0]), -1.0));
    }

    #[test]
    fn cosine_is_zero_for_orthogonal_vectors() {
        assert!(approx_eq(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0));
        assert_eq!(checked_cosine(&[1.0, 0.0], &[0.0, 1.0]), Some(0.0));
    }

    #[test]
    fn zero_norm_is_excluded() {
        assert_eq!(checked_cosine(&[0.0, 0.0], &[1.0, 1.0]), None);
        assert_eq!(cosine_similarity(&[1.0, 1.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn mismatched_or_empty_vectors_are_excluded() {
        assert_eq!(checked_cosine(&[1.0, 0.0], &[1.0, 0.0, 0.0]), None);
        assert_eq!(checked_cosine(&[], &[]), None);
    }

    #[test]
    fn corrupt_components_are_excluded() {
        assert_eq!(checked_cosine(&[f32::NAN, 1.0], &[1.0, 1.0]), None);
        assert_eq!(checked_cosine(&[f32::INFINITY, 1.0], &[1.0, 1.0]), None);
    }

    #[test]
    fn independent_of_scale() {
        let a = [0.5, 0.25, 1.0];
        let b = [3.0, 4.0, 5.5];
        assert!(approx_eq(cosine_similarity(&a, &b), cosine_similarity(&[2.0, 1.0, 4.0], &b)));
    }
}
