//! Vector similarity utilities.
//!
//! Pure-Rust cosine similarity and top-k ranking over embedded items.

/// Cosine of the angle between two embeddings, in `[-1, 1]`.
///
/// Mismatched lengths, empty input and zero vectors all score `0.0`, so a
/// broken embedding can never outrank a real match.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Rank items by cosine similarity to a query embedding.
///
/// Returns `(index, score)` pairs sorted by descending similarity, keeping
/// only scores at or above `min_score`. Ties keep insertion order, so the
/// ranking is deterministic.
pub fn top_k<'a, I>(embeddings: I, query: &[f32], k: usize, min_score: f32) -> Vec<(usize, f32)>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut scored: Vec<(usize, f32)> = embeddings
        .into_iter()
        .enumerate()
        .map(|(i, emb)| (i, cosine_similarity(emb, query)))
        .filter(|(_, sim)| *sim >= min_score)
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_identical_vectors() {
        let v = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_vectors() {
        let sim = cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn cosine_opposite_vectors() {
        let sim = cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]);
        assert!((sim - (-1.0)).abs() < 1e-6);
    }

    #[test]
    fn cosine_empty_and_mismatched() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn cosine_known_value() {
        // [1,1] · [1,0] = 1, |[1,1]| = sqrt(2), |[1,0]| = 1
        let sim = cosine_similarity(&[1.0, 1.0], &[1.0, 0.0]);
        assert!((sim - 0.7071).abs() < 0.001);
    }

    #[test]
    fn top_k_ranks_by_similarity() {
        let embeddings = [vec![0.0, 1.0, 0.0], vec![1.0, 0.0, 0.0], vec![0.5, 0.5, 0.0]];
        let ranked = top_k(embeddings.iter().map(Vec::as_slice), &[1.0, 0.0, 0.0], 10, -1.0);
        let order: Vec<_> = ranked.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn top_k_respects_min_score_and_limit() {
        let embeddings: Vec<Vec<f32>> = (0..10).map(|i| vec![1.0, i as f32 * 0.1]).collect();
        let ranked = top_k(embeddings.iter().map(Vec::as_slice), &[1.0, 0.0], 3, 0.0);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].0, 0);

        let strict = top_k(
            [vec![1.0, 0.0], vec![0.0, 1.0]].iter().map(Vec::as_slice),
            &[1.0, 0.0],
            10,
            0.5,
        );
        assert_eq!(strict, vec![(0, 1.0)]);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let embeddings = [vec![1.0, 0.0], vec![2.0, 0.0]];
        let ranked = top_k(embeddings.iter().map(Vec::as_slice), &[1.0, 0.0], 2, 0.0);
        assert_eq!(ranked[0].0, 0);
        assert_eq!(ranked[1].0, 1);
    }
}
