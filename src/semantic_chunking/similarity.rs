use super::types::ChunkingError;

/// Similarity between each sentence and its successor.
///
/// Vectors are expected to be unit-normalized, so the dot product equals the
/// cosine similarity. Fewer than two vectors yield an empty slice.
pub fn adjacent_similarities(embeddings: &[Vec<f32>]) -> Vec<f32> {
    if embeddings.len() < 2 {
        return Vec::new();
    }
    embeddings
        .windows(2)
        .map(|pair| dot(&pair[0], &pair[1]))
        .collect()
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(lhs, rhs)| lhs * rhs).sum()
}

/// Scale a vector to unit length. Zero vectors are returned unchanged.
pub fn normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
    if norm > 0.0 && norm.is_finite() {
        for value in &mut vector {
            *value /= norm;
        }
    }
    vector
}

/// Check a provider answer: one vector per sentence, all of one dimensionality.
pub fn validate_embeddings(embeddings: &[Vec<f32>], expected: usize) -> Result<(), ChunkingError> {
    if embeddings.len() != expected {
        return Err(ChunkingError::embedding_unavailable(format!(
            "provider returned {} vectors for {expected} sentences",
            embeddings.len()
        )));
    }
    if let Some(first) = embeddings.first() {
        let dims = first.len();
        if let Some(position) = embeddings.iter().position(|vector| vector.len() != dims) {
            return Err(ChunkingError::embedding_unavailable(format!(
                "vector {position} has {} dimensions, expected {dims}",
                embeddings[position].len()
            )));
        }
    }
    Ok(())
}
