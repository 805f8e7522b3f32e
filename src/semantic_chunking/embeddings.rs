use async_trait::async_trait;
use rig::embeddings::embedding::{EmbeddingModel, EmbeddingModelDyn};
use std::any::type_name;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::similarity::normalize;
use super::types::ChunkingError;

/// Abstract embedding provider used by semantic chunkers.
///
/// Implementations return one unit-normalized vector per input, in input
/// order, with a fixed dimensionality.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ChunkingError>;

    fn identify(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Shared reference type alias for embedding providers.
pub type SharedEmbeddingProvider = Arc<dyn EmbeddingProvider>;

/// Deterministic offline embeddings for tests and demos.
///
/// Each lowercased word is hashed into one of `dims` buckets and the counts are
/// L2-normalized, so sentences sharing vocabulary score as similar.
#[derive(Clone)]
pub struct MockEmbeddingProvider {
    dims: usize,
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self { dims: 64 }
    }
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dims(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    fn hash_to_vector(&self, input: &str) -> Vec<f32> {
        let mut buckets = vec![0.0_f32; self.dims];
        for word in input
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            let bucket = (hasher.finish() % self.dims as u64) as usize;
            buckets[bucket] += 1.0;
        }
        normalize(buckets)
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ChunkingError> {
        Ok(inputs
            .iter()
            .map(|text| self.hash_to_vector(text))
            .collect())
    }

    fn identify(&self) -> &'static str {
        "mock-hashing"
    }
}

/// Adapter that bridges a RIG [`EmbeddingModel`] into the local [`EmbeddingProvider`] trait.
pub struct RigEmbeddingProvider {
    model: Arc<dyn EmbeddingModelDyn>,
    label: String,
}

impl RigEmbeddingProvider {
    /// Construct from a concrete RIG embedding model instance.
    pub fn from_model<M>(model: M) -> Self
    where
        M: EmbeddingModel + 'static,
    {
        let label = type_name::<M>().to_string();
        let dyn_arc: Arc<dyn EmbeddingModelDyn> = Arc::new(model);
        Self::from_dyn(dyn_arc, Some(label))
    }

    /// Construct from a trait object handle. The label defaults to `rig-embedding`.
    pub fn from_dyn(model: Arc<dyn EmbeddingModelDyn>, label: Option<String>) -> Self {
        let label = label.unwrap_or_else(|| "rig-embedding".to_string());
        Self { model, label }
    }

    /// Returns the model label used for telemetry.
    pub fn model_label(&self) -> &str {
        &self.label
    }
}

#[async_trait]
impl EmbeddingProvider for RigEmbeddingProvider {
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ChunkingError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self
            .model
            .embed_texts(inputs.to_vec())
            .await
            .map_err(|err| ChunkingError::embedding_unavailable(err.to_string()))?;

        // Remote models are not guaranteed to return unit vectors.
        Ok(embeddings
            .into_iter()
            .map(|embedding| normalize(embedding.vec.into_iter().map(|v| v as f32).collect()))
            .collect())
    }

    fn identify(&self) -> &'static str {
        "rig"
    }
}

/// Embedding provider that always fails; used when nothing is configured.
#[derive(Default)]
pub struct NullEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for NullEmbeddingProvider {
    async fn embed_batch(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, ChunkingError> {
        Err(ChunkingError::embedding_unavailable(
            "embedding provider not configured",
        ))
    }

    fn identify(&self) -> &'static str {
        "null"
    }
}
