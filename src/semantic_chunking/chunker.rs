use async_trait::async_trait;
use tracing::Instrument;

use super::assembly::{assemble, AssemblyParams};
use super::config::ChunkingConfig;
use super::segmenter;
use super::similarity::{adjacent_similarities, validate_embeddings};
use super::types::{ChunkingError, ChunkingOutcome};
use super::SemanticChunker;

/// Chunk raw text into rendered passages.
pub async fn chunk(text: &str, cfg: &ChunkingConfig) -> Result<Vec<String>, ChunkingError> {
    Ok(chunk_with_outcome(text, cfg).await?.into_texts())
}

/// Chunk raw text, keeping sentence ranges, token counts, trace and stats.
///
/// The only external interaction is a single `embed_batch` call covering every
/// sentence; any failure there fails the whole call.
pub async fn chunk_with_outcome(
    text: &str,
    cfg: &ChunkingConfig,
) -> Result<ChunkingOutcome, ChunkingError> {
    cfg.validate()?;

    let span = tracing::debug_span!(
        "text_chunk",
        language = cfg.options.language.label(),
        embedder = cfg.embedder.identify(),
    );
    async move {
        if text.trim().is_empty() {
            return Ok(ChunkingOutcome::empty());
        }

        let sentences = segmenter::segment(text, cfg.options.language);
        if sentences.is_empty() {
            return Ok(ChunkingOutcome::empty());
        }

        let texts: Vec<String> = sentences
            .iter()
            .map(|sentence| sentence.text.clone())
            .collect();
        let embeddings = cfg.embedder.embed_batch(&texts).await.map_err(|err| match err {
            ChunkingError::EmbeddingUnavailable { .. } => err,
            other => ChunkingError::embedding_unavailable(other.to_string()),
        })?;
        validate_embeddings(&embeddings, sentences.len())?;

        let similarities = adjacent_similarities(&embeddings);
        let params = AssemblyParams::from(&cfg.options);
        Ok(assemble(&sentences, &similarities, &params))
    }
    .instrument(span)
    .await
}

/// Semantic chunker for flat natural-language text.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextSemanticChunker;

impl TextSemanticChunker {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SemanticChunker for TextSemanticChunker {
    type Source = String;

    async fn chunk(
        &self,
        source: Self::Source,
        cfg: &ChunkingConfig,
    ) -> Result<ChunkingOutcome, ChunkingError> {
        chunk_with_outcome(&source, cfg).await
    }
}
