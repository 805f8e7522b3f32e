//! Semantic chunking of flat natural-language text.
//!
//! Text is split into sentences, each sentence is embedded in one batched
//! provider call, adjacent sentences are compared, and a single greedy pass
//! packs them into chunks bounded by topic continuity and a token budget.

pub mod assembly;
pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod segmenter;
pub mod service;
pub mod similarity;
pub mod tokenizer;
pub mod types;

use async_trait::async_trait;

pub use assembly::{assemble, AssemblyParams};
pub use chunker::{chunk, chunk_with_outcome, TextSemanticChunker};
pub use config::{ChunkingConfig, ChunkingOptions};
pub use embeddings::{
    EmbeddingProvider, MockEmbeddingProvider, NullEmbeddingProvider, RigEmbeddingProvider,
    SharedEmbeddingProvider,
};
pub use segmenter::LanguageProfile;
pub use service::{
    ChunkDocumentRequest, ChunkDocumentResponse, ChunkSource, ChunkTelemetry, DocumentStatus,
    EmbedderKind, OptionsPatch, SemanticChunkingService, SemanticChunkingServiceBuilder,
};
pub use tokenizer::TokenEstimator;
pub use types::{ChunkingError, ChunkingOutcome, SemanticChunk, Sentence};

/// Implemented by concrete semantic chunkers.
#[async_trait]
pub trait SemanticChunker {
    type Source;

    async fn chunk(
        &self,
        source: Self::Source,
        cfg: &config::ChunkingConfig,
    ) -> Result<types::ChunkingOutcome, types::ChunkingError>;

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
