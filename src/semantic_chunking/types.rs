use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A single trimmed sentence produced by the segmenter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub index: usize,
    pub text: String,
}

impl Sentence {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// A fully assembled chunk ready for downstream embedding and storage.
///
/// `sentences` is the contiguous range of source sentences rendered into
/// `content`, including the `carried` overlap prefix taken from the previous
/// chunk. `tokens` is the chunk's own running count as tracked during assembly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SemanticChunk {
    pub index: usize,
    pub content: String,
    pub tokens: usize,
    pub sentences: Range<usize>,
    pub carried: usize,
}

impl SemanticChunk {
    /// Sentences that were added to this chunk rather than carried into it.
    pub fn own_sentences(&self) -> Range<usize> {
        (self.sentences.start + self.carried)..self.sentences.end
    }
}

/// Aggregate result returned by a chunker, including optional trace data.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkingOutcome {
    pub chunks: Vec<SemanticChunk>,
    pub trace: Option<ChunkingTrace>,
    pub stats: ChunkingStats,
}

impl ChunkingOutcome {
    pub fn empty() -> Self {
        Self {
            chunks: Vec::new(),
            trace: None,
            stats: ChunkingStats::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Drop everything but the rendered chunk texts, preserving order.
    pub fn into_texts(self) -> Vec<String> {
        self.chunks.into_iter().map(|chunk| chunk.content).collect()
    }
}

/// Basic runtime stats for diagnostics.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChunkingStats {
    pub total_sentences: usize,
    pub total_chunks: usize,
    pub average_tokens: f32,
    pub oversize_sentences: usize,
}

/// Trace data is useful for debugging where and why chunks were closed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChunkingTrace {
    pub events: Vec<TraceEvent>,
}

impl ChunkingTrace {
    pub fn count(&self, label: &str) -> usize {
        self.events
            .iter()
            .filter(|event| event.label == label)
            .count()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TraceEvent {
    pub label: String,
    pub score: Option<f32>,
    pub index: Option<usize>,
}

impl TraceEvent {
    pub fn new(label: impl Into<String>, score: Option<f32>, index: Option<usize>) -> Self {
        Self {
            label: label.into(),
            score,
            index,
        }
    }
}

/// Errors that a semantic chunker can surface to callers.
#[derive(thiserror::Error, miette::Diagnostic, Debug)]
pub enum ChunkingError {
    #[error("invalid configuration: {reason}")]
    #[diagnostic(
        code(semantic_chunker::invalid_configuration),
        help("max_tokens must be positive and min_similarity must lie in [0, 1].")
    )]
    InvalidConfiguration { reason: String },

    #[error("embedding unavailable: {reason}")]
    #[diagnostic(
        code(semantic_chunker::embedding_unavailable),
        help("The embedding provider failed or answered inconsistently; retry policy belongs to the caller.")
    )]
    EmbeddingUnavailable { reason: String },

    #[error("invalid input: {reason}")]
    #[diagnostic(code(semantic_chunker::invalid_input))]
    InvalidInput { reason: String },
}

impl ChunkingError {
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    pub fn embedding_unavailable(reason: impl Into<String>) -> Self {
        Self::EmbeddingUnavailable {
            reason: reason.into(),
        }
    }
}
