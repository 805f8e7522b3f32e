//! # semantic_chunker
//!
//! Splits long documents into ordered, topic-coherent passages that fit a
//! token budget, ready to be embedded and indexed by a retrieval pipeline.
//!
//! ```no_run
//! use std::sync::Arc;
//! use semantic_chunker::semantic_chunking::{chunk, ChunkingConfig, MockEmbeddingProvider};
//!
//! # async fn demo() -> Result<(), semantic_chunker::semantic_chunking::ChunkingError> {
//! let cfg = ChunkingConfig::new(Arc::new(MockEmbeddingProvider::new()))
//!     .with_max_tokens(120)
//!     .with_min_similarity(0.5)
//!     .with_overlap(1);
//! let chunks = chunk("Rust has ownership. Ownership enables borrowing.", &cfg).await?;
//! assert!(!chunks.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod semantic_chunking;

pub use semantic_chunking::assembly;
pub use semantic_chunking::chunker;
pub use semantic_chunking::config;
pub use semantic_chunking::embeddings;
pub use semantic_chunking::segmenter;
pub use semantic_chunking::service;
pub use semantic_chunking::similarity;
pub use semantic_chunking::tokenizer;
