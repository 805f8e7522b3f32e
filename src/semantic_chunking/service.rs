use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use rig::embeddings::{embedding::EmbeddingModelDyn, EmbeddingModel};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{field, info, info_span, Instrument};

use super::chunker::chunk_with_outcome;
use super::config::{ChunkingConfig, ChunkingOptions};
use super::embeddings::{NullEmbeddingProvider, RigEmbeddingProvider, SharedEmbeddingProvider};
use super::types::{ChunkingError, ChunkingOutcome};

/// File extensions read as UTF-8 flat text. Other formats need an external loader.
const TEXT_EXTENSIONS: &[&str] = &["txt", "text", "md"];

pub struct SemanticChunkingService {
    defaults: ChunkingOptions,
    base_embedder: Option<EmbedderKind>,
    null_provider: SharedEmbeddingProvider,
}

impl SemanticChunkingService {
    pub fn builder() -> SemanticChunkingServiceBuilder {
        SemanticChunkingServiceBuilder::new()
    }

    pub fn default_options(&self) -> &ChunkingOptions {
        &self.defaults
    }

    pub async fn chunk_document(
        &self,
        request: ChunkDocumentRequest,
    ) -> Result<ChunkDocumentResponse, ChunkingError> {
        let mut options = request
            .options
            .unwrap_or_else(|| self.defaults.clone());
        for patch in &request.patches {
            patch(&mut options);
        }
        options.validate()?;
        let provider = self.resolve_provider(request.embedder);

        let span = info_span!(
            "semantic_chunking",
            source = field::Empty,
            embedder = %provider.label,
            status = field::Empty,
            sentences = field::Empty,
            chunks = field::Empty,
            duration_ms = field::Empty,
        );
        let start = Instant::now();

        let cfg = ChunkingConfig::new(provider.shared.clone()).with_options(options);
        let (source_label, outcome, status) = self
            .process(request.source, &cfg)
            .instrument(span.clone())
            .await?;

        let duration_ms = start.elapsed().as_millis();
        span.record("source", field::display(&source_label));
        span.record("status", field::debug(status));
        span.record("sentences", field::display(outcome.stats.total_sentences));
        span.record("chunks", field::display(outcome.chunks.len()));
        span.record("duration_ms", field::display(duration_ms));
        span.in_scope(|| info!(status = ?status, chunks = outcome.chunks.len(), "document chunked"));

        let telemetry = ChunkTelemetry {
            embedder: provider.label,
            source: source_label,
            duration_ms,
            sentence_count: outcome.stats.total_sentences,
            chunk_count: outcome.chunks.len(),
            average_tokens: outcome.stats.average_tokens,
            status,
        };

        Ok(ChunkDocumentResponse { outcome, telemetry })
    }

    async fn process(
        &self,
        source: ChunkSource,
        cfg: &ChunkingConfig,
    ) -> Result<(String, ChunkingOutcome, DocumentStatus), ChunkingError> {
        let resolved = self.resolve_source(source).await?;
        let (outcome, status) = match resolved.content {
            SourceContent::Missing => (ChunkingOutcome::empty(), DocumentStatus::NotFound),
            SourceContent::Unsupported => {
                (ChunkingOutcome::empty(), DocumentStatus::UnsupportedFormat)
            }
            SourceContent::Text(text) => {
                let outcome = chunk_with_outcome(&text, cfg).await?;
                let status = if outcome.is_empty() {
                    DocumentStatus::Empty
                } else {
                    DocumentStatus::Success
                };
                (outcome, status)
            }
        };
        Ok((resolved.source_label, outcome, status))
    }

    async fn resolve_source(&self, source: ChunkSource) -> Result<ResolvedDocument, ChunkingError> {
        match source {
            ChunkSource::PlainText(text) => Ok(ResolvedDocument {
                content: SourceContent::Text(text),
                source_label: "text:inline".to_string(),
            }),
            ChunkSource::FilePath(path) => self.load_from_path(&path).await,
        }
    }

    async fn load_from_path(&self, path: &Path) -> Result<ResolvedDocument, ChunkingError> {
        let source_label = format!("text:file:{}", path.display());
        let exists = fs::try_exists(path)
            .await
            .map_err(|err| ChunkingError::InvalidInput {
                reason: format!("failed to inspect {}: {err}", path.display()),
            })?;
        if !exists {
            return Ok(ResolvedDocument {
                content: SourceContent::Missing,
                source_label,
            });
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !TEXT_EXTENSIONS.contains(&extension.as_str()) {
            return Ok(ResolvedDocument {
                content: SourceContent::Unsupported,
                source_label,
            });
        }

        let data = fs::read_to_string(path)
            .await
            .map_err(|err| ChunkingError::InvalidInput {
                reason: format!("failed to read {}: {err}", path.display()),
            })?;

        Ok(ResolvedDocument {
            content: SourceContent::Text(data),
            source_label,
        })
    }

    fn resolve_provider(&self, override_embedder: Option<EmbedderKind>) -> ProviderContext {
        let embedder = override_embedder.or_else(|| self.base_embedder.clone());
        match embedder {
            Some(EmbedderKind::Rig(handle)) => ProviderContext {
                label: handle.model_label().to_string(),
                shared: handle,
            },
            Some(EmbedderKind::Provider(provider)) => ProviderContext {
                label: provider.identify().to_string(),
                shared: provider,
            },
            None => ProviderContext {
                shared: self.null_provider.clone(),
                label: "unconfigured".to_string(),
            },
        }
    }
}

#[derive(Clone)]
pub enum EmbedderKind {
    Rig(Arc<RigEmbeddingProvider>),
    Provider(SharedEmbeddingProvider),
}

pub struct SemanticChunkingServiceBuilder {
    defaults: ChunkingOptions,
    embedder: Option<EmbedderKind>,
}

impl SemanticChunkingServiceBuilder {
    fn new() -> Self {
        Self {
            defaults: ChunkingOptions::default(),
            embedder: None,
        }
    }

    pub fn with_options(mut self, options: ChunkingOptions) -> Self {
        self.defaults = options;
        self
    }

    pub fn with_rig_model<M>(mut self, model: M) -> Self
    where
        M: EmbeddingModel + 'static,
    {
        let provider = Arc::new(RigEmbeddingProvider::from_model(model));
        self.embedder = Some(EmbedderKind::Rig(provider));
        self
    }

    pub fn with_rig_model_dyn(
        mut self,
        model: Arc<dyn EmbeddingModelDyn>,
        label: Option<String>,
    ) -> Self {
        let provider = Arc::new(RigEmbeddingProvider::from_dyn(model, label));
        self.embedder = Some(EmbedderKind::Rig(provider));
        self
    }

    pub fn with_embedding_provider(mut self, provider: SharedEmbeddingProvider) -> Self {
        self.embedder = Some(EmbedderKind::Provider(provider));
        self
    }

    pub fn build(self) -> SemanticChunkingService {
        SemanticChunkingService {
            defaults: self.defaults,
            base_embedder: self.embedder,
            null_provider: Arc::new(NullEmbeddingProvider),
        }
    }
}

#[derive(Clone, Debug)]
pub enum ChunkSource {
    PlainText(String),
    FilePath(PathBuf),
}

/// Edit applied to the effective options of a single request.
pub type OptionsPatch = Arc<dyn Fn(&mut ChunkingOptions) + Send + Sync>;

#[derive(Clone)]
pub struct ChunkDocumentRequest {
    pub source: ChunkSource,
    /// Replaces the service defaults wholesale when set.
    pub options: Option<ChunkingOptions>,
    /// Applied in order on top of `options`, or the service defaults.
    pub patches: Vec<OptionsPatch>,
    pub embedder: Option<EmbedderKind>,
}

impl ChunkDocumentRequest {
    pub fn new(source: ChunkSource) -> Self {
        Self {
            source,
            options: None,
            patches: Vec::new(),
            embedder: None,
        }
    }

    pub fn with_options(mut self, options: ChunkingOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Adjust individual fields; everything else keeps the service's configured value.
    pub fn update_options<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut ChunkingOptions) + Send + Sync + 'static,
    {
        self.patches.push(Arc::new(f));
        self
    }

    pub fn with_embedder(mut self, embedder: EmbedderKind) -> Self {
        self.embedder = Some(embedder);
        self
    }
}

/// How a document request ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Success,
    Empty,
    NotFound,
    UnsupportedFormat,
}

pub struct ChunkDocumentResponse {
    pub outcome: ChunkingOutcome,
    pub telemetry: ChunkTelemetry,
}

impl ChunkDocumentResponse {
    pub fn texts(&self) -> Vec<String> {
        self.outcome
            .chunks
            .iter()
            .map(|chunk| chunk.content.clone())
            .collect()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ChunkTelemetry {
    pub embedder: String,
    pub source: String,
    pub duration_ms: u128,
    pub sentence_count: usize,
    pub chunk_count: usize,
    pub average_tokens: f32,
    pub status: DocumentStatus,
}

struct ProviderContext {
    shared: SharedEmbeddingProvider,
    label: String,
}

struct ResolvedDocument {
    content: SourceContent,
    source_label: String,
}

enum SourceContent {
    Text(String),
    Missing,
    Unsupported,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic_chunking::{EmbeddingProvider, MockEmbeddingProvider};
    use rig::embeddings::embedding::{Embedding, EmbeddingError};
    use tempfile::tempdir;
    use tokio::fs::write;

    fn mock_service() -> SemanticChunkingService {
        let provider: SharedEmbeddingProvider = Arc::new(MockEmbeddingProvider::new());
        SemanticChunkingService::builder()
            .with_embedding_provider(provider)
            .build()
    }

    #[tokio::test]
    async fn chunks_inline_text() {
        let service = mock_service();
        let request = ChunkDocumentRequest::new(ChunkSource::PlainText(
            "Rust has ownership. Ownership drives borrowing. Bread needs yeast.".to_string(),
        ));
        let response = service.chunk_document(request).await.unwrap();
        assert_eq!(response.telemetry.status, DocumentStatus::Success);
        assert_eq!(response.telemetry.sentence_count, 3);
        assert_eq!(response.telemetry.source, "text:inline");
        assert_eq!(response.telemetry.embedder, "mock-hashing");
        assert!(!response.texts().is_empty());
    }

    #[tokio::test]
    async fn blank_text_reports_empty() {
        let service = mock_service();
        let request = ChunkDocumentRequest::new(ChunkSource::PlainText("  \n".to_string()));
        let response = service.chunk_document(request).await.unwrap();
        assert_eq!(response.telemetry.status, DocumentStatus::Empty);
        assert!(response.outcome.chunks.is_empty());
    }

    #[tokio::test]
    async fn chunks_from_file_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        write(&path, "First sentence here. Second sentence here.")
            .await
            .unwrap();

        let service = mock_service();
        let request = ChunkDocumentRequest::new(ChunkSource::FilePath(path.clone()));
        let response = service.chunk_document(request).await.unwrap();

        assert!(response.telemetry.source.starts_with("text:file"));
        assert_eq!(response.telemetry.status, DocumentStatus::Success);
        assert_eq!(response.telemetry.sentence_count, 2);
    }

    #[tokio::test]
    async fn missing_and_unsupported_files_are_reported() {
        let dir = tempdir().unwrap();
        let service = mock_service();

        let missing = dir.path().join("absent.txt");
        let response = service
            .chunk_document(ChunkDocumentRequest::new(ChunkSource::FilePath(missing)))
            .await
            .unwrap();
        assert_eq!(response.telemetry.status, DocumentStatus::NotFound);

        let pdf = dir.path().join("paper.pdf");
        write(&pdf, b"%PDF-1.7").await.unwrap();
        let response = service
            .chunk_document(ChunkDocumentRequest::new(ChunkSource::FilePath(pdf)))
            .await
            .unwrap();
        assert_eq!(response.telemetry.status, DocumentStatus::UnsupportedFormat);
    }

    #[tokio::test]
    async fn non_utf8_text_file_is_invalid_input() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin1.txt");
        write(&path, [0xff_u8, 0xfe, 0x41]).await.unwrap();
        let result = mock_service()
            .chunk_document(ChunkDocumentRequest::new(ChunkSource::FilePath(path)))
            .await;
        assert!(matches!(result, Err(ChunkingError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn unconfigured_embedder_fails_without_partial_output() {
        let service = SemanticChunkingService::builder().build();
        let request =
            ChunkDocumentRequest::new(ChunkSource::PlainText("One. Two.".to_string()));
        let result = service.chunk_document(request).await;
        assert!(matches!(
            result,
            Err(ChunkingError::EmbeddingUnavailable { .. })
        ));
    }

    #[derive(Clone)]
    struct AxisEmbeddingModel;

    impl EmbeddingModel for AxisEmbeddingModel {
        const MAX_DOCUMENTS: usize = 16;

        fn ndims(&self) -> usize {
            2
        }

        fn embed_texts(
            &self,
            texts: impl IntoIterator<Item = String> + Send,
        ) -> impl std::future::Future<
            Output = Result<Vec<Embedding>, EmbeddingError>,
        > + Send {
            let docs: Vec<String> = texts.into_iter().collect();
            async move {
                Ok(docs
                    .into_iter()
                    .map(|document| Embedding {
                        // Deliberately not unit length.
                        vec: vec![3.0, 4.0],
                        document,
                    })
                    .collect())
            }
        }
    }

    #[tokio::test]
    async fn rig_models_are_normalized_and_labelled() {
        let provider = RigEmbeddingProvider::from_model(AxisEmbeddingModel);
        let vectors = provider
            .embed_batch(&["one".to_string(), "two".to_string()])
            .await
            .unwrap();
        assert!((vectors[0][0] - 0.6).abs() < 1e-6);
        assert!((vectors[1][1] - 0.8).abs() < 1e-6);

        let service = SemanticChunkingService::builder()
            .with_rig_model(AxisEmbeddingModel)
            .build();
        let request = ChunkDocumentRequest::new(ChunkSource::PlainText("One. Two.".to_string()))
            .update_options(|options| options.min_similarity = 0.9);
        let response = service.chunk_document(request).await.unwrap();
        assert!(response.telemetry.embedder.ends_with("AxisEmbeddingModel"));
        assert_eq!(response.texts(), vec!["One. Two."]);
    }

    struct ConstantProvider;

    #[async_trait::async_trait]
    impl EmbeddingProvider for ConstantProvider {
        async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ChunkingError> {
            Ok(inputs.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    #[tokio::test]
    async fn request_updates_keep_service_defaults() {
        let defaults = ChunkingOptions {
            max_tokens: 1,
            min_similarity: 0.0,
            ..ChunkingOptions::default()
        };
        let service = SemanticChunkingService::builder()
            .with_options(defaults.clone())
            .with_embedding_provider(Arc::new(ConstantProvider))
            .build();
        assert_eq!(service.default_options(), &defaults);

        let plain = ChunkDocumentRequest::new(ChunkSource::PlainText("A. B. C.".to_string()));
        let response = service.chunk_document(plain.clone()).await.unwrap();
        assert_eq!(response.texts(), vec!["A.", "B.", "C."]);

        let with_overlap = plain.update_options(|options| options.overlap = 1);
        let response = service.chunk_document(with_overlap).await.unwrap();
        assert_eq!(response.texts(), vec!["A.", "A. B.", "B. C."]);
        assert_eq!(service.default_options().overlap, 0);
    }

    #[tokio::test]
    async fn updates_apply_on_top_of_replaced_options() {
        let service = mock_service();
        let replaced = ChunkingOptions {
            max_tokens: 1,
            ..ChunkingOptions::default()
        };
        let request = ChunkDocumentRequest::new(ChunkSource::PlainText("A. B. C.".to_string()))
            .with_embedder(EmbedderKind::Provider(Arc::new(ConstantProvider)))
            .with_options(replaced)
            .update_options(|options| options.min_similarity = 0.0)
            .update_options(|options| options.max_tokens = 2);
        let response = service.chunk_document(request).await.unwrap();
        assert_eq!(response.texts(), vec!["A. B.", "C."]);
    }

    #[tokio::test]
    async fn unreadable_path_is_invalid_input_not_missing() {
        let result = mock_service()
            .chunk_document(ChunkDocumentRequest::new(ChunkSource::FilePath(
                PathBuf::from("bad\0name.txt"),
            )))
            .await;
        assert!(matches!(result, Err(ChunkingError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn dyn_rig_models_use_the_given_label() {
        let model: Arc<dyn EmbeddingModelDyn> = Arc::new(AxisEmbeddingModel);
        let service = SemanticChunkingService::builder()
            .with_rig_model_dyn(model, Some("axis-2d".to_string()))
            .build();
        let request = ChunkDocumentRequest::new(ChunkSource::PlainText("One. Two.".to_string()));
        let response = service.chunk_document(request).await.unwrap();
        assert_eq!(response.telemetry.embedder, "axis-2d");
        assert_eq!(response.texts(), vec!["One. Two."]);
    }

    #[tokio::test]
    async fn request_options_override_defaults() {
        let service = mock_service();
        let request = ChunkDocumentRequest::new(ChunkSource::PlainText(
            "A. B. C.".to_string(),
        ))
        .update_options(|options| {
            options.max_tokens = 1;
            options.min_similarity = 0.0;
        });
        let response = service.chunk_document(request).await.unwrap();
        assert_eq!(response.texts(), vec!["A.", "B.", "C."]);

        let invalid = ChunkDocumentRequest::new(ChunkSource::PlainText("A.".to_string()))
            .update_options(|options| options.max_tokens = 0);
        assert!(matches!(
            service.chunk_document(invalid).await,
            Err(ChunkingError::InvalidConfiguration { .. })
        ));
    }
}
