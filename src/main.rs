use std::path::PathBuf;
use std::sync::Arc;

use miette::{IntoDiagnostic, Result};
use tracing_error::ErrorLayer;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use semantic_chunker::semantic_chunking::{
    ChunkDocumentRequest, ChunkSource, ChunkingOptions, DocumentStatus, MockEmbeddingProvider,
    SemanticChunkingService,
};

fn init_tracing() {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::CLOSE);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("error,semantic_chunker=info"))
        .unwrap_or_else(|_| EnvFilter::new("error"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    miette::set_panic_hook();

    // Usage: semantic-chunker <file.txt>   (options from SEMANTIC_CHUNKER_* env vars)
    let Some(path) = std::env::args().nth(1).map(PathBuf::from) else {
        println!("usage: semantic-chunker <file.txt>");
        return Ok(());
    };

    let options = ChunkingOptions::from_env()?;
    let service = SemanticChunkingService::builder()
        .with_options(options)
        .with_embedding_provider(Arc::new(MockEmbeddingProvider::new()))
        .build();

    let response = service
        .chunk_document(ChunkDocumentRequest::new(ChunkSource::FilePath(path.clone())))
        .await?;

    match response.telemetry.status {
        DocumentStatus::Success => {
            for chunk in &response.outcome.chunks {
                println!(
                    "--- chunk {} ({} tokens, sentences {}..{}) ---",
                    chunk.index, chunk.tokens, chunk.sentences.start, chunk.sentences.end
                );
                println!("{}", chunk.content);
            }
        }
        status => println!("{}: {:?}", path.display(), status),
    }

    let summary = serde_json::to_string_pretty(&response.telemetry).into_diagnostic()?;
    eprintln!("{summary}");
    Ok(())
}
