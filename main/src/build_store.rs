use anyhow::Context;
use common::{
    storage::metadata,
    utils::{config::get_config, embedding::EmbeddingProvider},
};
use ingestion_pipeline::{TokenChunker, VectorStoreBuilder};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let config = get_config()?;

    let chunks_path = config.chunks_file();
    let chunks = metadata::load_chunks(&chunks_path).with_context(|| {
        format!(
            "loading prepared chunks from {}. Run prepare-corpus first.",
            chunks_path.display()
        )
    })?;
    info!(
        chunk_count = chunks.len(),
        path = %chunks_path.display(),
        "Loaded prepared chunks"
    );

    let provider = EmbeddingProvider::from_config(&config).await?;
    info!(
        backend = provider.backend_label(),
        dimension = provider.dimension(),
        "Embedding provider initialized"
    );

    let chunker = TokenChunker::from_config(&config)?;
    let builder = VectorStoreBuilder::new(provider, chunker, config.corpus_name.as_str());
    let summary = builder
        .build_from_chunks(chunks, &config.index_file(), &config.metadata_file())
        .await?;

    println!(
        "Vector store built: {} chunks indexed ({} dimensions) → {}",
        summary.chunk_count,
        summary.dimension,
        config.vector_store_dir().display()
    );
    Ok(())
}
