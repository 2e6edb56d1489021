use anyhow::Context;
use common::{storage::metadata, utils::config::get_config};
use ingestion_pipeline::TokenChunker;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let config = get_config()?;

    let raw_path = config.raw_corpus_file();
    let text = std::fs::read_to_string(&raw_path)
        .with_context(|| format!("reading raw corpus {}", raw_path.display()))?;
    info!(
        path = %raw_path.display(),
        characters = text.len(),
        "Loaded raw corpus"
    );

    let chunker = TokenChunker::from_config(&config)?;
    let chunks = chunker.chunk_corpus(&text, &config.corpus_name)?;
    info!(chunk_count = chunks.len(), "Generated corpus chunks");

    let chunks_path = config.chunks_file();
    metadata::save_chunks(&chunks, &chunks_path)?;

    println!("{} chunks saved to {}", chunks.len(), chunks_path.display());
    Ok(())
}
