mod args;
mod dataset;
mod runner;

use anyhow::Context;
use common::utils::{config::get_config, embedding::EmbeddingProvider};
use llm_backends::{build_backend, GenerationOptions};
use retrieval_pipeline::CorpusRetriever;
use tokio::runtime::Builder;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> anyhow::Result<()> {
    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    runtime.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _ = fmt()
        .with_env_filter(EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();

    let parsed = args::parse()?;
    let config = get_config().context("loading configuration")?;

    let backend = parsed.config.backend_kind;
    let llm = build_backend(backend, &config, parsed.config.model.clone())
        .context("constructing the LLM backend")?;

    let provider = EmbeddingProvider::from_config(&config)
        .await
        .context("constructing the embedding provider")?;
    let retriever = CorpusRetriever::open(provider, &config.index_file(), &config.metadata_file())
        .context("opening the vector store")?;

    let eval_path = parsed
        .config
        .eval_file
        .clone()
        .unwrap_or_else(|| config.eval_file());
    let mut examples =
        dataset::load_examples(&eval_path).context("loading the evaluation dataset")?;
    if let Some(limit) = parsed.config.limit {
        examples.truncate(limit);
    }

    let results_path = parsed
        .config
        .results_file
        .clone()
        .unwrap_or_else(|| config.results_file(backend.label()));
    let top_k = parsed.config.top_k.unwrap_or(config.top_k);

    info!(
        backend = backend.label(),
        model = llm.model_name(),
        questions = examples.len(),
        top_k,
        dataset = %eval_path.display(),
        "Starting evaluation run"
    );

    let summary = runner::run_batch(
        &retriever,
        llm.as_ref(),
        &examples,
        &config.regulation_name,
        top_k,
        &GenerationOptions::default(),
        &results_path,
    )
    .await
    .context("running the evaluation batch")?;

    println!(
        "[{backend}] Answered {answered}/{total} questions ({failed} failed) → Results: {results}",
        backend = backend.label(),
        answered = summary.answered,
        total = examples.len(),
        failed = summary.failed,
        results = results_path.display(),
    );

    Ok(())
}
