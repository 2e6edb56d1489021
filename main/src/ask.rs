use anyhow::Context;
use clap::Parser;
use common::utils::{config::get_config, embedding::EmbeddingProvider};
use llm_backends::{build_backend, GenerationOptions, LlmBackendKind};
use retrieval_pipeline::{answer_question, CorpusRetriever};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Question to ask about the indexed regulation
    question: String,

    /// LLM backend to use (openai, claude, mistral, deepseek, llama)
    #[arg(long, default_value = "openai")]
    backend: String,

    /// Override the backend's default model name
    #[arg(long)]
    model: Option<String>,

    /// Chunks retrieved for the answer (defaults to the configured top_k)
    #[arg(long)]
    top_k: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let args = Args::parse();
    let config = get_config()?;

    let backend: LlmBackendKind = args
        .backend
        .parse()
        .with_context(|| format!("parsing --backend '{}'", args.backend))?;
    let llm = build_backend(backend, &config, args.model)?;

    let provider = EmbeddingProvider::from_config(&config).await?;
    let retriever =
        CorpusRetriever::open(provider, &config.index_file(), &config.metadata_file())?;

    let top_k = args.top_k.unwrap_or(config.top_k);
    info!(
        backend = backend.label(),
        model = llm.model_name(),
        top_k,
        "Answering question"
    );

    let answered = answer_question(
        &retriever,
        llm.as_ref(),
        &args.question,
        &config.regulation_name,
        top_k,
        &GenerationOptions::default(),
    )
    .await?;

    println!("QUESTION:");
    println!("{}", args.question);
    println!("\nANSWER:");
    println!("{}", answered.answer);

    println!("\n--- CONTEXTS USED ---");
    for (rank, context) in answered.contexts.iter().enumerate() {
        println!("\n[CONTEXT {rank}] ID={}", context.id);
        println!("{}", preview(&context.text, 400));
    }

    Ok(())
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{truncated} ...")
}
