use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use llm_backends::LlmBackendKind;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// LLM backend to evaluate (openai, claude, mistral, deepseek, llama)
    #[arg(long, default_value = "openai")]
    pub backend: String,

    /// Override the backend's default model name
    #[arg(long)]
    pub model: Option<String>,

    /// Chunks retrieved per question (defaults to the configured top_k)
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Question/gold-answer JSONL dataset (defaults to the configured eval file)
    #[arg(long)]
    pub eval_file: Option<PathBuf>,

    /// Results JSONL destination (defaults to results_<backend>.jsonl)
    #[arg(long)]
    pub results_file: Option<PathBuf>,

    /// Limit the number of questions evaluated (0 = all)
    #[arg(long = "limit", default_value_t = 0)]
    pub limit_arg: usize,

    // Computed fields (not arguments)
    #[arg(skip)]
    pub backend_kind: LlmBackendKind,
    #[arg(skip)]
    pub limit: Option<usize>,
}

impl Config {
    pub fn finalize(&mut self) -> Result<()> {
        self.backend_kind = self
            .backend
            .parse()
            .with_context(|| format!("parsing --backend '{}'", self.backend))?;

        if self.limit_arg == 0 {
            self.limit = None;
        } else {
            self.limit = Some(self.limit_arg);
        }

        if let Some(top_k) = self.top_k {
            if top_k == 0 {
                return Err(anyhow!("--top-k must be greater than zero"));
            }
        }

        if let Some(model) = &self.model {
            if model.trim().is_empty() {
                return Err(anyhow!("--model requires a non-empty model name"));
            }
        }

        Ok(())
    }
}

pub struct ParsedArgs {
    pub config: Config,
}

pub fn parse() -> Result<ParsedArgs> {
    let mut config = Config::parse();
    config.finalize()?;
    Ok(ParsedArgs { config })
}

pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating parent directory for {}", path.display()))?;
    }
    Ok(())
}
