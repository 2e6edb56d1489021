use async_openai::error::OpenAIError;
use thiserror::Error;
use tokio::task::JoinError;

// Core internal errors
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Empty corpus: {0}")]
    EmptyCorpus(String),
    #[error("Index not found: {0}")]
    IndexNotFound(String),
    #[error("Corpus mismatch: {0}")]
    CorpusMismatch(String),
    #[error("Generation error: {0}")]
    Generation(#[source] anyhow::Error),
    #[error("Embedding error: {0}")]
    Embedding(String),
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),
    #[error("OpenAI error: {0}")]
    OpenAI(#[from] OpenAIError),
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Bincode error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task join error: {0}")]
    Join(#[from] JoinError),
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}
