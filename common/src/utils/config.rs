use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Copy, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackendKind {
    FastEmbed,
    OpenAI,
    Hashed,
}

impl EmbeddingBackendKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::FastEmbed => "fastembed",
            Self::OpenAI => "openai",
            Self::Hashed => "hashed",
        }
    }
}

fn default_embedding_backend() -> EmbeddingBackendKind {
    EmbeddingBackendKind::FastEmbed
}

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_corpus_name")]
    pub corpus_name: String,
    #[serde(default = "default_regulation_name")]
    pub regulation_name: String,
    #[serde(default = "default_chunk_max_tokens")]
    pub chunk_max_tokens: usize,
    #[serde(default = "default_chunk_overlap_tokens")]
    pub chunk_overlap_tokens: usize,
    #[serde(default = "default_embedding_backend")]
    pub embedding_backend: EmbeddingBackendKind,
    #[serde(default)]
    pub embedding_model: Option<String>,
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_llm_request_timeout_secs")]
    pub llm_request_timeout_secs: u64,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default)]
    pub mistral_api_key: Option<String>,
    #[serde(default)]
    pub hf_token: Option<String>,
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_corpus_name() -> String {
    "ai_act".to_string()
}

fn default_regulation_name() -> String {
    "EU AI Act".to_string()
}

fn default_chunk_max_tokens() -> usize {
    512
}

fn default_chunk_overlap_tokens() -> usize {
    64
}

fn default_embedding_dimensions() -> usize {
    1536
}

fn default_top_k() -> usize {
    5
}

fn default_llm_request_timeout_secs() -> u64 {
    60
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

impl AppConfig {
    pub fn raw_corpus_file(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
            .join("raw")
            .join(format!("{}.txt", self.corpus_name))
    }

    pub fn chunks_file(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
            .join("processed")
            .join(format!("{}_chunks.jsonl", self.corpus_name))
    }

    pub fn vector_store_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
            .join("processed")
            .join("vector_store")
    }

    pub fn index_file(&self) -> PathBuf {
        self.vector_store_dir().join("vector_index.bin")
    }

    pub fn metadata_file(&self) -> PathBuf {
        self.vector_store_dir().join("chunks_metadata.jsonl")
    }

    pub fn eval_file(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
            .join("eval")
            .join(format!("{}_eval.jsonl", self.corpus_name))
    }

    pub fn results_file(&self, backend_label: &str) -> PathBuf {
        PathBuf::from(&self.data_dir)
            .join("eval")
            .join(format!("results_{backend_label}.jsonl"))
    }
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}
