use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use common::{
    error::RagError,
    storage::types::CorpusChunk,
    utils::embedding::EmbeddingProvider,
};
use ingestion_pipeline::{TokenChunker, TokenCodec, VectorStoreBuilder};
use llm_backends::{GenerationOptions, LlmClient};

// Three passages with disjoint wording so similarity ranks them unambiguously.
pub const ARTICLE_5: &str = "Article 5 prohibits social scoring practices by public authorities.";
pub const ARTICLE_6: &str = "Article 6 lays down classification rules for high-risk systems.";
pub const ARTICLE_52: &str = "Article 52 imposes transparency obligations on chatbot deployers.";

pub fn known_chunks() -> Vec<CorpusChunk> {
    vec![
        CorpusChunk::new("ai_act_0", ARTICLE_5),
        CorpusChunk::new("ai_act_1", ARTICLE_6),
        CorpusChunk::new("ai_act_2", ARTICLE_52),
    ]
}

pub fn store_paths(dir: &Path) -> (PathBuf, PathBuf) {
    (
        dir.join("vector_index.bin"),
        dir.join("chunks_metadata.jsonl"),
    )
}

pub fn test_chunker() -> TokenChunker {
    TokenChunker::new(TokenCodec::Whitespace, 64, 8).expect("valid chunker parameters")
}

/// Builds a store from the three known passages, without re-chunking them,
/// and returns the provider the store was embedded with.
pub async fn build_known_store(dir: &Path, dimension: usize) -> EmbeddingProvider {
    let provider = EmbeddingProvider::new_hashed(dimension).expect("hashed provider");
    let builder = VectorStoreBuilder::new(provider.clone(), test_chunker(), "ai_act");
    let (index_path, metadata_path) = store_paths(dir);

    builder
        .build_from_chunks(known_chunks(), &index_path, &metadata_path)
        .await
        .expect("building the test store should succeed");

    provider
}

/// Test double that records every prompt and replies with a fixed answer.
pub struct ScriptedLlm {
    prompts: Mutex<Vec<String>>,
    answer: String,
}

impl ScriptedLlm {
    pub fn new(answer: &str) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            answer: answer.to_string(),
        }
    }

    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt log lock").clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn label(&self) -> &'static str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }

    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, RagError> {
        self.prompts
            .lock()
            .expect("prompt log lock")
            .push(prompt.to_string());
        Ok(self.answer.clone())
    }
}
