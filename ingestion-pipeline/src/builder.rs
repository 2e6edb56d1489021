use std::path::Path;

use common::{
    error::RagError,
    storage::{
        metadata,
        types::CorpusChunk,
        vector_index::{chunk_digest, PersistedIndex, VectorIndex},
    },
    utils::embedding::EmbeddingProvider,
};
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    Retry,
};
use tracing::info;

use crate::chunker::TokenChunker;

pub const EMBED_BATCH_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub chunk_count: usize,
    pub dimension: usize,
}

pub struct VectorStoreBuilder {
    provider: EmbeddingProvider,
    chunker: TokenChunker,
    id_prefix: String,
}

impl VectorStoreBuilder {
    pub fn new(
        provider: EmbeddingProvider,
        chunker: TokenChunker,
        id_prefix: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            chunker,
            id_prefix: id_prefix.into(),
        }
    }

    /// Chunks `text`, embeds every chunk, and persists the store.
    pub async fn build(
        &self,
        text: &str,
        index_path: &Path,
        metadata_path: &Path,
    ) -> Result<BuildSummary, RagError> {
        let chunks = self.chunker.chunk_corpus(text, &self.id_prefix)?;
        self.build_from_chunks(chunks, index_path, metadata_path)
            .await
    }

    /// Embeds pre-chunked records and persists the store. An empty chunk
    /// set is rejected before any embedding work or file I/O happens.
    /// The index is written before the metadata so a metadata file never
    /// describes rows that do not exist.
    pub async fn build_from_chunks(
        &self,
        chunks: Vec<CorpusChunk>,
        index_path: &Path,
        metadata_path: &Path,
    ) -> Result<BuildSummary, RagError> {
        if chunks.is_empty() {
            return Err(RagError::EmptyCorpus(
                "no chunks to index. Check the corpus and chunking parameters.".to_string(),
            ));
        }

        info!(
            chunk_count = chunks.len(),
            backend = self.provider.backend_label(),
            "embedding corpus chunks"
        );
        let index = self.embed_into_index(&chunks).await?;

        let persisted = PersistedIndex {
            embedding_backend: self.provider.backend_label().to_string(),
            embedding_model: self.provider.model_code(),
            chunk_digest: chunk_digest(&chunks),
            index,
        };
        persisted.save(index_path)?;
        metadata::save_chunks(&chunks, metadata_path)?;

        info!(
            chunk_count = chunks.len(),
            dimension = persisted.index.dimension(),
            index = %index_path.display(),
            "vector store written"
        );

        Ok(BuildSummary {
            chunk_count: chunks.len(),
            dimension: persisted.index.dimension(),
        })
    }

    async fn embed_into_index(&self, chunks: &[CorpusChunk]) -> Result<VectorIndex, RagError> {
        let mut index = VectorIndex::new(self.provider.dimension());

        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
            let retry_strategy = ExponentialBackoff::from_millis(100).map(jitter).take(3);

            let embeddings =
                Retry::spawn(retry_strategy, || self.provider.embed_batch(texts.clone()))
                    .await
                    .map_err(|err| {
                        RagError::Embedding(format!(
                            "embedding batch starting at chunk '{}': {err:#}",
                            batch[0].id
                        ))
                    })?;

            if embeddings.len() != batch.len() {
                return Err(RagError::Embedding(format!(
                    "backend returned {} embeddings for a batch of {}",
                    embeddings.len(),
                    batch.len()
                )));
            }

            for embedding in embeddings {
                index.add(embedding)?;
            }
        }

        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::TokenCodec;

    fn test_builder(max_tokens: usize, overlap_tokens: usize) -> VectorStoreBuilder {
        let provider =
            EmbeddingProvider::new_hashed(16).expect("hashed provider construction is infallible");
        let chunker = TokenChunker::new(TokenCodec::Whitespace, max_tokens, overlap_tokens)
            .expect("valid chunker parameters");
        VectorStoreBuilder::new(provider, chunker, "ai_act")
    }

    fn numbered_words(count: usize) -> String {
        (0..count)
            .map(|i| format!("w{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[tokio::test]
    async fn empty_corpus_is_rejected_before_any_files_are_written() {
        let dir = tempfile::tempdir().expect("temp dir");
        let index_path = dir.path().join("vector_index.bin");
        let metadata_path = dir.path().join("chunks_metadata.jsonl");

        let error = test_builder(4, 1)
            .build("   \n\t ", &index_path, &metadata_path)
            .await
            .expect_err("an all-whitespace corpus must be rejected");

        assert!(matches!(error, RagError::EmptyCorpus(_)));
        assert!(!index_path.exists(), "no index may be written");
        assert!(!metadata_path.exists(), "no metadata may be written");
    }

    #[tokio::test]
    async fn build_writes_a_consistent_index_and_metadata_pair() {
        let dir = tempfile::tempdir().expect("temp dir");
        let index_path = dir.path().join("store").join("vector_index.bin");
        let metadata_path = dir.path().join("store").join("chunks_metadata.jsonl");

        let summary = test_builder(4, 1)
            .build(&numbered_words(10), &index_path, &metadata_path)
            .await
            .expect("building the store should succeed");

        assert_eq!(summary.chunk_count, 3);
        assert_eq!(summary.dimension, 16);

        let persisted = PersistedIndex::load(&index_path).expect("index should load");
        let chunks = metadata::load_chunks(&metadata_path).expect("metadata should load");

        assert_eq!(persisted.index.len(), chunks.len());
        assert_eq!(persisted.embedding_backend, "hashed");
        assert_eq!(persisted.embedding_model, None);
        assert_eq!(persisted.chunk_digest, chunk_digest(&chunks));
        assert_eq!(chunks[0].id, "ai_act_0");
        assert_eq!(chunks[2].id, "ai_act_2");
    }

    #[tokio::test]
    async fn rebuilding_the_same_corpus_is_idempotent() {
        let dir = tempfile::tempdir().expect("temp dir");
        let index_path = dir.path().join("vector_index.bin");
        let metadata_path = dir.path().join("chunks_metadata.jsonl");
        let builder = test_builder(4, 1);
        let text = numbered_words(10);

        builder
            .build(&text, &index_path, &metadata_path)
            .await
            .expect("first build should succeed");
        let first_index = PersistedIndex::load(&index_path).expect("index should load");
        let first_chunks = metadata::load_chunks(&metadata_path).expect("metadata should load");

        builder
            .build(&text, &index_path, &metadata_path)
            .await
            .expect("second build should succeed");
        let second_index = PersistedIndex::load(&index_path).expect("index should load");
        let second_chunks = metadata::load_chunks(&metadata_path).expect("metadata should load");

        assert_eq!(first_index, second_index);
        assert_eq!(first_chunks, second_chunks);
    }

    #[tokio::test]
    async fn corpora_larger_than_one_batch_are_fully_indexed() {
        let dir = tempfile::tempdir().expect("temp dir");
        let index_path = dir.path().join("vector_index.bin");
        let metadata_path = dir.path().join("chunks_metadata.jsonl");

        // 100 words at 4 tokens per window with no overlap is 25 chunks,
        // which spans two embedding batches.
        let summary = test_builder(4, 0)
            .build(&numbered_words(100), &index_path, &metadata_path)
            .await
            .expect("building the store should succeed");

        assert_eq!(summary.chunk_count, 25);
        let persisted = PersistedIndex::load(&index_path).expect("index should load");
        assert_eq!(persisted.index.len(), 25);
    }

    #[tokio::test]
    async fn prepared_chunks_can_be_indexed_directly() {
        let dir = tempfile::tempdir().expect("temp dir");
        let index_path = dir.path().join("vector_index.bin");
        let metadata_path = dir.path().join("chunks_metadata.jsonl");
        let chunks = vec![
            CorpusChunk::new("ai_act_0", "Article 5 prohibits social scoring."),
            CorpusChunk::new("ai_act_1", "Article 6 classifies high-risk systems."),
        ];

        let summary = test_builder(4, 1)
            .build_from_chunks(chunks.clone(), &index_path, &metadata_path)
            .await
            .expect("indexing prepared chunks should succeed");

        assert_eq!(summary.chunk_count, 2);
        let reloaded = metadata::load_chunks(&metadata_path).expect("metadata should load");
        assert_eq!(reloaded, chunks, "chunk ids and texts are stored as given");
    }
}
