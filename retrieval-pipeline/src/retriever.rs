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
use tracing::debug;

use crate::RetrievedChunk;

/// Read side of the vector store. Holds the index rows and the chunk
/// metadata in memory, joined by position.
pub struct CorpusRetriever {
    provider: EmbeddingProvider,
    index: VectorIndex,
    chunks: Vec<CorpusChunk>,
}

impl std::fmt::Debug for CorpusRetriever {
    /// Manual impl: the embedding provider holds backend handles without
    /// `Debug`, so only the store's identity is shown.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorpusRetriever")
            .field("backend", &self.provider.backend_label())
            .field("model", &self.provider.model_code())
            .field("dimension", &self.provider.dimension())
            .field("chunk_count", &self.chunks.len())
            .finish_non_exhaustive()
    }
}

impl CorpusRetriever {
    /// Opens a persisted store and verifies it is usable with `provider`:
    /// both files present, row and line counts equal, the chunk digest
    /// unchanged, and the embedding space identity matching. A store that
    /// fails any of these checks must be rebuilt, not queried.
    pub fn open(
        provider: EmbeddingProvider,
        index_path: &Path,
        metadata_path: &Path,
    ) -> Result<Self, RagError> {
        let persisted = PersistedIndex::load(index_path)?;

        if !metadata_path.exists() {
            return Err(RagError::IndexNotFound(format!(
                "no chunk metadata at {}. Run the build step first.",
                metadata_path.display()
            )));
        }
        let chunks = metadata::load_chunks(metadata_path)?;

        if chunks.len() != persisted.index.len() {
            return Err(RagError::CorpusMismatch(format!(
                "index has {} rows but metadata lists {} chunks",
                persisted.index.len(),
                chunks.len()
            )));
        }
        if chunk_digest(&chunks) != persisted.chunk_digest {
            return Err(RagError::CorpusMismatch(
                "chunk metadata does not match the corpus the index was built from; \
                 rebuild the vector store"
                    .to_string(),
            ));
        }
        if provider.backend_label() != persisted.embedding_backend {
            return Err(RagError::CorpusMismatch(format!(
                "index was built with the '{}' embedding backend but '{}' is configured",
                persisted.embedding_backend,
                provider.backend_label()
            )));
        }
        if provider.model_code() != persisted.embedding_model {
            return Err(RagError::CorpusMismatch(format!(
                "index was built with embedding model {:?} but {:?} is configured",
                persisted.embedding_model,
                provider.model_code()
            )));
        }
        if provider.dimension() != persisted.index.dimension() {
            return Err(RagError::CorpusMismatch(format!(
                "index dimension {} does not match the provider dimension {}",
                persisted.index.dimension(),
                provider.dimension()
            )));
        }

        debug!(
            chunk_count = chunks.len(),
            dimension = persisted.index.dimension(),
            "opened vector store"
        );

        Ok(Self {
            provider,
            index: persisted.index,
            chunks,
        })
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Embeds `query` and returns up to `top_k` chunks ordered by
    /// descending similarity.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, RagError> {
        if top_k == 0 {
            return Err(RagError::Configuration(
                "top_k must be greater than zero".to_string(),
            ));
        }

        let embedding = self
            .provider
            .embed(query)
            .await
            .map_err(|err| RagError::Embedding(format!("embedding query: {err:#}")))?;

        let hits = self.index.search(&embedding, top_k)?;
        debug!(hits = hits.len(), top_k, "retrieved supporting chunks");

        let retrieved = hits
            .into_iter()
            .map(|(row, score)| RetrievedChunk {
                chunk: self.chunks[row].clone(),
                score,
            })
            .collect();
        Ok(retrieved)
    }
}
