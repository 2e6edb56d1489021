use std::{cmp::Ordering, fs, path::Path};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{error::RagError, storage::types::CorpusChunk, utils::vector_ops};

/// Flat inner-product index. Vectors are L2-normalised on insertion so the
/// inner product against a normalised query is cosine similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn add(&mut self, mut vector: Vec<f32>) -> Result<(), RagError> {
        if vector.len() != self.dimension {
            return Err(RagError::Embedding(format!(
                "embedding dimension {} does not match index dimension {}",
                vector.len(),
                self.dimension
            )));
        }
        vector_ops::normalize_l2(&mut vector);
        self.vectors.push(vector);
        Ok(())
    }

    /// Exhaustive scan returning up to `top_k` `(row, score)` pairs ordered by
    /// descending score. Equal scores keep insertion order.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<(usize, f32)>, RagError> {
        if query.len() != self.dimension {
            return Err(RagError::CorpusMismatch(format!(
                "query embedding dimension {} does not match index dimension {}",
                query.len(),
                self.dimension
            )));
        }

        let mut query = query.to_vec();
        vector_ops::normalize_l2(&mut query);

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(row, vector)| (row, vector_ops::dot(&query, vector)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }
}

/// Digest over the ordered chunk ids. Ties the index rows to the metadata
/// lines they were built from.
pub fn chunk_digest(chunks: &[CorpusChunk]) -> String {
    let mut hasher = Sha256::new();
    for chunk in chunks {
        hasher.update(chunk.id.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

/// On-disk form of the index plus the identity of the embedding space it was
/// built in. Queries embedded with a different backend or model are invalid
/// against these rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedIndex {
    pub embedding_backend: String,
    pub embedding_model: Option<String>,
    pub chunk_digest: String,
    pub index: VectorIndex,
}

impl PersistedIndex {
    pub fn save(&self, path: &Path) -> Result<(), RagError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let encoded = bincode::serialize(self)?;
        fs::write(path, encoded)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, RagError> {
        if !path.exists() {
            return Err(RagError::IndexNotFound(format!(
                "no vector index at {}. Run the build step first.",
                path.display()
            )));
        }
        let encoded = fs::read(path)?;
        let persisted = bincode::deserialize(&encoded)?;
        Ok(persisted)
    }
}
