use serde::{Deserialize, Serialize};

/// One retrievable passage of the corpus. The `id` encodes the chunk's
/// position so the vector index row and the metadata line can be joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusChunk {
    pub id: String,
    pub text: String,
}

impl CorpusChunk {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    pub fn with_position(prefix: &str, position: usize, text: impl Into<String>) -> Self {
        Self {
            id: format!("{prefix}_{position}"),
            text: text.into(),
        }
    }
}
