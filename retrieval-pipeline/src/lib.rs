pub mod answer;
pub mod retriever;

use common::storage::types::CorpusChunk;

pub use answer::{answer_question, build_rag_prompt, AnsweredQuestion};
pub use retriever::CorpusRetriever;

// Captures a supporting chunk plus its similarity score for downstream prompts.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub chunk: CorpusChunk,
    pub score: f32,
}
