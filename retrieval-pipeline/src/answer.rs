use common::{error::RagError, storage::types::CorpusChunk};
use llm_backends::{GenerationOptions, LlmClient};
use tracing::instrument;

use crate::retriever::CorpusRetriever;

/// An answer together with the chunks the prompt was grounded on, in
/// retrieval order. Scores are dropped here; callers that need them query
/// the retriever directly.
#[derive(Debug)]
pub struct AnsweredQuestion {
    pub answer: String,
    pub contexts: Vec<CorpusChunk>,
}

/// Assembles the grounded prompt: the retrieved excerpts first, separated
/// by `---` rules, then the question.
pub fn build_rag_prompt(
    question: &str,
    contexts: &[CorpusChunk],
    regulation_name: &str,
) -> String {
    let context_block = contexts
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");

    format!(
        r"You are an assistant specialised in the {regulation_name}.
You must answer strictly based on the following excerpts from the Regulation.
If the information is not present, explicitly say that you cannot answer based only on the provided articles.

CONTEXT (excerpts from the {regulation_name}):

{context_block}

---

QUESTION:
{question}

ANSWER (be precise, formal, and refer explicitly to the Regulation when relevant):
"
    )
}

/// Retrieves supporting chunks, builds the prompt, and asks the model.
/// The model is consulted even when retrieval returns nothing, so it can
/// state that the excerpts do not contain the answer.
#[instrument(skip_all, fields(top_k))]
pub async fn answer_question(
    retriever: &CorpusRetriever,
    llm: &dyn LlmClient,
    question: &str,
    regulation_name: &str,
    top_k: usize,
    options: &GenerationOptions,
) -> Result<AnsweredQuestion, RagError> {
    let contexts: Vec<CorpusChunk> = retriever
        .retrieve(question, top_k)
        .await?
        .into_iter()
        .map(|retrieved| retrieved.chunk)
        .collect();
    let prompt = build_rag_prompt(question, &contexts, regulation_name);
    let answer = llm.generate(&prompt, options).await?;

    Ok(AnsweredQuestion { answer, contexts })
}
