use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use llm_backends::{GenerationOptions, LlmClient};
use retrieval_pipeline::{answer_question, CorpusRetriever};
use tracing::{error, info};

use crate::{
    args,
    dataset::{EvalExample, ResultRecord},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchSummary {
    pub answered: usize,
    pub failed: usize,
}

/// Runs every example through retrieve, prompt and generate, one at a
/// time, appending a result line as soon as each question finishes. A
/// failed generation is recorded in `model_answer` and the batch keeps
/// going; only I/O errors on the results file abort the run.
pub async fn run_batch(
    retriever: &CorpusRetriever,
    llm: &dyn LlmClient,
    examples: &[EvalExample],
    regulation_name: &str,
    top_k: usize,
    options: &GenerationOptions,
    results_path: &Path,
) -> Result<BatchSummary> {
    args::ensure_parent(results_path)?;
    let file = File::create(results_path)
        .with_context(|| format!("creating results file {}", results_path.display()))?;
    let mut writer = BufWriter::new(file);

    let mut summary = BatchSummary::default();
    for example in examples {
        info!(
            id = example.id,
            backend = llm.label(),
            "Answering evaluation question"
        );

        let (model_answer, contexts) = match answer_question(
            retriever,
            llm,
            &example.question,
            regulation_name,
            top_k,
            options,
        )
        .await
        {
            Ok(answered) => {
                summary.answered += 1;
                (
                    answered.answer,
                    answered
                        .contexts
                        .into_iter()
                        .map(|chunk| chunk.text)
                        .collect(),
                )
            }
            Err(err) => {
                let err = anyhow::Error::from(err);
                let reason = format!("generation failed: {err:#}");
                error!(
                    id = example.id,
                    reason = reason.as_str(),
                    "Recording the failure and continuing"
                );
                summary.failed += 1;
                (reason, Vec::new())
            }
        };

        let record = ResultRecord {
            id: example.id,
            question: example.question.clone(),
            gold_answer: example.answer.clone(),
            model_answer,
            contexts,
        };
        let line = serde_json::to_string(&record).context("serialising result record")?;
        writeln!(writer, "{line}")
            .with_context(|| format!("writing result record to {}", results_path.display()))?;
        writer
            .flush()
            .with_context(|| format!("flushing results file {}", results_path.display()))?;
    }

    Ok(summary)
}
