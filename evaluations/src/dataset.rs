use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One question/gold-answer pair from the evaluation dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalExample {
    pub id: usize,
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Deserialize)]
struct RawExample {
    #[serde(default)]
    id: Option<usize>,
    question: String,
    answer: String,
}

/// One line of the results file. `contexts` holds the retrieved chunk
/// texts in rank order, without scores, for downstream metric scoring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultRecord {
    pub id: usize,
    pub question: String,
    pub gold_answer: String,
    pub model_answer: String,
    pub contexts: Vec<String>,
}

/// Loads the dataset, skipping blank lines. Records without an `id` get a
/// sequential one, counting parsed records from 1 in file order.
pub fn load_examples(path: &Path) -> Result<Vec<EvalExample>> {
    let file = File::open(path)
        .with_context(|| format!("opening evaluation dataset {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut examples = Vec::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line
            .with_context(|| format!("reading line {} of {}", line_number + 1, path.display()))?;
        if line.trim().is_empty() {
            continue;
        }

        let raw: RawExample = serde_json::from_str(&line).with_context(|| {
            format!(
                "parsing evaluation example on line {} of {}",
                line_number + 1,
                path.display()
            )
        })?;
        let id = raw.id.unwrap_or(examples.len() + 1);
        examples.push(EvalExample {
            id,
            question: raw.question,
            answer: raw.answer,
        });
    }

    Ok(examples)
}
