use std::{
    fs::{self, File},
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};

use crate::storage::types::CorpusChunk;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating parent directory for {}", path.display()))?;
    }
    Ok(())
}

/// Writes chunks as JSON Lines, one object per chunk, in corpus order.
pub fn save_chunks(chunks: &[CorpusChunk], path: &Path) -> Result<()> {
    ensure_parent(path)?;

    let file = File::create(path)
        .with_context(|| format!("creating chunk metadata file at {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    for chunk in chunks {
        let line = serde_json::to_string(chunk)
            .with_context(|| format!("serialising chunk '{}'", chunk.id))?;
        writeln!(writer, "{line}")
            .with_context(|| format!("writing chunk metadata to {}", path.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("flushing chunk metadata at {}", path.display()))
}

/// Reads chunks back in file order. Blank lines are skipped, any other
/// malformed line fails the whole load with its line number.
pub fn load_chunks(path: &Path) -> Result<Vec<CorpusChunk>> {
    let file = File::open(path)
        .with_context(|| format!("opening chunk metadata at {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut chunks = Vec::new();
    for (line_idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| {
            format!(
                "reading chunk metadata line {} from {}",
                line_idx + 1,
                path.display()
            )
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let chunk: CorpusChunk = serde_json::from_str(&line).with_context(|| {
            format!(
                "parsing chunk metadata (line {}) at {}",
                line_idx + 1,
                path.display()
            )
        })?;
        chunks.push(chunk);
    }

    Ok(chunks)
}
