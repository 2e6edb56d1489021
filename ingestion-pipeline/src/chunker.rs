use std::sync::OnceLock;

use common::{
    error::RagError,
    storage::types::CorpusChunk,
    utils::config::AppConfig,
};
use tracing::debug;

use crate::normalize::normalize_whitespace;

/// How text maps to the token stream the sliding window runs over.
///
/// `Pretrained` uses the same WordPiece vocabulary for sizing that the
/// retrieval embeddings were trained against. `Whitespace` splits on
/// whitespace and needs no model files, which keeps chunking reproducible
/// in offline environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCodec {
    Pretrained,
    Whitespace,
}

#[derive(Debug, Clone)]
pub struct TokenChunker {
    codec: TokenCodec,
    max_tokens: usize,
    overlap_tokens: usize,
}

impl TokenChunker {
    pub fn new(
        codec: TokenCodec,
        max_tokens: usize,
        overlap_tokens: usize,
    ) -> Result<Self, RagError> {
        if max_tokens == 0 {
            return Err(RagError::Configuration(
                "chunk_max_tokens must be greater than zero".to_string(),
            ));
        }
        if overlap_tokens >= max_tokens {
            return Err(RagError::Configuration(format!(
                "chunk_overlap_tokens ({overlap_tokens}) must be smaller than chunk_max_tokens ({max_tokens})"
            )));
        }

        Ok(Self {
            codec,
            max_tokens,
            overlap_tokens,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, RagError> {
        Self::new(
            TokenCodec::Pretrained,
            config.chunk_max_tokens,
            config.chunk_overlap_tokens,
        )
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn overlap_tokens(&self) -> usize {
        self.overlap_tokens
    }

    /// Splits already-normalised text into windows of at most `max_tokens`
    /// tokens, consecutive windows sharing `overlap_tokens`. The final
    /// window ends exactly at the last token, so no text is dropped and no
    /// window is fully contained in the previous one.
    pub fn chunk_text(&self, text: &str) -> Result<Vec<String>, RagError> {
        match self.codec {
            TokenCodec::Whitespace => {
                let tokens: Vec<&str> = text.split_whitespace().collect();
                let chunks = window_bounds(tokens.len(), self.max_tokens, self.step())
                    .into_iter()
                    .map(|(start, end)| tokens[start..end].join(" "))
                    .collect();
                Ok(chunks)
            }
            TokenCodec::Pretrained => {
                let tokenizer = get_tokenizer()?;
                let encoding = tokenizer
                    .encode(text, false)
                    .map_err(|err| RagError::Tokenizer(format!("encoding corpus text: {err}")))?;
                let ids = encoding.get_ids();

                let mut chunks = Vec::new();
                for (start, end) in window_bounds(ids.len(), self.max_tokens, self.step()) {
                    let chunk = tokenizer.decode(&ids[start..end], true).map_err(|err| {
                        RagError::Tokenizer(format!("decoding tokens {start}..{end}: {err}"))
                    })?;
                    chunks.push(chunk.trim().to_string());
                }
                Ok(chunks)
            }
        }
    }

    /// Normalises whitespace, windows the text, and assigns positional ids
    /// `<prefix>_0`, `<prefix>_1`, ... in corpus order.
    pub fn chunk_corpus(&self, text: &str, id_prefix: &str) -> Result<Vec<CorpusChunk>, RagError> {
        let normalized = normalize_whitespace(text);
        let chunks = self
            .chunk_text(&normalized)?
            .into_iter()
            .enumerate()
            .map(|(position, text)| CorpusChunk::with_position(id_prefix, position, text))
            .collect::<Vec<_>>();

        debug!(chunk_count = chunks.len(), "chunked corpus text");
        Ok(chunks)
    }

    fn step(&self) -> usize {
        self.max_tokens - self.overlap_tokens
    }
}

/// `(start, end)` windows over `total` tokens. Advances by `step` and stops
/// after the window whose end reaches `total`.
fn window_bounds(total: usize, max_tokens: usize, step: usize) -> Vec<(usize, usize)> {
    let mut bounds = Vec::new();
    let mut start = 0;
    while start < total {
        let end = (start + max_tokens).min(total);
        bounds.push((start, end));
        if end == total {
            break;
        }
        start += step;
    }
    bounds
}

fn get_tokenizer() -> Result<&'static tokenizers::Tokenizer, RagError> {
    static TOKENIZER: OnceLock<Result<tokenizers::Tokenizer, String>> = OnceLock::new();

    match TOKENIZER.get_or_init(|| {
        tokenizers::Tokenizer::from_pretrained("bert-base-cased", None)
            .map_err(|e| format!("failed to initialize tokenizer: {e}"))
    }) {
        Ok(tokenizer) => Ok(tokenizer),
        Err(err) => Err(RagError::Tokenizer(err.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whitespace_chunker(max_tokens: usize, overlap_tokens: usize) -> TokenChunker {
        TokenChunker::new(TokenCodec::Whitespace, max_tokens, overlap_tokens)
            .expect("valid chunker parameters")
    }

    fn numbered_words(count: usize) -> String {
        (0..count)
            .map(|i| format!("w{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn windows_overlap_and_cover_the_whole_text() {
        let chunker = whitespace_chunker(4, 1);

        let chunks = chunker
            .chunk_text(&numbered_words(10))
            .expect("chunking should succeed");

        assert_eq!(chunks, vec!["w0 w1 w2 w3", "w3 w4 w5 w6", "w6 w7 w8 w9"]);
    }

    #[test]
    fn chunk_count_matches_the_stride_arithmetic() {
        // ceil((len - overlap) / (max - overlap)) windows once len > max
        let cases = [
            (10, 4, 1, 3),
            (12, 4, 1, 4),
            (7, 4, 1, 2),
            (10, 4, 2, 4),
            (3, 4, 1, 1),
            (4, 4, 1, 1),
        ];

        for (word_count, max_tokens, overlap, expected) in cases {
            let chunker = whitespace_chunker(max_tokens, overlap);
            let chunks = chunker
                .chunk_text(&numbered_words(word_count))
                .expect("chunking should succeed");
            assert_eq!(
                chunks.len(),
                expected,
                "len={word_count} max={max_tokens} overlap={overlap}"
            );
        }
    }

    #[test]
    fn short_text_yields_one_window() {
        let chunker = whitespace_chunker(512, 64);
        let chunks = chunker
            .chunk_text("a short passage")
            .expect("chunking should succeed");
        assert_eq!(chunks, vec!["a short passage"]);
    }

    #[test]
    fn empty_text_yields_no_windows() {
        let chunker = whitespace_chunker(4, 1);
        assert!(chunker.chunk_text("").expect("chunking should succeed").is_empty());
        assert!(chunker
            .chunk_text("  \n\t  ")
            .expect("chunking should succeed")
            .is_empty());
    }

    #[test]
    fn invalid_window_parameters_are_rejected_up_front() {
        let overlap_too_large = TokenChunker::new(TokenCodec::Whitespace, 4, 4)
            .expect_err("overlap equal to max must be rejected");
        assert!(matches!(overlap_too_large, RagError::Configuration(_)));

        let zero_window = TokenChunker::new(TokenCodec::Whitespace, 0, 0)
            .expect_err("zero-token windows must be rejected");
        assert!(matches!(zero_window, RagError::Configuration(_)));
    }

    #[test]
    fn corpus_chunks_get_sequential_positional_ids() {
        let chunker = whitespace_chunker(4, 1);
        let chunks = chunker
            .chunk_corpus(&numbered_words(10), "ai_act")
            .expect("chunking should succeed");

        let ids: Vec<&str> = chunks.iter().map(|chunk| chunk.id.as_str()).collect();
        assert_eq!(ids, vec!["ai_act_0", "ai_act_1", "ai_act_2"]);
    }

    #[test]
    fn corpus_text_is_normalised_before_windowing() {
        let chunker = whitespace_chunker(8, 2);
        let chunks = chunker
            .chunk_corpus("Article\t1\r\nScope   and subject", "ai_act")
            .expect("chunking should succeed");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Article 1 Scope and subject");
    }
}
