//! Sentence-boundary text chunker.
//!
//! Splits document text on the literal `". "` delimiter and packs sentences
//! into chunks whose token count stays under `max_tokens`. The delimiter is a
//! heuristic, not sentence parsing: abbreviations, decimal numbers, and code
//! snippets over-fragment. A sentence whose token count alone exceeds the
//! budget is dropped entirely — never truncated mid-token — which is an
//! accepted lossy edge case.

use crate::error::Result;
use crate::models::{Chunk, Document};
use crate::tokenizer::Tokenizer;

/// Sentence delimiter for splitting and rejoining.
pub const SENTENCE_DELIMITER: &str = ". ";

/// Split `text` into chunks of at most `max_tokens` tokens each.
///
/// Sentences are counted with one leading space, matching how they will sit
/// after the `". "` join. Each accepted sentence also pays a one-token join
/// overhead toward the running total. Returns an empty sequence for empty
/// input; a delimiter-free text yields one chunk, or zero if it alone
/// exceeds the budget.
pub fn split_sentences(
    tokenizer: &dyn Tokenizer,
    text: &str,
    max_tokens: usize,
) -> Result<Vec<String>> {
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let mut chunks = Vec::new();
    let mut chunk: Vec<&str> = Vec::new();
    let mut tokens_so_far = 0usize;

    for sentence in text.split(SENTENCE_DELIMITER) {
        let sentence_tokens = tokenizer.count_tokens(&format!(" {}", sentence))?;

        // Flush before the accumulator would overflow.
        if tokens_so_far + sentence_tokens > max_tokens && !chunk.is_empty() {
            chunks.push(join_chunk(&chunk));
            chunk.clear();
            tokens_so_far = 0;
        }

        // A sentence that alone exceeds the budget is permanently lost.
        if sentence_tokens > max_tokens {
            continue;
        }

        chunk.push(sentence);
        tokens_so_far += sentence_tokens + 1; // +1 for the ". " join
    }

    // The trailing partial chunk still counts.
    if !chunk.is_empty() {
        chunks.push(join_chunk(&chunk));
    }

    Ok(chunks)
}

fn join_chunk(sentences: &[&str]) -> String {
    format!("{}.", sentences.join(SENTENCE_DELIMITER))
}

/// Chunk one document into corpus-ready [`Chunk`]s, in sentence order.
///
/// A document already within the budget passes through as a single chunk
/// with its text unchanged; longer documents go through [`split_sentences`].
/// Empty documents yield no chunks.
pub fn chunk_document(
    tokenizer: &dyn Tokenizer,
    document: &Document,
    max_tokens: usize,
) -> Result<Vec<Chunk>> {
    if document.raw_text.is_empty() {
        return Ok(Vec::new());
    }

    let total_tokens = tokenizer.count_tokens(&document.raw_text)?;
    let texts = if total_tokens > max_tokens {
        split_sentences(tokenizer, &document.raw_text, max_tokens)?
    } else {
        vec![document.raw_text.clone()]
    };

    let mut chunks = Vec::with_capacity(texts.len());
    for text in texts {
        let token_count = tokenizer.count_tokens(&text)?;
        chunks.push(Chunk {
            source_identifier: document.identifier.clone(),
            text,
            token_count,
        });
    }
    Ok(chunks)
}
