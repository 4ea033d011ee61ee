//! Distance-ranked, token-budgeted context assembly.
//!
//! The query embedding is compared against every stored record by cosine
//! distance, records are ranked nearest-first, and their texts are packed
//! greedily into a context string until the token budget would overflow.
//! Packing stops at the first record that does not fit; later, smaller
//! records are never pulled forward past it.

use crate::embedding::{cosine_distance, embed_query, EmbeddingProvider};
use crate::error::Result;
use crate::models::CorpusRecord;
use crate::store::CorpusHandle;

/// Separator between packed record texts.
pub const CONTEXT_SEPARATOR: &str = "\n\n###\n\n";

/// Per-record overhead charged against the budget, covering the separator.
const RECORD_OVERHEAD_TOKENS: usize = 4;

/// Rank `records` by cosine distance to `query` and greedily pack their
/// texts under `max_context_tokens`.
///
/// Each record costs its own token count plus [`RECORD_OVERHEAD_TOKENS`].
/// Ties in distance keep the records' stored order. Records without an
/// embedding are skipped. An empty corpus, or a budget too small for even
/// the nearest record, yields an empty string.
pub fn rank_and_pack(
    query: &[f32],
    records: &[CorpusRecord],
    max_context_tokens: usize,
) -> Result<String> {
    let mut ranked: Vec<(f32, &CorpusRecord)> = Vec::with_capacity(records.len());
    for record in records {
        let Some(embedding) = &record.embedding else {
            continue;
        };
        ranked.push((cosine_distance(query, embedding)?, record));
    }

    // Stable sort: equal distances keep insertion order.
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut used = 0usize;
    let mut parts: Vec<&str> = Vec::new();
    for (_, record) in &ranked {
        let cost = record.token_count + RECORD_OVERHEAD_TOKENS;
        if used + cost > max_context_tokens {
            break;
        }
        used += cost;
        parts.push(&record.text);
    }

    Ok(parts.join(CONTEXT_SEPARATOR))
}

/// Embed `question` and assemble its context from `corpus`.
pub async fn retrieve_context(
    provider: &dyn EmbeddingProvider,
    question: &str,
    corpus: &CorpusHandle,
    max_context_tokens: usize,
) -> Result<String> {
    let query = embed_query(provider, question).await?;
    rank_and_pack(&query, corpus.records(), max_context_tokens)
}
