//! Core data types that flow through the ingestion and answering pipeline.

/// Raw `(identifier, text)` pair produced by a source adapter.
/// Immutable once handed to the chunker.
#[derive(Debug, Clone)]
pub struct Document {
    pub identifier: String,
    pub raw_text: String,
}

/// A token-bounded slice of one document's text.
///
/// One document yields 1..N chunks, ordered by original sentence position.
/// Never mutated after creation.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub source_identifier: String,
    pub text: String,
    pub token_count: usize,
}

/// One row of the retrieval corpus.
///
/// The embedding stays `None` until the embedding store populates it; once
/// set it is never recomputed for that text. Records are appended in chunk
/// order and never reordered in storage — ranking produces a view.
#[derive(Debug, Clone)]
pub struct CorpusRecord {
    pub text: String,
    pub token_count: usize,
    pub embedding: Option<Vec<f32>>,
}

impl CorpusRecord {
    pub fn from_chunk(chunk: &Chunk) -> Self {
        Self {
            text: chunk.text.clone(),
            token_count: chunk.token_count,
            embedding: None,
        }
    }
}
