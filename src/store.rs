//! CSV persistence for the corpus and embeddings tables.
//!
//! Two order-preserving tables are written during ingestion:
//! - **corpus table** `[title, text]`, one row per chunk;
//! - **embeddings table** `[text, n_tokens, embeddings]`, the retrieval unit.
//!
//! Stored vectors use a versioned, length-prefixed textual format
//! (`v1:<dims>:f,f,...`) parsed by a strict parser that fails on malformed
//! input. [`CorpusHandle`] is the explicit in-memory handle over a loaded
//! embeddings table; retrieval and answering take it as a value instead of
//! reaching for process-wide state.

use std::path::Path;

use crate::error::{QaError, Result};
use crate::models::{Chunk, CorpusRecord};

/// Version tag carried by every serialized vector.
pub const VECTOR_FORMAT_VERSION: &str = "v1";

/// Serialize a vector as `v1:<dims>:f,f,...`.
///
/// Components use Rust's shortest round-trip float formatting, so parsing
/// reproduces the exact `f32` values.
pub fn format_vector(vector: &[f32]) -> String {
    let components: Vec<String> = vector.iter().map(|v| v.to_string()).collect();
    format!(
        "{}:{}:{}",
        VECTOR_FORMAT_VERSION,
        vector.len(),
        components.join(",")
    )
}

/// Strictly parse a vector serialized by [`format_vector`].
///
/// Fails on an unknown version, a component count that contradicts the
/// length prefix, or any component that is not a finite float.
pub fn parse_vector(input: &str) -> Result<Vec<f32>> {
    let mut parts = input.splitn(3, ':');
    let version = parts
        .next()
        .ok_or_else(|| QaError::MalformedVector("empty input".into()))?;
    if version != VECTOR_FORMAT_VERSION {
        return Err(QaError::MalformedVector(format!(
            "unknown format version '{}'",
            version
        )));
    }

    let declared: usize = parts
        .next()
        .ok_or_else(|| QaError::MalformedVector("missing length prefix".into()))?
        .parse()
        .map_err(|_| QaError::MalformedVector("invalid length prefix".into()))?;

    let body = parts
        .next()
        .ok_or_else(|| QaError::MalformedVector("missing vector body".into()))?;

    if declared == 0 {
        if !body.is_empty() {
            return Err(QaError::MalformedVector(
                "length prefix 0 with non-empty body".into(),
            ));
        }
        return Ok(Vec::new());
    }

    let mut vector = Vec::with_capacity(declared);
    for component in body.split(',') {
        let value: f32 = component
            .parse()
            .map_err(|_| QaError::MalformedVector(format!("invalid component '{}'", component)))?;
        if !value.is_finite() {
            return Err(QaError::MalformedVector(format!(
                "non-finite component '{}'",
                component
            )));
        }
        vector.push(value);
    }

    if vector.len() != declared {
        return Err(QaError::MalformedVector(format!(
            "length prefix {} but {} components",
            declared,
            vector.len()
        )));
    }

    Ok(vector)
}

/// Write the corpus table: `[title, text]`, one row per chunk, in order.
pub fn write_corpus_csv(path: &Path, chunks: &[Chunk]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["title", "text"])?;
    for chunk in chunks {
        writer.write_record([chunk.source_identifier.as_str(), chunk.text.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the embeddings table: `[text, n_tokens, embeddings]`, in order.
///
/// Every record must already carry a vector; a missing one fails the write
/// rather than silently producing a partially embedded table.
pub fn write_embeddings_csv(path: &Path, records: &[CorpusRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["text", "n_tokens", "embeddings"])?;
    for (index, record) in records.iter().enumerate() {
        let embedding = record
            .embedding
            .as_deref()
            .ok_or(QaError::MissingEmbedding(index))?;
        writer.write_record([
            record.text.as_str(),
            &record.token_count.to_string(),
            &format_vector(embedding),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// In-memory view over a loaded embeddings table.
///
/// Built once by [`CorpusHandle::load`] and passed explicitly to retrieval
/// and answering. Records keep their table order; ranking never reorders
/// them here.
#[derive(Debug, Clone)]
pub struct CorpusHandle {
    records: Vec<CorpusRecord>,
    dims: usize,
}

impl CorpusHandle {
    /// Load an embeddings CSV written by [`write_embeddings_csv`].
    ///
    /// All vectors must share one dimensionality; a ragged table fails with
    /// [`QaError::DimensionMismatch`].
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut records = Vec::new();

        for row in reader.records() {
            let row = row?;
            let text = row
                .get(0)
                .ok_or_else(|| QaError::MalformedVector("missing text column".into()))?
                .to_string();
            let token_count: usize = row
                .get(1)
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| QaError::MalformedVector("invalid n_tokens column".into()))?;
            let embedding = parse_vector(
                row.get(2)
                    .ok_or_else(|| QaError::MalformedVector("missing embeddings column".into()))?,
            )?;
            records.push(CorpusRecord {
                text,
                token_count,
                embedding: Some(embedding),
            });
        }

        Self::new(records)
    }

    /// Build a handle from in-memory records, validating that every present
    /// embedding shares one dimensionality.
    pub fn new(records: Vec<CorpusRecord>) -> Result<Self> {
        let mut dims = 0usize;
        for record in &records {
            if let Some(embedding) = &record.embedding {
                if dims == 0 {
                    dims = embedding.len();
                } else if embedding.len() != dims {
                    return Err(QaError::DimensionMismatch {
                        expected: dims,
                        actual: embedding.len(),
                    });
                }
            }
        }
        Ok(Self { records, dims })
    }

    pub fn records(&self) -> &[CorpusRecord] {
        &self.records
    }

    /// Dimensionality of the stored vectors; `0` for an empty corpus.
    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
