//! Typed error taxonomy for the question-answering pipeline.
//!
//! Structural and configuration errors ([`QaError::Encoding`],
//! [`QaError::DimensionMismatch`], [`QaError::BudgetExceeded`]) indicate
//! misconfiguration and propagate to the caller unmodified. Provider errors
//! are recovered at the boundary closest to the network call and surfaced as
//! [`QaError::Provider`], so callers can always tell "the provider failed"
//! apart from "the model legitimately produced a short answer".

use thiserror::Error;

/// Errors that can occur during ingestion, retrieval, or answering.
#[derive(Error, Debug)]
pub enum QaError {
    /// The tokenizer backend could not process the input text.
    #[error("tokenizer encoding failed: {0}")]
    Encoding(String),

    /// Query and corpus embeddings have incompatible dimensionality.
    /// Distance is undefined here; vectors are never padded or truncated.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The configured context and answer budgets do not fit the model's
    /// hard context window. Raised before any network call is attempted.
    #[error(
        "context budget {context} + answer budget {answer} exceeds model window {hard_window}"
    )]
    BudgetExceeded {
        context: usize,
        answer: usize,
        hard_window: usize,
    },

    /// The external embedding or completion provider failed after retries.
    #[error("provider error: {0}")]
    Provider(String),

    /// A stored embedding vector did not parse under the strict format.
    #[error("malformed embedding vector: {0}")]
    MalformedVector(String),

    /// A corpus record reached the embeddings table without a vector.
    #[error("corpus record {0} has no embedding")]
    MissingEmbedding(usize),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, QaError>;
