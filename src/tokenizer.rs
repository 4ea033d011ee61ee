//! Token counting.
//!
//! One tokenizer instance is constructed per run and used for every count —
//! chunk budgets, context budgets, and stored `n_tokens` values all come from
//! the same vocabulary. Mixing tokenizers invalidates the budget math.

use std::path::Path;

use crate::config::TokenizerConfig;
use crate::error::{QaError, Result};

/// Approximate chars-per-token ratio for the heuristic tokenizer.
const CHARS_PER_TOKEN: usize = 4;

/// Maps text to a count of model-specific tokens.
///
/// Implementations must be deterministic and side-effect free: the same text
/// always yields the same count within a run.
pub trait Tokenizer: Send + Sync {
    /// Count the tokens in `text`.
    ///
    /// Fails with [`QaError::Encoding`] when the backend cannot process the
    /// text; the error propagates rather than being substituted with a guess.
    fn count_tokens(&self, text: &str) -> Result<usize>;

    /// Identifier for logs and summaries.
    fn name(&self) -> &str;
}

/// chars/4 approximation. Never fails.
///
/// Used when no vocabulary file is configured. Good enough for budget math
/// against models whose exact vocabulary is unavailable locally.
pub struct HeuristicTokenizer;

impl Tokenizer for HeuristicTokenizer {
    fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(text.chars().count().div_ceil(CHARS_PER_TOKEN))
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}

/// Exact counting backed by a HuggingFace `tokenizer.json` vocabulary.
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
    name: String,
}

impl HfTokenizer {
    pub fn from_file(path: &Path) -> Result<Self> {
        let inner = tokenizers::Tokenizer::from_file(path)
            .map_err(|e| QaError::Encoding(format!("load {}: {}", path.display(), e)))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "tokenizer".to_string());
        Ok(Self { inner, name })
    }
}

impl Tokenizer for HfTokenizer {
    fn count_tokens(&self, text: &str) -> Result<usize> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| QaError::Encoding(e.to_string()))?;
        Ok(encoding.get_ids().len())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Create the tokenizer selected by configuration.
///
/// A configured `vocab_file` selects [`HfTokenizer`]; otherwise the
/// [`HeuristicTokenizer`] is used.
pub fn create_tokenizer(config: &TokenizerConfig) -> Result<Box<dyn Tokenizer>> {
    match &config.vocab_file {
        Some(path) => Ok(Box::new(HfTokenizer::from_file(path)?)),
        None => Ok(Box::new(HeuristicTokenizer)),
    }
}
