//! TOML configuration parsing and validation.
//!
//! One [`Config`] covers sources, chunking, tokenizer, providers, and
//! output paths. [`load_config`] validates after parsing so misconfigured
//! budgets and providers fail at startup, not mid-run.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::answer::ModelLimits;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub sources: SourcesConfig,
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SourcesConfig {
    /// Source-code trees to walk.
    #[serde(default)]
    pub tree: Vec<TreeSourceConfig>,
    /// Directories of pre-crawled page files.
    #[serde(default)]
    pub pages: Vec<PagesSourceConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TreeSourceConfig {
    pub root: PathBuf,
    /// File extension to include, without the leading dot (e.g. `go`, `rs`).
    pub extension: String,
    #[serde(default = "default_exclude_tests")]
    pub exclude_tests: bool,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

fn default_exclude_tests() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct PagesSourceConfig {
    pub dir: PathBuf,
    /// Characters stripped from the front of each file name to form the title.
    #[serde(default = "default_strip_prefix")]
    pub strip_prefix: usize,
    /// Characters stripped from the end of each file name (the extension).
    #[serde(default = "default_strip_suffix")]
    pub strip_suffix: usize,
}

fn default_strip_prefix() -> usize {
    11
}
fn default_strip_suffix() -> usize {
    4
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    pub max_tokens: usize,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TokenizerConfig {
    /// Path to a HuggingFace `tokenizer.json`. Unset selects the heuristic
    /// chars-per-token counter.
    #[serde(default)]
    pub vocab_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_dims")]
    pub dims: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dims: default_dims(),
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_embedding_provider() -> String {
    "openai".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_dims() -> usize {
    1536
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    #[serde(default = "default_completion_provider")]
    pub provider: String,
    #[serde(default = "default_completion_model")]
    pub model: String,
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: usize,
    #[serde(default = "default_max_answer_tokens")]
    pub max_answer_tokens: usize,
    #[serde(default = "default_hard_window")]
    pub hard_window: usize,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default)]
    pub stop_sequence: Option<String>,
    #[serde(default = "default_completion_retries")]
    pub max_retries: u32,
    #[serde(default = "default_completion_timeout")]
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: default_completion_provider(),
            model: default_completion_model(),
            max_context_tokens: default_max_context_tokens(),
            max_answer_tokens: default_max_answer_tokens(),
            hard_window: default_hard_window(),
            temperature: 0.0,
            stop_sequence: None,
            max_retries: default_completion_retries(),
            timeout_secs: default_completion_timeout(),
        }
    }
}

impl CompletionConfig {
    pub fn limits(&self) -> ModelLimits {
        ModelLimits {
            max_context_tokens: self.max_context_tokens,
            max_answer_tokens: self.max_answer_tokens,
            hard_window: self.hard_window,
            temperature: self.temperature,
            stop_sequence: self.stop_sequence.clone(),
        }
    }
}

fn default_completion_provider() -> String {
    "openai".to_string()
}
fn default_completion_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_max_context_tokens() -> usize {
    1800
}
fn default_max_answer_tokens() -> usize {
    150
}
fn default_hard_window() -> usize {
    8192
}
fn default_completion_retries() -> u32 {
    3
}
fn default_completion_timeout() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_corpus_csv")]
    pub corpus_csv: PathBuf,
    #[serde(default = "default_embeddings_csv")]
    pub embeddings_csv: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            corpus_csv: default_corpus_csv(),
            embeddings_csv: default_embeddings_csv(),
        }
    }
}

fn default_corpus_csv() -> PathBuf {
    PathBuf::from("processed/corpus.csv")
}
fn default_embeddings_csv() -> PathBuf {
    PathBuf::from("processed/embeddings.csv")
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate chunking
    if config.chunking.max_tokens == 0 {
        anyhow::bail!("chunking.max_tokens must be > 0");
    }

    // Validate embedding
    if config.embedding.dims == 0 {
        anyhow::bail!("embedding.dims must be > 0");
    }
    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be > 0");
    }
    match config.embedding.provider.as_str() {
        "openai" => {}
        other => anyhow::bail!("Unknown embedding provider: '{}'. Must be openai.", other),
    }

    // Validate completion budgets. The answerer re-checks this before every
    // call; failing at load time catches the misconfiguration earlier.
    let c = &config.completion;
    if c.max_context_tokens + c.max_answer_tokens > c.hard_window {
        anyhow::bail!(
            "completion.max_context_tokens ({}) + completion.max_answer_tokens ({}) exceed completion.hard_window ({})",
            c.max_context_tokens,
            c.max_answer_tokens,
            c.hard_window
        );
    }
    if !(0.0..=2.0).contains(&c.temperature) {
        anyhow::bail!("completion.temperature must be in [0.0, 2.0]");
    }
    match c.provider.as_str() {
        "openai" => {}
        other => anyhow::bail!("Unknown completion provider: '{}'. Must be openai.", other),
    }

    // Validate sources
    for tree in &config.sources.tree {
        if tree.extension.is_empty() || tree.extension.starts_with('.') {
            anyhow::bail!(
                "sources.tree.extension must be a bare extension (got '{}')",
                tree.extension
            );
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("cqa.toml");
        std::fs::write(&path, content).unwrap();
        (tmp, path)
    }

    #[test]
    fn test_minimal_config() {
        let (_tmp, path) = write_config("[chunking]\nmax_tokens = 500\n");
        let config = load_config(&path).unwrap();
        assert_eq!(config.chunking.max_tokens, 500);
        assert_eq!(config.embedding.provider, "openai");
        assert_eq!(config.completion.max_context_tokens, 1800);
        assert!(config.tokenizer.vocab_file.is_none());
    }

    #[test]
    fn test_zero_max_tokens_rejected() {
        let (_tmp, path) = write_config("[chunking]\nmax_tokens = 0\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_budget_overflow_rejected_at_load() {
        let (_tmp, path) = write_config(
            "[chunking]\nmax_tokens = 500\n\n[completion]\nmax_context_tokens = 7000\nmax_answer_tokens = 2000\nhard_window = 8192\n",
        );
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("hard_window"));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let (_tmp, path) = write_config(
            "[chunking]\nmax_tokens = 500\n\n[embedding]\nprovider = \"cohere\"\n",
        );
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_dotted_extension_rejected() {
        let (_tmp, path) = write_config(
            "[chunking]\nmax_tokens = 500\n\n[[sources.tree]]\nroot = \"src\"\nextension = \".go\"\n",
        );
        assert!(load_config(&path).is_err());
    }
}
