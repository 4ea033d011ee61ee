//! Embedding provider abstraction and vector math.
//!
//! Defines the [`EmbeddingProvider`] trait and the [`OpenAiEmbedding`]
//! implementation, which calls the OpenAI embeddings API with batching,
//! retry, and backoff.
//!
//! # Retry Strategy
//!
//! Transient failures get bounded exponential backoff:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use crate::config::EmbeddingConfig;
use crate::error::{QaError, Result};
use crate::models::CorpusRecord;

/// Trait for embedding backends. The returned vectors must all share the
/// provider's fixed dimensionality.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;

    /// Embedding vector dimensionality (e.g. `1536`).
    fn dims(&self) -> usize;
}

/// Embed a single query text.
pub async fn embed_query(provider: &dyn EmbeddingProvider, text: &str) -> Result<Vec<f32>> {
    let results = provider.embed_batch(&[text.to_string()]).await?;
    results
        .into_iter()
        .next()
        .ok_or_else(|| QaError::Provider("empty embedding response".to_string()))
}

/// Populate the embedding of every record that lacks one.
///
/// Fail-fast: the first provider error aborts the whole pass and nothing
/// further is embedded. Silent partial embedding would corrupt later
/// distance computations, so the caller must not persist on error. Records
/// that already carry a vector are skipped, never recomputed.
///
/// Returns the number of records embedded by this call.
pub async fn embed_all(
    provider: &dyn EmbeddingProvider,
    records: &mut [CorpusRecord],
    batch_size: usize,
) -> Result<usize> {
    let pending: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.embedding.is_none())
        .map(|(i, _)| i)
        .collect();

    let mut embedded = 0usize;
    for batch in pending.chunks(batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|&i| records[i].text.clone()).collect();
        let vectors = provider.embed_batch(&texts).await?;
        if vectors.len() != batch.len() {
            return Err(QaError::Provider(format!(
                "provider returned {} vectors for {} texts",
                vectors.len(),
                batch.len()
            )));
        }
        for (&i, vector) in batch.iter().zip(vectors) {
            if vector.len() != provider.dims() {
                return Err(QaError::DimensionMismatch {
                    expected: provider.dims(),
                    actual: vector.len(),
                });
            }
            records[i].embedding = Some(vector);
            embedded += 1;
        }
    }
    Ok(embedded)
}

// ============ OpenAI Provider ============

/// Embedding provider backed by `POST /v1/embeddings`.
///
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAiEmbedding {
    model: String,
    dims: usize,
    api_key: String,
    client: reqwest::Client,
    max_retries: u32,
}

impl OpenAiEmbedding {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| QaError::Provider("OPENAI_API_KEY environment variable not set".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| QaError::Provider(format!("build HTTP client: {}", e)))?;

        Ok(Self {
            model: config.model.clone(),
            dims: config.dims,
            api_key,
            client,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedding {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post("https://api.openai.com/v1/embeddings")
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response
                            .json()
                            .await
                            .map_err(|e| QaError::Provider(format!("read response: {}", e)))?;
                        return parse_embedding_response(&json);
                    }

                    // Rate limited or server error — retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        warn!(attempt, %status, "embedding request failed, retrying");
                        last_err = Some(QaError::Provider(format!(
                            "embeddings API error {}: {}",
                            status, body_text
                        )));
                        continue;
                    }

                    // Client error (not 429) — don't retry
                    let body_text = response.text().await.unwrap_or_default();
                    return Err(QaError::Provider(format!(
                        "embeddings API error {}: {}",
                        status, body_text
                    )));
                }
                Err(e) => {
                    warn!(attempt, error = %e, "embedding request failed, retrying");
                    last_err = Some(QaError::Provider(e.to_string()));
                    continue;
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| QaError::Provider("embedding failed after retries".to_string())))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }
}

/// Parse the embeddings API response JSON, extracting `data[].embedding`
/// arrays in order.
fn parse_embedding_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| QaError::Provider("invalid response: missing data array".into()))?;

    let mut embeddings = Vec::with_capacity(data.len());

    for item in data {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| QaError::Provider("invalid response: missing embedding".into()))?;

        let mut vec = Vec::with_capacity(embedding.len());
        for v in embedding {
            let value = v.as_f64().ok_or_else(|| {
                QaError::Provider("invalid response: non-numeric embedding component".into())
            })?;
            vec.push(value as f32);
        }

        embeddings.push(vec);
    }

    Ok(embeddings)
}

/// Create the [`EmbeddingProvider`] selected by configuration.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "openai" => Ok(Box::new(OpenAiEmbedding::new(config)?)),
        other => Err(QaError::Provider(format!(
            "unknown embedding provider: {}",
            other
        ))),
    }
}

// ============ Vector math ============

/// Compute cosine similarity between two equal-length vectors.
///
/// Returns a value in `[-1.0, 1.0]`; `0.0` for empty or zero-norm vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

/// Cosine distance (`1 − cosine_similarity`), lower is nearer.
///
/// Distance is undefined across dimensionalities, so mismatched lengths fail
/// with [`QaError::DimensionMismatch`] rather than padding or truncating.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(QaError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(1.0 - cosine_similarity(a, b))
}
