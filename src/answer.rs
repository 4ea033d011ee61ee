//! Grounded question answering over a loaded corpus.
//!
//! Validates the token budgets, retrieves a bounded context for the
//! question, builds the fixed prompt, and hands it to the completion
//! provider. Budget validation happens before any provider call; a
//! misconfigured window never costs a network request.

use tracing::debug;

use crate::completion::{CompletionProvider, CompletionRequest};
use crate::embedding::EmbeddingProvider;
use crate::error::{QaError, Result};
use crate::retrieve::retrieve_context;
use crate::store::CorpusHandle;

/// System instruction framing every completion call.
pub const SYSTEM_INSTRUCTION: &str = "Answer the question based on the context below, and if the question can't be answered based on the context, say \"I don't know\".";

/// Token budgets and sampling parameters for one answering call.
///
/// All budgets live here; nothing else carries per-model token limits.
#[derive(Debug, Clone)]
pub struct ModelLimits {
    /// Retrieval context budget in tokens.
    pub max_context_tokens: usize,
    /// Generation budget in tokens.
    pub max_answer_tokens: usize,
    /// Total window the model supports.
    pub hard_window: usize,
    pub temperature: f32,
    pub stop_sequence: Option<String>,
}

/// Assemble the fixed prompt from context and question.
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Context: {}\n\n---\n\nQuestion: {}\nAnswer:",
        context, question
    )
}

/// Answer `question` grounded in `corpus`.
///
/// Fails with [`QaError::BudgetExceeded`] when the context and answer
/// budgets together exceed the hard window, before touching either
/// provider. An empty context still goes to the model, which is expected
/// to answer "I don't know".
pub async fn answer(
    embedding: &dyn EmbeddingProvider,
    completion: &dyn CompletionProvider,
    question: &str,
    corpus: &CorpusHandle,
    limits: &ModelLimits,
) -> Result<String> {
    if limits.max_context_tokens + limits.max_answer_tokens > limits.hard_window {
        return Err(QaError::BudgetExceeded {
            context: limits.max_context_tokens,
            answer: limits.max_answer_tokens,
            hard_window: limits.hard_window,
        });
    }

    let context = retrieve_context(embedding, question, corpus, limits.max_context_tokens).await?;
    debug!(context_len = context.len(), %question, "assembled context");

    let request = CompletionRequest {
        system: SYSTEM_INSTRUCTION.to_string(),
        prompt: build_prompt(&context, question),
        max_tokens: limits.max_answer_tokens,
        temperature: limits.temperature,
        stop_sequence: limits.stop_sequence.clone(),
    };
    completion.complete(&request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct PanickingEmbedding;

    #[async_trait]
    impl EmbeddingProvider for PanickingEmbedding {
        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            panic!("embedding provider must not be called");
        }
        fn model_name(&self) -> &str {
            "panic"
        }
        fn dims(&self) -> usize {
            2
        }
    }

    struct PanickingCompletion;

    #[async_trait]
    impl CompletionProvider for PanickingCompletion {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            panic!("completion provider must not be called");
        }
        fn model_name(&self) -> &str {
            "panic"
        }
    }

    struct EchoEmbedding;

    #[async_trait]
    impl EmbeddingProvider for EchoEmbedding {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
        fn model_name(&self) -> &str {
            "echo"
        }
        fn dims(&self) -> usize {
            2
        }
    }

    struct CapturingCompletion;

    #[async_trait]
    impl CompletionProvider for CapturingCompletion {
        async fn complete(&self, request: &CompletionRequest) -> Result<String> {
            Ok(request.prompt.clone())
        }
        fn model_name(&self) -> &str {
            "capture"
        }
    }

    struct FailingEmbedding;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedding {
        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(QaError::Provider("embedding backend down".into()))
        }
        fn model_name(&self) -> &str {
            "failing"
        }
        fn dims(&self) -> usize {
            2
        }
    }

    struct FailingCompletion;

    #[async_trait]
    impl CompletionProvider for FailingCompletion {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            Err(QaError::Provider("completion backend down".into()))
        }
        fn model_name(&self) -> &str {
            "failing"
        }
    }

    fn limits(context: usize, answer: usize, hard_window: usize) -> ModelLimits {
        ModelLimits {
            max_context_tokens: context,
            max_answer_tokens: answer,
            hard_window,
            temperature: 0.0,
            stop_sequence: None,
        }
    }

    #[tokio::test]
    async fn test_budget_overflow_fails_before_any_provider_call() {
        let corpus = CorpusHandle::new(Vec::new()).unwrap();
        let err = answer(
            &PanickingEmbedding,
            &PanickingCompletion,
            "q",
            &corpus,
            &limits(7000, 2000, 8192),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            QaError::BudgetExceeded {
                context: 7000,
                answer: 2000,
                hard_window: 8192,
            }
        ));
    }

    #[tokio::test]
    async fn test_prompt_carries_context_and_question() {
        let corpus = CorpusHandle::new(vec![crate::models::CorpusRecord {
            text: "the sky is blue".to_string(),
            token_count: 4,
            embedding: Some(vec![1.0, 0.0]),
        }])
        .unwrap();
        let prompt = answer(
            &EchoEmbedding,
            &CapturingCompletion,
            "what color is the sky?",
            &corpus,
            &limits(100, 50, 8192),
        )
        .await
        .unwrap();
        assert_eq!(
            prompt,
            "Context: the sky is blue\n\n---\n\nQuestion: what color is the sky?\nAnswer:"
        );
    }

    #[tokio::test]
    async fn test_completion_failure_is_a_typed_error_not_an_empty_answer() {
        let corpus = CorpusHandle::new(vec![crate::models::CorpusRecord {
            text: "some context".to_string(),
            token_count: 3,
            embedding: Some(vec![1.0, 0.0]),
        }])
        .unwrap();
        let result = answer(
            &EchoEmbedding,
            &FailingCompletion,
            "q",
            &corpus,
            &limits(100, 50, 8192),
        )
        .await;
        match result {
            Err(QaError::Provider(_)) => {}
            other => panic!("expected Provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates_before_completion() {
        let corpus = CorpusHandle::new(Vec::new()).unwrap();
        let err = answer(
            &FailingEmbedding,
            &PanickingCompletion,
            "q",
            &corpus,
            &limits(100, 50, 8192),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, QaError::Provider(_)));
    }

    #[test]
    fn test_prompt_format() {
        assert_eq!(
            build_prompt("ctx", "why?"),
            "Context: ctx\n\n---\n\nQuestion: why?\nAnswer:"
        );
    }
}
