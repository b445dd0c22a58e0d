//! Drop-largest-document truncation retry loop for LLM calls that fail
//! because the prompt exceeds the model's context window.
//!
//! Port of `original_source/litassist/utils/truncation.py`.

use std::future::Future;

use crate::error::LlmError;
use crate::llm::Usage;

const TOKEN_ERROR_KEYWORDS: &[&str] = &[
    "token",
    "context",
    "length",
    "too long",
    "maximum",
    "exceeded",
    "limit",
    "too many tokens",
];

/// Tracks a working set of `(name, content)` documents, dropping the
/// largest by content length each time a token-limit error is hit.
pub struct TruncationManager {
    documents: Vec<(String, String)>,
    dropped: Vec<(String, String)>,
    max_attempts: Option<u32>,
    attempt: u32,
}

impl TruncationManager {
    pub fn new(documents: Vec<(String, String)>, max_attempts: Option<u32>) -> Self {
        Self {
            documents,
            dropped: Vec::new(),
            max_attempts,
            attempt: 0,
        }
    }

    /// Drops the largest remaining document by content length, returning
    /// its name, or `None` if no documents remain.
    pub fn drop_largest(&mut self) -> Option<String> {
        let largest_idx = self
            .documents
            .iter()
            .enumerate()
            .max_by_key(|(_, (_, content))| content.len())
            .map(|(idx, _)| idx)?;
        let dropped = self.documents.remove(largest_idx);
        let name = dropped.0.clone();
        self.dropped.push(dropped);
        Some(name)
    }

    pub fn documents(&self) -> &[(String, String)] {
        &self.documents
    }

    pub fn dropped(&self) -> &[(String, String)] {
        &self.dropped
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Records a retry attempt (called after handling a token-limit error).
    pub fn record_attempt(&mut self) {
        self.attempt += 1;
    }

    pub fn can_retry(&self) -> bool {
        let has_documents = !self.documents.is_empty();
        match self.max_attempts {
            Some(max) => self.attempt < max && has_documents,
            None => has_documents,
        }
    }

    /// Heuristically classifies an [`LlmError`] as a token/context-limit
    /// error by scanning its message for the same keyword set the original
    /// uses, since provider APIs don't expose a dedicated error code for it.
    pub fn is_token_error(error: &LlmError) -> bool {
        let message = error.to_string().to_lowercase();
        TOKEN_ERROR_KEYWORDS.iter().any(|kw| message.contains(kw))
    }
}

/// Retries `execute_fn` (built from the current document set via
/// `build_prompt_fn`) on token-limit errors, dropping the largest document
/// each time, until it succeeds, a non-token-limit error occurs, or no
/// documents remain. `warning_fn`/`log_fn` receive the name of each dropped
/// document for user-facing and audit-log reporting respectively.
pub async fn execute_with_truncation<B, E, Fut>(
    build_prompt_fn: B,
    documents: Vec<(String, String)>,
    execute_fn: E,
    mut warning_fn: Option<&mut dyn FnMut(&str)>,
    mut log_fn: Option<&mut dyn FnMut(&str, &[String], u32)>,
) -> Result<(String, Usage), LlmError>
where
    B: Fn(&[(String, String)]) -> String,
    E: Fn(String) -> Fut,
    Fut: Future<Output = Result<(String, Usage), LlmError>>,
{
    let mut manager = TruncationManager::new(documents, None);

    loop {
        if !manager.can_retry() && manager.attempt() > 0 {
            break;
        }

        let prompt = build_prompt_fn(manager.documents());
        match execute_fn(prompt).await {
            Ok(result) => return Ok(result),
            Err(error) if TruncationManager::is_token_error(&error) => {
                let Some(dropped_name) = manager.drop_largest() else {
                    break;
                };

                if let Some(warn) = warning_fn.as_deref_mut() {
                    warn(&format!(
                        "Prompt exceeded token limit. Dropping largest document: {dropped_name}"
                    ));
                }

                if let Some(log) = log_fn.as_deref_mut() {
                    let remaining: Vec<String> =
                        manager.documents().iter().map(|(name, _)| name.clone()).collect();
                    log(&dropped_name, &remaining, manager.attempt() + 1);
                }

                manager.record_attempt();
                if !manager.can_retry() {
                    break;
                }
            }
            Err(error) => return Err(error),
        }
    }

    if manager.documents().is_empty() {
        Err(LlmError::NonRetryable(
            "failed to get LLM response after dropping all documents".to_string(),
        ))
    } else {
        Err(LlmError::NonRetryable(format!(
            "failed after {} attempts; dropped {} documents, {} remaining",
            manager.attempt(),
            manager.dropped().len(),
            manager.documents().len()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<(String, String)> {
        vec![
            ("small".to_string(), "x".repeat(10)),
            ("large".to_string(), "x".repeat(1000)),
            ("medium".to_string(), "x".repeat(100)),
        ]
    }

    #[test]
    fn drop_largest_removes_biggest_document_first() {
        let mut manager = TruncationManager::new(docs(), None);
        assert_eq!(manager.drop_largest().as_deref(), Some("large"));
        assert_eq!(manager.drop_largest().as_deref(), Some("medium"));
        assert_eq!(manager.drop_largest().as_deref(), Some("small"));
        assert_eq!(manager.drop_largest(), None);
    }

    #[test]
    fn can_retry_respects_max_attempts() {
        let mut manager = TruncationManager::new(docs(), Some(1));
        assert!(manager.can_retry());
        manager.attempt = 1;
        assert!(!manager.can_retry());
    }

    #[test]
    fn token_error_detection_matches_keywords() {
        assert!(TruncationManager::is_token_error(&LlmError::NonRetryable(
            "maximum context length exceeded".to_string()
        )));
        assert!(!TruncationManager::is_token_error(&LlmError::EmptyResponse));
    }

    #[tokio::test]
    async fn retries_by_dropping_documents_until_success() {
        let calls = std::sync::atomic::AtomicU32::new(0);
        let result = execute_with_truncation(
            |docs| format!("prompt with {} docs", docs.len()),
            docs(),
            |_prompt| {
                let n = calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(LlmError::NonRetryable("context length exceeded".to_string()))
                    } else {
                        Ok(("ok".to_string(), Usage::default()))
                    }
                }
            },
            None,
            None,
        )
        .await;
        assert_eq!(result.unwrap().0, "ok");
    }
}
