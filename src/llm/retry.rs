//! Citation-triggered retry workflow.
//!
//! Port of `original_source/litassist/llm/retry_handler.py`.

use std::future::Future;

use crate::error::LlmError;
use crate::prompts::PromptRegistry;

use super::message::{Message, Role};
use super::response_parser::{ChatResponse, Usage};

/// True only for citation-verification failures; every other error
/// propagates without a retry attempt.
pub fn should_retry_for_citations(error: &LlmError) -> bool {
    matches!(error, LlmError::CitationVerification { .. })
}

/// Appends the citation-retry instruction prompt to the last user message,
/// leaving everything before it untouched.
pub fn enhance_messages_for_retry(messages: &[Message]) -> Vec<Message> {
    let mut enhanced = messages.to_vec();
    let citation_instructions = PromptRegistry::get("verification.citation_retry_instructions")
        .unwrap_or_default();

    if let Some(last) = enhanced.last_mut() {
        if last.role == Role::User {
            last.content.push_str("\n\n");
            last.content.push_str(citation_instructions);
        }
    }

    enhanced
}

/// Raises a `LlmError` if the retry response itself carries an in-body
/// error or an error `finish_reason`.
pub fn check_retry_response_errors(response: &ChatResponse) -> Result<(), LlmError> {
    if let Some(error) = &response.error {
        return Err(LlmError::Retryable(format!("API error on retry: {error}")));
    }
    if let Some(first) = response.choices.first() {
        if first.finish_reason.as_deref() == Some("error") {
            return Err(LlmError::Retryable(
                "API retry request failed with error finish_reason".to_string(),
            ));
        }
    }
    Ok(())
}

/// Runs the full citation-retry workflow: logs the strict-mode-failed and
/// retrying messages, enhances the prompt, re-executes the call via
/// `execute`, then re-validates via `validate`. `execute` performs the
/// actual network call (post-filtering, post-error-check) and returns the
/// parsed `(content, usage)`; `validate` is the client's citation
/// verifier invoked in strict mode.
pub async fn handle_citation_retry<E, EFut, V, VFut>(
    error: &LlmError,
    messages: &[Message],
    execute: E,
    validate: V,
) -> Result<(String, Usage, Vec<String>), LlmError>
where
    E: FnOnce(Vec<Message>) -> EFut,
    EFut: Future<Output = Result<(String, Usage), LlmError>>,
    V: FnOnce(String) -> VFut,
    VFut: Future<Output = Result<(String, Vec<String>), LlmError>>,
{
    let strict_failed_msg = PromptRegistry::get_formatted(
        "warnings.strict_mode_failed",
        &[("error", &error.to_string())],
    )
    .unwrap_or_else(|| format!("Strict citation verification failed: {error}"));
    let retrying_msg = PromptRegistry::get("warnings.retrying_with_instructions")
        .unwrap_or("Retrying with enhanced citation instructions...");

    tracing::warn!("{strict_failed_msg}");
    tracing::info!("{retrying_msg}");

    let enhanced_messages = enhance_messages_for_retry(messages);
    let (retry_content, retry_usage) = execute(enhanced_messages).await?;
    let (verified_retry_content, retry_issues) = validate(retry_content).await?;

    if let Some(first) = retry_issues.first() {
        let success_msg = PromptRegistry::get_formatted("warnings.retry_successful", &[("issue", first)])
            .unwrap_or_else(|| format!("Retry successful. Remaining issue addressed: {first}"));
        tracing::info!("{success_msg}");
    }

    Ok((verified_retry_content, retry_usage, retry_issues))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_citation_errors_trigger_retry() {
        assert!(should_retry_for_citations(&LlmError::CitationVerification {
            format_issues: vec![],
            not_found: vec![],
            other: vec![],
        }));
        assert!(!should_retry_for_citations(&LlmError::EmptyResponse));
    }

    #[test]
    fn enhancement_appends_to_last_user_message_only() {
        let messages = vec![Message::system("base"), Message::user("find the case")];
        let enhanced = enhance_messages_for_retry(&messages);
        assert_eq!(enhanced[0].content, "base");
        assert!(enhanced[1].content.starts_with("find the case"));
        assert!(enhanced[1].content.len() > "find the case".len());
    }

    #[tokio::test]
    async fn retry_workflow_returns_validated_content() {
        let error = LlmError::CitationVerification {
            format_issues: vec![],
            not_found: vec!["[2020] HCA 1".to_string()],
            other: vec![],
        };
        let messages = vec![Message::user("draft something")];

        let (content, usage, issues) = handle_citation_retry(
            &error,
            &messages,
            |_enhanced| async move {
                Ok::<_, LlmError>(("revised content".to_string(), Usage::default()))
            },
            |content| async move { Ok::<_, LlmError>((content, vec![])) },
        )
        .await
        .unwrap();

        assert_eq!(content, "revised content");
        assert_eq!(usage.total_tokens, 0);
        assert!(issues.is_empty());
    }
}
