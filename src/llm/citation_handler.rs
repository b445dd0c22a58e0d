//! Citation-verification workflow glue for `complete()`.
//!
//! Port of `original_source/litassist/llm/citation_handler.py`. The
//! original's `validate_func`/`client_instance` duck-typing becomes a
//! generic async closure here; `determine_strict_mode` folds away into a
//! plain `enforce_citations: bool` the caller already holds on its client
//! struct, so only the display/dispatch pieces remain as free functions.

use std::future::Future;

use crate::error::LlmError;
use crate::prompts::PromptRegistry;

use super::client::LlmClient;
use super::verification::validate_and_verify_citations;

/// Logs a single verification issue, preferring the configured prompt
/// template and falling back to a plain warning if it's missing.
pub fn display_verification_warning(issue: &str) {
    let msg = PromptRegistry::get_formatted(
        "warnings.citation_verification_warning",
        &[("issue", issue)],
    )
    .unwrap_or_else(|| format!("Citation verification: {issue}"));
    tracing::warn!("{msg}");
}

/// Builds the terminal error for a citation retry that still failed,
/// logging the retry-failure message before returning it. Always an error:
/// callers are expected to propagate the result via `?`.
pub fn handle_retry_failure(retry_error: &LlmError) -> LlmError {
    let retry_failed_msg = PromptRegistry::get_formatted(
        "warnings.retry_also_failed",
        &[("error", &retry_error.to_string())],
    )
    .unwrap_or_else(|| format!("Retry also failed: {retry_error}"));
    tracing::error!("{retry_failed_msg}");

    let multiple_attempts_msg = PromptRegistry::get("warnings.multiple_attempts_failed")
        .map(str::to_string)
        .unwrap_or_else(|| {
            "CRITICAL: Multiple attempts to generate content with verified citations failed. \
             The AI model is consistently generating unverifiable legal citations. \
             Manual intervention required."
                .to_string()
        });

    LlmError::CitationVerification {
        format_issues: Vec::new(),
        not_found: Vec::new(),
        other: vec![multiple_attempts_msg],
    }
}

/// Runs `validate` against `content` unless `skip_verification` is set,
/// logging and surfacing the first issue found. `validate` returns the
/// (possibly rewritten) content alongside any outstanding issues.
pub async fn handle_citation_verification<F, Fut>(
    content: String,
    validate: F,
    strict_mode: bool,
    skip_verification: bool,
) -> Result<(String, Option<Vec<String>>), LlmError>
where
    F: FnOnce(String, bool) -> Fut,
    Fut: Future<Output = Result<(String, Vec<String>), LlmError>>,
{
    if skip_verification {
        return Ok((content, None));
    }

    let (verified_content, issues) = validate(content, strict_mode).await?;

    if let Some(first) = issues.first() {
        display_verification_warning(first);
        return Ok((verified_content, Some(issues)));
    }

    Ok((verified_content, None))
}

/// Whether to use strict citation verification for `client` — lenient for
/// commands like `lookup` that set `enforce_citations = false`.
pub fn determine_strict_mode(client: &LlmClient) -> bool {
    client.enforce_citations
}

/// The complete citation-verification workflow for an `LlmClient`'s
/// response: resolves strict mode from the client, then delegates to
/// `handle_citation_verification`.
pub async fn process_citation_verification(
    content: String,
    client: &LlmClient,
    skip_verification: bool,
) -> Result<(String, Option<Vec<String>>), LlmError> {
    if skip_verification {
        return Ok((content, None));
    }

    let strict_mode = determine_strict_mode(client);
    handle_citation_verification(
        content,
        |c, strict| async move { validate_and_verify_citations(client, &c, strict).await },
        strict_mode,
        false,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn skip_verification_returns_content_unchanged() {
        let (content, issues) = handle_citation_verification(
            "hello".to_string(),
            |c, _strict| async move { Ok::<_, LlmError>((c, vec![])) },
            true,
            true,
        )
        .await
        .unwrap();
        assert_eq!(content, "hello");
        assert!(issues.is_none());
    }

    #[tokio::test]
    async fn surfaces_first_issue_when_present() {
        let (content, issues) = handle_citation_verification(
            "hello".to_string(),
            |c, _strict| async move {
                Ok::<_, LlmError>((c, vec!["citation not found".to_string()]))
            },
            true,
            false,
        )
        .await
        .unwrap();
        assert_eq!(content, "hello");
        assert_eq!(issues.unwrap(), vec!["citation not found".to_string()]);
    }

    #[test]
    fn retry_failure_wraps_critical_message() {
        let original = LlmError::EmptyResponse;
        let wrapped = handle_retry_failure(&original);
        match wrapped {
            LlmError::CitationVerification { other, .. } => {
                assert!(other[0].contains("Manual intervention required"));
            }
            other => panic!("expected CitationVerification, got {other:?}"),
        }
    }
}
