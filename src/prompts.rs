//! Read-only named prompt-template registry.
//!
//! The original exposes a module-level `PROMPTS` object with `.get(key,
//! **kwargs)` doing dotted-key lookup plus `str.format(**kwargs)`
//! substitution (e.g. `PROMPTS.get("warnings.strict_mode_failed",
//! error=str(error))`). Prompt *bodies* are data owned by the CLI-facing
//! collaborator (out of scope per spec.md §1); this registry owns only the
//! lookup/substitution mechanism plus the small set of prompts the core
//! itself must be able to resolve without a caller (the Australian-law and
//! date-injection directives used unconditionally by the gateway, and the
//! citation-retry instructions used by the built-in retry path).

use std::collections::HashMap;

use once_cell::sync::Lazy;

static DEFAULT_PROMPTS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(
        "base.australian_law",
        "Respond using Australian English and Australian legal authorities only.",
    );
    m.insert(
        "base.date_tool_instruction",
        "You MUST call the `now` tool before answering any question that depends on the current date.",
    );
    m.insert(
        "base.date_fallback_instruction",
        "Today's date is {date}. Use this date for any time-sensitive reasoning.",
    );
    m.insert(
        "verification.citation_retry_instructions",
        "Every legal citation in your response must be a real, verifiable Australian (or clearly-marked foreign) authority. Remove any citation you cannot independently confirm exists.",
    );
    m.insert(
        "warnings.strict_mode_failed",
        "Citation verification failed: {error}",
    );
    m.insert(
        "warnings.retrying_with_instructions",
        "Retrying with enhanced citation instructions...",
    );
    m.insert(
        "warnings.retry_successful",
        "Retry successful. Remaining issue addressed: {issue}",
    );
    m.insert(
        "warnings.all_citations_verified",
        "Retry successful: All citations verified",
    );
    m.insert(
        "warnings.citation_verification_warning",
        "Citation verification: {issue}",
    );
    m.insert(
        "warnings.retry_also_failed",
        "Retry also failed: {error}",
    );
    m.insert(
        "warnings.multiple_attempts_failed",
        "CRITICAL: Multiple attempts to generate content with verified citations failed. The AI model is consistently generating unverifiable legal citations. Manual intervention required.",
    );
    m.insert(
        "verification.cove.questions_generation",
        "Generate a list of verification questions that, if answered independently, would confirm or refute the factual and legal claims in the following document.\n{context}\n\nDOCUMENT:\n{content}",
    );
    m.insert(
        "verification.cove.answers_with_context",
        "Answer the following verification questions independently, using only the legal authorities and reference documents provided below. Do not assume the original document is correct.\n\nQUESTIONS:\n{questions}\n\n{legal_context}",
    );
    m.insert(
        "verification.cove.answers_verification",
        "Answer the following verification questions independently and factually, drawing only on your own legal knowledge.\n\n{content}",
    );
    m.insert(
        "verification.cove.inconsistency_detection",
        "Compare the independently-derived answers below against the original document and report any inconsistencies. If there are none, respond with exactly \"No issues found\".\n\nINDEPENDENT ANSWERS:\n{context}\n\nORIGINAL DOCUMENT:\n{content}",
    );
    m.insert(
        "verification.cove.regeneration",
        "Regenerate the document below, correcting every issue identified by independent verification. Preserve everything that was not found to be inconsistent.\n\nISSUES FOUND:\n{context}\n\nINDEPENDENT ANSWERS:\n{prompt}\n\nORIGINAL DOCUMENT:\n{content}",
    );
    m.insert(
        "verification.reasoning.generate",
        "Analyse the legal document below and produce an IRAC-structured reasoning trace for the \"{command}\" command. Respond with exactly these six headings, each followed by its content on the next lines:\n\n## Issue\n## Applicable Law\n## Application\n## Conclusion\n## Confidence\n## Sources\n\nConfidence must be a single integer from 0 to 100. Sources must be a Markdown bullet list of the legal authorities relied on.\n\nDOCUMENT:\n{content}",
    );
    m
});

/// A prompt template that has not yet had its `{placeholder}` fields
/// substituted.
pub struct PromptRegistry;

impl PromptRegistry {
    /// Look up a dotted prompt key. Returns `None` if the key is unknown —
    /// callers mirror the original's `except (KeyError, ValueError)`
    /// fallback pattern.
    pub fn get(key: &str) -> Option<&'static str> {
        DEFAULT_PROMPTS.get(key).copied()
    }

    /// Look up a key and substitute `{name}` placeholders from `params`.
    /// Unmatched placeholders are left as-is (mirrors Python's `str.format`
    /// raising only on *missing* keys it tries to use, which never happens
    /// here since every call site supplies exactly the fields its own
    /// template needs).
    pub fn get_formatted(key: &str, params: &[(&str, &str)]) -> Option<String> {
        let template = Self::get(key)?;
        let mut rendered = template.to_string();
        for (name, value) in params {
            rendered = rendered.replace(&format!("{{{name}}}"), value);
        }
        Some(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_single_placeholder() {
        let rendered =
            PromptRegistry::get_formatted("warnings.strict_mode_failed", &[("error", "boom")])
                .unwrap();
        assert_eq!(rendered, "Citation verification failed: boom");
    }

    #[test]
    fn unknown_key_returns_none() {
        assert!(PromptRegistry::get("nonexistent.key").is_none());
    }
}
