//! Crate-wide error taxonomy.
//!
//! Each subsystem gets its own error enum; `CoreError` composes them at the
//! boundary via `#[from]`. Library code returns `Result<T, CoreError>` (or a
//! subsystem-specific alias); `anyhow::Result` is reserved for tests and
//! integration call sites.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Citation(#[from] CitationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Audit(#[from] AuditError),
}

/// Errors arising from the LLM gateway: retryable/non-retryable API
/// classification, citation-verification failures surfaced through
/// `complete()`, and structured provider errors.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("retryable API error: {0}")]
    Retryable(String),

    #[error("non-retryable API error: {0}")]
    NonRetryable(String),

    #[error(
        "citation verification failed ({} format issue(s), {} not-found, {} other)",
        format_issues.len(), not_found.len(), other.len()
    )]
    CitationVerification {
        format_issues: Vec<String>,
        not_found: Vec<String>,
        other: Vec<String>,
    },

    #[error("authentication/quota error: {0}")]
    Authentication(String),

    #[error("empty response from API")]
    EmptyResponse,

    #[error("invalid API response structure: {0}")]
    InvalidResponse(String),

    #[error("unknown command/subcommand for client factory: {0}")]
    UnknownCommand(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum CitationError {
    #[error("citation verification unavailable: {0}")]
    VerificationUnavailable(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch failed for {url}: {reason}")]
    Failed { url: String, reason: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("pdf extraction failed: {0}")]
    PdfExtraction(String),

    #[error("local file not found: {0}")]
    LocalFileNotFound(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found; create one at {0} (see README for required keys)")]
    NotFound(String),

    #[error("failed to parse config file: {0}")]
    ParseError(String),

    #[error("config missing required key: {0}")]
    MissingKey(String),
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("failed to write log file {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
