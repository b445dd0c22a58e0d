//! Audit logging: structured per-command log records under `logs/`, written
//! as JSON or tag-aware Markdown depending on configuration, plus command
//! output persistence under `outputs/` and tracing bootstrap.
//!
//! Port of `original_source/litassist/logging/` (`__init__.py`'s `save_log`
//! dispatch, plus its `json_utils`/`task_events`/`output_saver`/`config`
//! submodules).

pub mod json_utils;
pub mod logging_setup;
pub mod markdown;
pub mod output_saver;
pub mod task_events;

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::{Config, LogFormat};
use crate::error::AuditError;

pub use json_utils::sanitize_for_json;
pub use logging_setup::setup_logging;
pub use output_saver::save_command_output;
pub use task_events::log_task_event;

fn log_dir() -> PathBuf {
    PathBuf::from("logs")
}

/// Returns the `outputs/` directory used by [`save_command_output`].
pub fn output_dir() -> PathBuf {
    PathBuf::from("outputs")
}

/// Saves an audit log record under `logs/` as `{tag}_{timestamp}.json` or
/// `{tag}_{timestamp}.md`, depending on `config.log_format`. Markdown mode
/// dispatches to a tag- and shape-aware formatter from [`markdown`]; JSON
/// mode sanitizes the payload via [`sanitize_for_json`] first.
pub fn save_log(config: &Config, tag: &str, payload: Value) -> Result<(), AuditError> {
    let dir = log_dir();
    std::fs::create_dir_all(&dir).map_err(|e| AuditError::WriteFailed {
        path: dir.display().to_string(),
        source: e,
    })?;

    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();

    match config.log_format {
        LogFormat::Json => write_json_log(&dir, tag, &ts, &payload),
        LogFormat::Markdown => write_markdown_log(&dir, tag, &ts, &payload),
    }
}

fn write_json_log(dir: &Path, tag: &str, ts: &str, payload: &Value) -> Result<(), AuditError> {
    let path = dir.join(format!("{tag}_{ts}.json"));
    let sanitized = sanitize_for_json(payload);
    let text = serde_json::to_string_pretty(&sanitized).unwrap_or_else(|_| "{}".to_string());
    std::fs::write(&path, text).map_err(|e| AuditError::WriteFailed {
        path: path.display().to_string(),
        source: e,
    })?;
    tracing::debug!(path = %path.display(), "JSON log saved");
    Ok(())
}

fn write_markdown_log(dir: &Path, tag: &str, ts: &str, payload: &Value) -> Result<(), AuditError> {
    let path = dir.join(format!("{tag}_{ts}.md"));
    let mut out = String::new();

    let method = payload
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or_default();

    if tag == "fetch_attempt" {
        markdown::write_fetch_log_markdown(&mut out, tag, ts, payload);
    } else if tag == "citation_verification_session" || payload.get("citations_found").is_some() {
        markdown::write_citation_verification_markdown(&mut out, tag, ts, payload);
    } else if tag == "citation_validation" || method.contains("validate_citation_patterns") {
        markdown::write_citation_validation_markdown(&mut out, tag, ts, payload);
    } else if tag == "austlii_http_validation" || method.contains("check_url_exists") {
        markdown::write_http_validation_markdown(&mut out, tag, ts, payload);
    } else if tag == "austlii_search_validation" {
        markdown::write_search_validation_markdown(&mut out, tag, ts, payload);
    } else if tag.starts_with("llm_")
        || tag.starts_with("cove_")
        || payload.get("messages_sent").is_some()
        || (payload.get("messages").is_some_and(Value::is_array) && payload.get("model").is_some())
    {
        markdown::write_llm_messages_markdown(&mut out, tag, ts, payload);
    } else if payload.get("response").is_some() || payload.get("inputs").is_some() {
        markdown::write_command_output_markdown(&mut out, tag, ts, payload);
    } else {
        markdown::write_generic_markdown(&mut out, tag, ts, payload);
    }

    std::fs::write(&path, out).map_err(|e| AuditError::WriteFailed {
        path: path.display().to_string(),
        source: e,
    })?;
    tracing::debug!(path = %path.display(), "Markdown log saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_config(log_format: LogFormat) -> Config {
        let mut config = Config::from_toml_str(
            r#"
            [openrouter]
            api_key = "k"
            [openai]
            api_key = "k"
            [google_cse]
            api_key = "k"
            cse_id = "k"
            cse_id_comprehensive = "k"
            cse_id_austlii = "k"
            [pinecone]
            api_key = "k"
            environment = "k"
            index = "k"
            "#,
        )
        .unwrap();
        config.log_format = log_format;
        config
    }

    #[test]
    fn json_log_is_sanitized_and_written() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        let config = test_config(LogFormat::Json);
        save_log(&config, "unit_test_tag", json!({"a": 1})).unwrap();
        let written = std::fs::read_dir(dir.path().join("logs")).unwrap().count();
        assert_eq!(written, 1);
    }

    #[test]
    fn markdown_log_dispatches_by_tag() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        let config = test_config(LogFormat::Markdown);
        save_log(&config, "fetch_attempt", json!({"url": "https://example.com", "status": "ok"})).unwrap();
        let entries: Vec<_> = std::fs::read_dir(dir.path().join("logs")).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
