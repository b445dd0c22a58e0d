//! Per-tag Markdown log formatters.
//!
//! Port of `original_source/litassist/logging/markdown_writers.py`. Each
//! writer takes a `&serde_json::Value` payload (the JSON analogue of the
//! original's untyped dict) and appends Markdown to an output `String`.

use std::fmt::Write as _;

use serde_json::Value;

fn get<'a>(payload: &'a Value, key: &str) -> Option<&'a Value> {
    payload.get(key)
}

/// Renders a `Value` the way Python's `str()` would for the scalar types
/// that appear in these payloads, without the surrounding quotes
/// `Value::to_string()` adds for strings.
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "N/A".to_string(),
        other => other.to_string(),
    }
}

fn display_or(value: Option<&Value>, default: &str) -> String {
    value.map(display).unwrap_or_else(|| default.to_string())
}

fn as_bool_or(value: Option<&Value>, default: bool) -> bool {
    value.and_then(Value::as_bool).unwrap_or(default)
}

pub fn write_citation_verification_markdown(out: &mut String, tag: &str, ts: &str, payload: &Value) {
    let _ = writeln!(out, "# {tag}  {ts}\n");

    let _ = writeln!(out, "## Summary\n");
    let _ = writeln!(out, "- **Method**: `{}`  ", display_or(get(payload, "method"), "N/A"));
    let _ = writeln!(
        out,
        "- **Input Text Length**: {} characters  ",
        display_or(get(payload, "input_text_length"), "0")
    );
    let _ = writeln!(out, "- **Citations Found**: {}  ", display_or(get(payload, "citations_found"), "0"));
    let _ = writeln!(out, "- **Verified**: {}  ", display_or(get(payload, "citations_verified"), "0"));
    let _ = writeln!(out, "- **Unverified**: {}  ", display_or(get(payload, "citations_unverified"), "0"));
    let _ = writeln!(
        out,
        "- **Processing Time**: {} ms  ",
        display_or(get(payload, "processing_time_ms"), "N/A")
    );
    let _ = writeln!(out, "- **Timestamp**: {}  \n", display_or(get(payload, "timestamp"), ts));

    if let Some(Value::Array(verified)) = get(payload, "verified_citations") {
        if !verified.is_empty() {
            let _ = writeln!(out, "## Verified Citations\n");
            for citation in verified {
                let _ = writeln!(out, "- `{}`  ", display(citation));
            }
            let _ = writeln!(out);
        }
    }

    if let Some(Value::Array(unverified)) = get(payload, "unverified_citations") {
        if !unverified.is_empty() {
            let _ = writeln!(out, "## Unverified Citations\n");
            for item in unverified {
                if let Value::Array(pair) = item {
                    if pair.len() >= 2 {
                        let _ = writeln!(out, "- `{}`  ", display(&pair[0]));
                        let _ = writeln!(out, "  - **Reason**: {}  ", display(&pair[1]));
                        continue;
                    }
                }
                let _ = writeln!(out, "- `{}`  ", display(item));
            }
            let _ = writeln!(out);
        }
    }

    let _ = writeln!(out, "## Settings\n");
    let empty = Value::Object(Default::default());
    let settings = get(payload, "settings").unwrap_or(&empty);
    let _ = writeln!(out, "- **Strict Mode**: {}  ", display_or(get(settings, "strict_mode"), "N/A"));
    let _ = writeln!(out, "- **Cache Used**: {}  ", display_or(get(settings, "cache_used"), "N/A"));
    let _ = writeln!(out, "- **API Calls Made**: {}  \n", display_or(get(settings, "api_calls_made"), "N/A"));

    if let Some(Value::Array(errors)) = get(payload, "errors") {
        if !errors.is_empty() {
            let _ = writeln!(out, "## Errors\n");
            for error in errors {
                let _ = writeln!(out, "- {}  ", display(error));
            }
            let _ = writeln!(out);
        }
    }
}

pub fn write_citation_validation_markdown(out: &mut String, tag: &str, ts: &str, payload: &Value) {
    let _ = writeln!(out, "# {tag}  {ts}\n");
    let _ = writeln!(out, "## Summary\n");
    let _ = writeln!(
        out,
        "- **Method**: `{}`  ",
        display_or(get(payload, "method"), "validate_citation_patterns")
    );
    let issues = get(payload, "issues").and_then(Value::as_array);
    let issue_count = issues.map(Vec::len).unwrap_or(0);
    let _ = writeln!(out, "- **Issues Found**: {issue_count}  ");
    let _ = writeln!(
        out,
        "- **Online Enabled**: {}  ",
        as_bool_or(get(payload, "online_enabled"), false)
    );
    let _ = writeln!(out, "- **Timestamp**: {}  \n", display_or(get(payload, "timestamp"), ts));

    if let Some(issues) = issues.filter(|i| !i.is_empty()) {
        let _ = writeln!(out, "## Issues\n");
        for issue in issues {
            let _ = writeln!(out, "- {}  ", display(issue));
        }
        let _ = writeln!(out);
    }
}

pub fn write_http_validation_markdown(out: &mut String, tag: &str, ts: &str, payload: &Value) {
    let _ = writeln!(out, "# {tag}  {ts}\n");
    let _ = writeln!(out, "## HTTP Validation\n");
    let _ = writeln!(out, "- **Method**: `{}`  ", display_or(get(payload, "method"), "check_url_exists"));
    let _ = writeln!(out, "- **URL**: `{}`  ", display_or(get(payload, "url"), "N/A"));
    let _ = writeln!(out, "- **Status Code**: {}  ", display_or(get(payload, "status_code"), "N/A"));
    let _ = writeln!(out, "- **Valid**: {}  ", as_bool_or(get(payload, "valid"), false));
    if let Some(error) = get(payload, "error").filter(|v| !v.is_null()) {
        let _ = writeln!(out, "- **Error**: {}  ", display(error));
    }
    let _ = writeln!(out);
}

pub fn write_search_validation_markdown(out: &mut String, tag: &str, ts: &str, payload: &Value) {
    let _ = writeln!(out, "# {tag}  {ts}\n");
    let _ = writeln!(out, "## Search Validation\n");
    let _ = writeln!(out, "- **Method**: `search_austlii`  ");
    let _ = writeln!(out, "- **Citation**: `{}`  ", display_or(get(payload, "citation"), "N/A"));
    let _ = writeln!(out, "- **Found**: {}  ", as_bool_or(get(payload, "found"), false));
    if let Some(url) = get(payload, "url").filter(|v| !v.is_null()) {
        let _ = writeln!(out, "- **URL**: {}  ", display(url));
    }
    let _ = writeln!(out);
}

const COMMAND_OUTPUT_RESPONSE_LIMIT: usize = 10_000;
const INPUT_STRING_TRUNCATE_LIMIT: usize = 1_000;
const INPUT_STRING_TRUNCATE_HEAD: usize = 500;
const LLM_MESSAGE_CONTENT_LIMIT: usize = 50_000;
const LLM_RESPONSE_LIMIT: usize = 100_000;

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

pub fn write_command_output_markdown(out: &mut String, tag: &str, ts: &str, payload: &Value) {
    let _ = writeln!(out, "# {tag}  {ts}\n");

    if let Some(inputs) = get(payload, "inputs") {
        let _ = writeln!(out, "## Inputs\n");
        match inputs {
            Value::Object(map) => {
                for (key, value) in map {
                    match value {
                        Value::Object(inner)
                            if key == "research_analysis" && inner.contains_key("combined_content") =>
                        {
                            let _ = writeln!(out, "- **{key}**:");
                            let _ = writeln!(
                                out,
                                "  - Total tokens: {}",
                                display_or(inner.get("total_tokens"), "N/A")
                            );
                            let _ = writeln!(
                                out,
                                "  - Total words: {}",
                                display_or(inner.get("total_words"), "N/A")
                            );
                            let _ = writeln!(
                                out,
                                "  - File count: {}",
                                display_or(inner.get("file_count"), "N/A")
                            );
                            let _ = writeln!(
                                out,
                                "  - Exceeds threshold: {}",
                                display_or(inner.get("exceeds_threshold"), "N/A")
                            );
                        }
                        Value::Object(_) => {
                            let pretty = serde_json::to_string_pretty(value).unwrap_or_default();
                            let _ = writeln!(out, "- **{key}**:\n```json\n{pretty}\n```");
                        }
                        Value::Array(items) => {
                            if items.len() > 10 {
                                let _ = writeln!(out, "- **{key}**: {} items", items.len());
                                let head: Vec<String> = items.iter().take(3).map(display).collect();
                                let _ = writeln!(out, "  First 3: [{}]", head.join(", "));
                            } else {
                                let _ = writeln!(out, "- **{key}**: {}  ", display(value));
                            }
                        }
                        Value::String(s) if char_len(s) > INPUT_STRING_TRUNCATE_LIMIT => {
                            let _ = writeln!(
                                out,
                                "- **{key}**: {}... (truncated, {} chars total)  ",
                                truncate_chars(s, INPUT_STRING_TRUNCATE_HEAD),
                                char_len(s)
                            );
                        }
                        other => {
                            let _ = writeln!(out, "- **{key}**: {}  ", display(other));
                        }
                    }
                }
            }
            other => {
                let _ = writeln!(out, "{}  ", display(other));
            }
        }
        let _ = writeln!(out);
    }

    if let Some(response) = get(payload, "response") {
        let _ = writeln!(out, "## Response\n");
        match response {
            Value::String(s) if char_len(s) > COMMAND_OUTPUT_RESPONSE_LIMIT => {
                let _ = writeln!(
                    out,
                    "{}\n\n... (truncated, {} total characters)",
                    truncate_chars(s, COMMAND_OUTPUT_RESPONSE_LIMIT),
                    char_len(s)
                );
            }
            other => {
                let _ = writeln!(out, "{}", display(other));
            }
        }
        let _ = writeln!(out);
    }

    if let Some(Value::Object(usage)) = get(payload, "usage") {
        let _ = writeln!(out, "## Usage Statistics\n");
        for (key, value) in usage {
            let _ = writeln!(out, "- **{key}**: {}  ", display(value));
        }
        let _ = writeln!(out);
    }
}

pub fn write_llm_messages_markdown(out: &mut String, tag: &str, ts: &str, payload: &Value) {
    let _ = writeln!(out, "# {tag}  {ts}\n");

    let _ = writeln!(out, "## Model Information\n");
    let _ = writeln!(out, "- **Model**: {}", display_or(get(payload, "model"), "N/A"));
    let _ = writeln!(out, "- **Timestamp**: {}", display_or(get(payload, "timestamp"), ts));
    if let Some(id) = get(payload, "correlation_id") {
        let _ = writeln!(out, "- **Correlation ID**: {}", display(id));
    }
    if let Some(ctx) = get(payload, "command_context") {
        let _ = writeln!(out, "- **Context**: {}", display(ctx));
    }
    let _ = writeln!(out);

    let messages = get(payload, "messages")
        .or_else(|| get(payload, "messages_sent"))
        .and_then(Value::as_array);
    if let Some(messages) = messages.filter(|m| !m.is_empty()) {
        let _ = writeln!(out, "## Messages Sent\n");
        for msg in messages {
            let role = msg.get("role").and_then(Value::as_str).unwrap_or("unknown");
            let content = msg.get("content").and_then(Value::as_str).unwrap_or("");

            match role {
                "system" => {
                    let _ = writeln!(out, "### System Message\n");
                }
                "user" => {
                    let _ = writeln!(out, "### User Message\n");
                }
                "assistant" => {
                    let _ = writeln!(out, "### Assistant Message\n");
                }
                other => {
                    let mut chars = other.chars();
                    let title = match chars.next() {
                        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                        None => other.to_string(),
                    };
                    let _ = writeln!(out, "### {title} Message\n");
                }
            }

            if char_len(content) > LLM_MESSAGE_CONTENT_LIMIT {
                let _ = writeln!(
                    out,
                    "{}\n\n[... truncated, {} total characters ...]\n",
                    truncate_chars(content, LLM_MESSAGE_CONTENT_LIMIT),
                    char_len(content)
                );
            } else {
                let _ = writeln!(out, "{content}\n");
            }
        }
    }

    if let Some(response) = get(payload, "response").and_then(Value::as_str).filter(|s| !s.is_empty()) {
        let _ = writeln!(out, "## LLM Response\n");
        if char_len(response) > LLM_RESPONSE_LIMIT {
            let _ = writeln!(
                out,
                "{}\n\n[... truncated, {} total characters ...]\n",
                truncate_chars(response, LLM_RESPONSE_LIMIT),
                char_len(response)
            );
        } else {
            let _ = writeln!(out, "{response}\n");
        }
    }

    if let Some(Value::Object(params)) = get(payload, "params") {
        if !params.is_empty() {
            let _ = writeln!(out, "## Parameters\n");
            let _ = writeln!(out, "| Parameter | Value |");
            let _ = writeln!(out, "|-----------|-------|");
            for (key, value) in params {
                let _ = writeln!(out, "| {key} | {} |", display(value));
            }
            let _ = writeln!(out);
        }
    }

    if let Some(Value::Object(usage)) = get(payload, "usage") {
        if !usage.is_empty() {
            let _ = writeln!(out, "## Token Usage\n");
            for (key, value) in usage {
                let _ = writeln!(out, "- **{key}**: {}", display(value));
            }
            let _ = writeln!(out);
        }
    }
}

/// Recursively formats an object as nested Markdown bullet lists.
pub fn format_dict_as_markdown(value: &Value, indent: usize) -> String {
    let mut lines = Vec::new();
    let prefix = "  ".repeat(indent) + "- ";

    if let Value::Object(map) = value {
        for (key, v) in map {
            match v {
                Value::Object(_) => {
                    lines.push(format!("{prefix}**{key}**:"));
                    lines.push(format_dict_as_markdown(v, indent + 1));
                }
                Value::Array(items) => {
                    lines.push(format!("{prefix}**{key}**:"));
                    for item in items {
                        if item.is_object() {
                            lines.push(format_dict_as_markdown(item, indent + 1));
                        } else {
                            lines.push(format!("  {}- {}", "  ".repeat(indent), display(item)));
                        }
                    }
                }
                other => lines.push(format!("{prefix}**{key}**: {}", display(other))),
            }
        }
    }

    lines.join("\n")
}

pub fn write_fetch_log_markdown(out: &mut String, tag: &str, ts: &str, payload: &Value) {
    let _ = writeln!(out, "# {tag}  {ts}\n");

    let _ = writeln!(out, "## Fetch Summary\n");
    let _ = writeln!(out, "- **URL**: `{}`  ", display_or(get(payload, "url"), "N/A"));
    if let Some(original) = get(payload, "original_url").filter(|v| !v.is_null()) {
        let _ = writeln!(out, "- **Original URL**: `{}`  ", display(original));
    }
    let _ = writeln!(out, "- **Method**: `{}`  ", display_or(get(payload, "method"), "N/A"));
    let _ = writeln!(out, "- **Status**: `{}`  ", display_or(get(payload, "status"), "N/A"));
    if let Some(reason) = get(payload, "reason").filter(|v| !v.is_null()) {
        let _ = writeln!(out, "- **Reason**: {}  ", display(reason));
    }
    if let Some(error) = get(payload, "error").filter(|v| !v.is_null()) {
        let _ = writeln!(out, "- **Error**: {}  ", display(error));
    }
    let _ = writeln!(out, "- **Timestamp**: {}  \n", display_or(get(payload, "timestamp"), ts));

    let size_keys = ["html_size", "extracted_size", "final_size", "jina_response_size"];
    if size_keys.iter().any(|k| get(payload, k).is_some()) {
        let _ = writeln!(out, "## Size Statistics\n");
        if let Some(v) = get(payload, "html_size").filter(|v| !v.is_null()) {
            let _ = writeln!(out, "- **HTML Size**: {} chars  ", display(v));
        }
        if let Some(v) = get(payload, "jina_response_size").filter(|v| !v.is_null()) {
            let _ = writeln!(out, "- **Jina Response Size**: {} chars  ", display(v));
        }
        if let Some(v) = get(payload, "extracted_size").filter(|v| !v.is_null()) {
            let _ = writeln!(out, "- **Extracted Size**: {} chars  ", display(v));
        }
        if let Some(v) = get(payload, "final_size").filter(|v| !v.is_null()) {
            let _ = writeln!(out, "- **Final Size**: {} chars  ", display(v));
        }
        if let Some(v) = get(payload, "reduction_percent").filter(|v| !v.is_null()) {
            let _ = writeln!(out, "- **Reduction**: {}%  ", display(v));
        }
        if let Some(v) = get(payload, "pdf_pages").filter(|v| !v.is_null()) {
            let _ = writeln!(out, "- **PDF Pages**: {} total  ", display(v));
        }
        if let Some(v) = get(payload, "pages_extracted").filter(|v| !v.is_null()) {
            let _ = writeln!(out, "- **Pages Extracted**: {}  ", display(v));
        }
        let _ = writeln!(out);
    }

    let content = get(payload, "content").and_then(Value::as_str).unwrap_or("");
    let status = get(payload, "status").and_then(Value::as_str).unwrap_or("");
    if !content.is_empty() {
        let _ = writeln!(out, "## Scraped Content\n");
        let _ = writeln!(out, "```text");
        let _ = writeln!(out, "{content}");
        let _ = writeln!(out, "```");
    } else if status == "failed" {
        let _ = writeln!(out, "## Content\n\nFetch failed - no content retrieved.");
    } else if status == "skipped" {
        let _ = writeln!(out, "## Content\n\nFetch skipped - no content retrieved.");
    }

    let _ = writeln!(out);
}

pub fn write_generic_markdown(out: &mut String, tag: &str, ts: &str, payload: &Value) {
    let _ = writeln!(out, "# {tag}  {ts}\n");
    let _ = writeln!(out, "## Log Data\n");

    if payload.as_object().is_some_and(|m| !m.is_empty()) {
        let _ = writeln!(out, "{}", format_dict_as_markdown(payload, 0));
    } else {
        let _ = writeln!(out, "No data available.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn citation_verification_lists_verified_and_unverified() {
        let payload = json!({
            "method": "verify",
            "citations_found": 2,
            "verified_citations": ["Mabo v Queensland (No 2) (1992) 175 CLR 1"],
            "unverified_citations": [["Foo v Bar", "not found"]],
            "settings": {"strict_mode": true},
        });
        let mut out = String::new();
        write_citation_verification_markdown(&mut out, "citation_verification_session", "20260101-000000", &payload);
        assert!(out.contains("Mabo v Queensland"));
        assert!(out.contains("**Reason**: not found"));
    }

    #[test]
    fn command_output_truncates_long_response() {
        let payload = json!({"response": "x".repeat(20_000)});
        let mut out = String::new();
        write_command_output_markdown(&mut out, "extractfacts", "ts", &payload);
        assert!(out.contains("truncated, 20000 total characters"));
    }

    #[test]
    fn llm_messages_render_role_headers() {
        let payload = json!({
            "model": "openai/gpt-5",
            "messages": [{"role": "system", "content": "be concise"}],
            "response": "ok",
        });
        let mut out = String::new();
        write_llm_messages_markdown(&mut out, "llm_call", "ts", &payload);
        assert!(out.contains("### System Message"));
        assert!(out.contains("## LLM Response"));
    }

    #[test]
    fn generic_markdown_formats_nested_objects() {
        let payload = json!({"a": {"b": 1}, "c": [1, 2]});
        let mut out = String::new();
        write_generic_markdown(&mut out, "misc", "ts", &payload);
        assert!(out.contains("**a**:"));
        assert!(out.contains("**b**: 1"));
    }

    #[test]
    fn fetch_log_writes_content_block_when_present() {
        let payload = json!({"url": "https://example.com", "status": "ok", "content": "hello"});
        let mut out = String::new();
        write_fetch_log_markdown(&mut out, "fetch_attempt", "ts", &payload);
        assert!(out.contains("```text\nhello\n```"));
    }
}
