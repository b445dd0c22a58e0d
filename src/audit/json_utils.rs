//! JSON sanitization for audit log payloads.
//!
//! Port of `original_source/litassist/logging/json_utils.py`. The Python
//! version also strips `unittest.mock.Mock` objects, which have no Rust
//! counterpart — `serde_json::Value` is already serializable by
//! construction, so only the `combined_content` filtering rule survives.

use serde_json::Value;

/// Recursively strips `combined_content` from any object that also carries
/// `total_tokens`, `total_words`, and `file_count` — a research-analysis
/// summary whose full combined text would otherwise bloat every log that
/// embeds it.
pub fn sanitize_for_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let looks_like_research_analysis = map.contains_key("combined_content")
                && ["total_tokens", "total_words", "file_count"]
                    .iter()
                    .all(|k| map.contains_key(*k));

            let mut out = serde_json::Map::new();
            for (k, v) in map {
                if looks_like_research_analysis && k == "combined_content" {
                    continue;
                }
                out.insert(k.clone(), sanitize_for_json(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sanitize_for_json).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_combined_content_from_research_analysis() {
        let payload = json!({
            "research_analysis": {
                "combined_content": "a".repeat(100_000),
                "total_tokens": 500,
                "total_words": 400,
                "file_count": 3,
            }
        });
        let sanitized = sanitize_for_json(&payload);
        let analysis = &sanitized["research_analysis"];
        assert!(analysis.get("combined_content").is_none());
        assert_eq!(analysis["total_tokens"], json!(500));
    }

    #[test]
    fn leaves_unrelated_objects_untouched() {
        let payload = json!({"combined_content": "keep me", "other": 1});
        let sanitized = sanitize_for_json(&payload);
        assert_eq!(sanitized["combined_content"], json!("keep me"));
    }
}
