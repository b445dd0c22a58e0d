//! Parameter conversion, filtering, and family-detection logic.
//!
//! Port of `original_source/litassist/llm/parameter_handler.py`.

use std::collections::{HashMap, HashSet};

use serde_json::{json, Value};

use super::model_profiles::{MODEL_PATTERNS, PARAMETER_PROFILES};

/// Converts a universal `thinking_effort` level into OpenRouter's
/// `reasoning` object shape for the model's family. Returns an empty map
/// for `"none"` or for families with no reasoning support.
pub fn convert_thinking_effort(effort: &str, model_name: &str) -> HashMap<String, Value> {
    if effort == "none" {
        return HashMap::new();
    }

    let model_family = get_model_family(model_name);

    if matches!(model_family.as_str(), "openai_reasoning" | "gpt5" | "xai") {
        let mut mapped_effort = match effort {
            "minimal" => "minimal",
            "low" => "low",
            "medium" => "medium",
            "high" => "high",
            "max" => "high",
            _ => "medium",
        };

        if mapped_effort == "minimal" && model_family != "gpt5" && !model_name.contains("o4") {
            mapped_effort = "low";
        }

        if model_name.contains("o4") {
            let mut out = HashMap::new();
            out.insert(
                "reasoning".to_string(),
                json!({"effort": mapped_effort, "summary": "auto"}),
            );
            return out;
        }

        let mut out = HashMap::new();
        out.insert("reasoning".to_string(), json!({"effort": mapped_effort}));
        return out;
    }

    if matches!(model_family.as_str(), "claude4" | "anthropic") {
        let max_tokens = match effort {
            "minimal" => 1024,
            "low" => 1024,
            "medium" => 8192,
            "high" => 16384,
            "max" => 32000,
            _ => 8192,
        };
        let mut out = HashMap::new();
        out.insert(
            "reasoning".to_string(),
            json!({"max_tokens": max_tokens}),
        );
        return out;
    }

    if model_family == "google" {
        let mapped = match effort {
            "minimal" => "low",
            "low" => "low",
            "medium" => "medium",
            "high" => "high",
            "max" => "high",
            _ => "medium",
        };
        let mut out = HashMap::new();
        out.insert("reasoning".to_string(), json!({"effort": mapped}));
        return out;
    }

    HashMap::new()
}

/// Converts a `low`/`medium`/`high` verbosity level to the `verbosity`
/// wire parameter. Any other value yields an empty map.
pub fn convert_verbosity(level: &str) -> HashMap<String, Value> {
    let mut out = HashMap::new();
    if matches!(level, "low" | "medium" | "high") {
        out.insert("verbosity".to_string(), json!(level));
    }
    out
}

/// Identifies a model's family by the first `MODEL_PATTERNS` entry whose
/// pattern matches the start of `model_name`, `"default"` if none match.
pub fn get_model_family(model_name: &str) -> String {
    for (family, pattern) in MODEL_PATTERNS.iter() {
        if pattern.is_match(model_name) {
            return (*family).to_string();
        }
    }
    "default".to_string()
}

/// OpenRouter-specific parameters carried through `extra_body` rather than
/// the standard OpenAI API surface. This is the functional carveout the
/// original actually uses in `get_model_parameters` — distinct from (and
/// smaller than) the vestigial `openrouter_universal` profile entry, which
/// is never consulted by this function. See DESIGN.md.
pub fn get_openrouter_params() -> HashSet<&'static str> {
    ["reasoning", "min_p", "top_a", "repetition_penalty"]
        .into_iter()
        .collect()
}

/// Filters `requested_params` down to what `model_name`'s family actually
/// accepts, applying transforms and thinking-effort/verbosity conversion.
/// Unsupported parameters are silently dropped, with a debug trace for
/// diagnosability (an addition over the original, which drops silently).
pub fn get_model_parameters(
    model_name: &str,
    requested_params: &HashMap<String, Value>,
) -> HashMap<String, Value> {
    let model_family = get_model_family(model_name);
    let profile = PARAMETER_PROFILES
        .get(model_family.as_str())
        .unwrap_or_else(|| PARAMETER_PROFILES.get("default").unwrap());

    let mut filtered = HashMap::new();
    let mut params_to_process = requested_params.clone();

    if let Some(Value::String(effort)) = params_to_process.get("thinking_effort").cloned() {
        params_to_process.remove("thinking_effort");
        filtered.extend(convert_thinking_effort(&effort, model_name));

        params_to_process.remove("reasoning_effort");
        params_to_process.remove("reasoning");
        params_to_process.remove("thinking");
        params_to_process.remove("thinking_config");
    } else {
        params_to_process.remove("thinking_effort");
    }

    if let Some(Value::String(verbosity)) = params_to_process.get("verbosity").cloned() {
        params_to_process.remove("verbosity");
        filtered.extend(convert_verbosity(&verbosity));
    }

    let openrouter_params = get_openrouter_params();

    for (param, value) in params_to_process {
        if value.is_null() {
            continue;
        }

        if let Some((_, renamed)) = profile.transforms.iter().find(|(from, _)| *from == param) {
            filtered.insert((*renamed).to_string(), value);
        } else if profile.allowed.contains(&param.as_str()) {
            filtered.insert(param, value);
        } else if openrouter_params.contains(param.as_str()) {
            filtered.insert(param, value);
        } else {
            tracing::debug!(parameter = %param, model = %model_name, family = %model_family, "dropping unsupported parameter");
        }
    }

    filtered
}

/// Whether `model_name`'s family accepts `system` role messages. Defaults
/// to `true` for families without an explicit entry.
pub fn supports_system_messages(model_name: &str) -> bool {
    let model_family = get_model_family(model_name);
    PARAMETER_PROFILES
        .get(model_family.as_str())
        .map(|p| p.system_message_support)
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thinking_effort_maps_to_max_tokens_for_anthropic() {
        let result = convert_thinking_effort("high", "anthropic/claude-3.5-sonnet");
        assert_eq!(result["reasoning"]["max_tokens"], json!(16384));
    }

    #[test]
    fn thinking_effort_adds_summary_for_o4() {
        let result = convert_thinking_effort("high", "openai/o4-mini");
        assert_eq!(result["reasoning"]["summary"], json!("auto"));
    }

    #[test]
    fn gpt5_falls_back_to_default_profile_for_filtering() {
        let mut requested = HashMap::new();
        requested.insert("temperature".to_string(), json!(0.7));
        requested.insert("tools".to_string(), json!([]));
        let filtered = get_model_parameters("openai/gpt-5-pro", &requested);
        assert!(filtered.contains_key("temperature"));
        assert!(!filtered.contains_key("tools"));
    }

    #[test]
    fn cohere_transforms_rename_parameters() {
        let mut requested = HashMap::new();
        requested.insert("top_k".to_string(), json!(40));
        let filtered = get_model_parameters("cohere/command-r", &requested);
        assert_eq!(filtered["k"], json!(40));
        assert!(!filtered.contains_key("top_k"));
    }

    #[test]
    fn openai_reasoning_rejects_system_messages() {
        assert!(!supports_system_messages("openai/o3-pro"));
        assert!(supports_system_messages("anthropic/claude-3.5-sonnet"));
    }
}
