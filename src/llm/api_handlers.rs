//! OpenRouter API client construction, error classification, and the
//! retry/backoff loop wrapping every completion call.
//!
//! Port of `original_source/litassist/llm/api_handlers.py`. Tenacity's
//! decorator-based retry becomes an explicit loop; the five-attempt cap and
//! exponential backoff (0.5s base, 10s max) are preserved exactly.

use std::time::Duration;

use serde_json::{json, Value};

use crate::audit::save_log;
use crate::config::Config;
use crate::error::LlmError;

use super::parameter_handler::get_openrouter_params;

const MAX_ATTEMPTS: u32 = 5;
const BACKOFF_BASE_SECS: f64 = 0.5;
const BACKOFF_MAX_SECS: f64 = 10.0;

/// Builds the OpenRouter-routed HTTP client config for a completion call.
/// All models go through OpenRouter; there is no direct-provider path.
pub fn openrouter_endpoint(config: &Config) -> String {
    format!("{}/chat/completions", config.or_base.trim_end_matches('/'))
}

/// Coarse classification of an OpenRouter/Google nested error payload,
/// mirroring `parse_openrouter_error`'s status/code table.
pub fn parse_openrouter_error(error_info: &Value) -> (&'static str, String) {
    let message = error_info["message"].as_str().unwrap_or("Unknown API error");

    if message.contains("maximum context length") {
        return ("context_length", message.to_string());
    }

    let Some(raw) = error_info["metadata"]["raw"].as_str() else {
        return ("unknown", message.to_string());
    };
    let Ok(raw_obj) = serde_json::from_str::<Value>(raw) else {
        if raw.contains("UNAUTHENTICATED") {
            return ("auth", "Google API authentication failed".to_string());
        }
        return ("unknown", message.to_string());
    };

    let Some(google_error) = raw_obj.get("error") else {
        return ("unknown", message.to_string());
    };
    let status = google_error["status"].as_str().unwrap_or("");
    let code = google_error["code"].as_i64().unwrap_or(0);
    let g_message = google_error["message"].as_str().unwrap_or("");
    let lower = g_message.to_lowercase();

    if lower.contains("api key")
        && (lower.contains("expired") || lower.contains("invalid") || lower.contains("not valid"))
    {
        return (
            "auth",
            format!("Google API authentication failed: {g_message}"),
        );
    }

    if status == "INVALID_ARGUMENT" && (lower.contains("key") || lower.contains("token")) {
        return (
            "auth",
            format!("Google API authentication failed: {g_message}"),
        );
    }

    match (status, code) {
        ("UNAUTHENTICATED", _) | (_, 401) => (
            "auth",
            format!("Google API authentication failed: {g_message}"),
        ),
        ("RESOURCE_EXHAUSTED", _) | (_, 429) => {
            if lower.contains("quota") {
                ("quota", format!("Google API quota exceeded: {g_message}"))
            } else {
                (
                    "rate_limit",
                    format!("Google API rate limit hit: {g_message}"),
                )
            }
        }
        ("PERMISSION_DENIED", _) | (_, 403) => {
            if lower.contains("billing") {
                (
                    "billing",
                    format!("Google API billing not enabled: {g_message}"),
                )
            } else if lower.contains("disabled") || lower.contains("not been used") {
                (
                    "disabled",
                    format!("Google API not enabled in project: {g_message}"),
                )
            } else {
                (
                    "permission",
                    format!("Google API permission denied: {g_message}"),
                )
            }
        }
        _ => ("other", format!("Google API error ({status}): {g_message}")),
    }
}

const RETRYABLE_KEYWORDS: &[&str] = &["overloaded", "rate limit", "timeout", "busy"];
const NON_RETRYABLE_SIZE_KEYWORDS: &[&str] = &[
    "413",
    "payload too large",
    "prompt is too long",
    "request entity too large",
];

/// Classifies a per-choice in-body error (`choices[0].error`), which carries
/// only a message, not the structured Google error shape `parse_openrouter_error`
/// handles: retry on overloaded/rate-limit/timeout/busy, otherwise non-retryable.
fn classify_choice_error(message: &str) -> LlmError {
    let lower = message.to_lowercase();
    if RETRYABLE_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        LlmError::Retryable(format!("API Error: {message}"))
    } else {
        LlmError::NonRetryable(format!("API Error: {message}"))
    }
}

/// Forces a non-retryable classification when an error's message indicates
/// the request payload itself was too large (HTTP 413 and equivalent
/// provider phrasing), regardless of how it was otherwise classified.
fn override_for_payload_size(error: LlmError) -> LlmError {
    let message = error.to_string();
    let lower = message.to_lowercase();
    if NON_RETRYABLE_SIZE_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        LlmError::NonRetryable(format!("Request too large: {message}"))
    } else {
        error
    }
}

fn classify_error_type(error_type: &str, error_msg: &str) -> LlmError {
    match error_type {
        "auth" => LlmError::Authentication(format!(
            "{error_msg}. Please configure your Google API key at https://openrouter.ai/settings/keys"
        )),
        "quota" => LlmError::NonRetryable(format!(
            "{error_msg}. Consider waiting or upgrading your Google API quota"
        )),
        "rate_limit" => LlmError::Retryable(format!("{error_msg}. Will retry after delay")),
        "billing" => LlmError::NonRetryable(format!(
            "{error_msg}. Enable billing at https://console.cloud.google.com/billing"
        )),
        "disabled" => {
            LlmError::NonRetryable(format!("{error_msg}. Enable the API in your Google Cloud project"))
        }
        "context_length" => LlmError::NonRetryable(format!(
            "{error_msg}. Reduce document size or use selective mode"
        )),
        _ => LlmError::NonRetryable(format!("API Error: {error_msg}")),
    }
}

/// Executes one raw completion POST against OpenRouter, moving
/// OpenRouter-specific parameters (`reasoning`, `min_p`, `top_a`,
/// `repetition_penalty`) into `extra_body` the way the OpenAI SDK wrapper
/// does, and classifying any in-body error the response carries.
async fn call_once(
    http: &reqwest::Client,
    config: &Config,
    model_name: &str,
    messages: &Value,
    filtered_params: &mut serde_json::Map<String, Value>,
) -> Result<super::response_parser::ChatResponse, LlmError> {
    let openrouter_params = get_openrouter_params();
    let mut extra_body = serde_json::Map::new();
    for param in openrouter_params {
        if let Some(value) = filtered_params.remove(param) {
            extra_body.insert(param.to_string(), value);
        }
    }

    let mut body = serde_json::Map::new();
    body.insert("model".to_string(), Value::String(model_name.to_string()));
    body.insert("messages".to_string(), messages.clone());
    for (k, v) in filtered_params.iter() {
        body.insert(k.clone(), v.clone());
    }
    if !extra_body.is_empty() {
        body.insert("extra_body".to_string(), Value::Object(extra_body));
    }

    let response = http
        .post(openrouter_endpoint(config))
        .bearer_auth(&config.or_key)
        .json(&Value::Object(body))
        .send()
        .await
        .map_err(LlmError::Http)?;

    let parsed: super::response_parser::ChatResponse = response.json().await.map_err(LlmError::Http)?;

    if let Some(error_info) = &parsed.error {
        let (error_type, error_msg) = parse_openrouter_error(error_info);
        return Err(classify_error_type(error_type, &error_msg));
    }

    if let Some(first) = parsed.choices.first() {
        if let Some(error_info) = &first.error {
            let message = error_info["message"].as_str().unwrap_or("Unknown API error");
            return Err(classify_choice_error(message));
        }
        if first.finish_reason.as_deref() == Some("error") {
            return Err(LlmError::Retryable(format!(
                "API Error: model {model_name} returned error finish_reason"
            )));
        }
    }

    Ok(parsed)
}

fn is_retryable(error: &LlmError) -> bool {
    matches!(error, LlmError::Retryable(_) | LlmError::Http(_))
}

fn backoff_delay(attempt: u32) -> Duration {
    if cfg!(test) {
        return Duration::ZERO;
    }
    let secs = (BACKOFF_BASE_SECS * 2f64.powi(attempt as i32 - 1)).min(BACKOFF_MAX_SECS);
    Duration::from_secs_f64(secs)
}

/// Executes a completion call with up to `MAX_ATTEMPTS` retries, backing
/// off exponentially between retryable failures and stopping immediately
/// on non-retryable ones.
pub async fn execute_api_call_with_retry(
    http: &reqwest::Client,
    config: &Config,
    model_name: &str,
    messages: &Value,
    filtered_params: &serde_json::Map<String, Value>,
) -> Result<super::response_parser::ChatResponse, LlmError> {
    let mut last_error = None;

    for attempt in 1..=MAX_ATTEMPTS {
        let mut params = filtered_params.clone();
        match call_once(http, config, model_name, messages, &mut params).await {
            Ok(response) => return Ok(response),
            Err(error) => {
                let error = override_for_payload_size(error);
                if !is_retryable(&error) || attempt == MAX_ATTEMPTS {
                    tracing::warn!(model = %model_name, attempt, "api call failed, not retrying further");
                    save_log(
                        config,
                        "llm_final_failure",
                        json!({
                            "model": model_name,
                            "messages": messages,
                            "parameters": filtered_params,
                            "attempt": attempt,
                            "error": error.to_string(),
                        }),
                    )
                    .ok();
                    return Err(error);
                }
                tracing::warn!(model = %model_name, attempt, total = MAX_ATTEMPTS, "api call failed, retrying");
                save_log(
                    config,
                    "llm_retry",
                    json!({
                        "model": model_name,
                        "messages": messages,
                        "parameters": filtered_params,
                        "attempt": attempt,
                        "error": error.to_string(),
                    }),
                )
                .ok();
                tokio::time::sleep(backoff_delay(attempt)).await;
                last_error = Some(error);
            }
        }
    }

    Err(last_error.unwrap_or(LlmError::EmptyResponse))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_context_length_error() {
        let info = json!({"message": "This exceeds the maximum context length for this model"});
        let (kind, _) = parse_openrouter_error(&info);
        assert_eq!(kind, "context_length");
    }

    #[test]
    fn classifies_unauthenticated_google_error() {
        let raw = json!({"error": {"status": "UNAUTHENTICATED", "code": 401, "message": "bad key"}})
            .to_string();
        let info = json!({"message": "passthrough", "metadata": {"raw": raw}});
        let (kind, msg) = parse_openrouter_error(&info);
        assert_eq!(kind, "auth");
        assert!(msg.contains("bad key"));
    }

    #[test]
    fn backoff_caps_at_max() {
        assert!(backoff_delay(10) <= Duration::from_secs_f64(BACKOFF_MAX_SECS));
    }

    #[test]
    fn choice_error_with_overloaded_keyword_is_retryable() {
        assert!(matches!(
            classify_choice_error("Server overloaded, please retry"),
            LlmError::Retryable(_)
        ));
    }

    #[test]
    fn choice_error_without_keyword_is_non_retryable() {
        assert!(matches!(
            classify_choice_error("Something went wrong"),
            LlmError::NonRetryable(_)
        ));
    }

    #[test]
    fn payload_size_phrases_force_non_retryable() {
        let error = LlmError::Retryable("413 payload too large".to_string());
        assert!(matches!(
            override_for_payload_size(error),
            LlmError::NonRetryable(_)
        ));
    }

    #[test]
    fn unrelated_retryable_error_is_unaffected_by_payload_override() {
        let error = LlmError::Retryable("rate limit hit".to_string());
        assert!(matches!(
            override_for_payload_size(error),
            LlmError::Retryable(_)
        ));
    }
}
