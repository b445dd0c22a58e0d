//! Chat-completion response parsing.
//!
//! Port of `original_source/litassist/llm/response_parser.py`. Python's
//! version tolerates several historical OpenAI SDK usage-object shapes
//! (`model_dump()`, `dict()`, bare attributes); a typed `reqwest`/`serde`
//! response collapses that to one `Usage` shape, so only the
//! keys-always-present and error-detection behaviors carry over.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallFunction {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub function: ToolCallFunction,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
    #[serde(default)]
    pub error: Option<Value>,
}

/// Pulls the first choice's message content and the response's usage
/// counters, defaulting missing content to an empty string and missing
/// usage to all-zero counters.
pub fn extract_content_and_usage(response: &ChatResponse) -> (String, Usage) {
    let content = response
        .choices
        .first()
        .and_then(|c| c.message.content.clone())
        .unwrap_or_default();
    let usage = extract_usage_data(response);
    (content, usage)
}

/// Extracts usage counters, defaulting to zero when the response carries
/// none.
pub fn extract_usage_data(response: &ChatResponse) -> Usage {
    response.usage.clone().unwrap_or_default()
}

/// Passthrough hook for future content normalization. Response content
/// must never be stripped or rewritten here.
pub fn clean_response_content(content: String) -> String {
    content
}

/// Returns an error message if the response carries an in-body `error`
/// field or its first choice finished with `finish_reason == "error"`.
pub fn check_response_errors(response: &ChatResponse) -> Option<String> {
    if let Some(error) = &response.error {
        return Some(error.to_string());
    }
    if let Some(first) = response.choices.first() {
        if first.finish_reason.as_deref() == Some("error") {
            return Some("Response finished with error status".to_string());
        }
    }
    None
}

/// Full chat-response parse: error check first, then content/usage
/// extraction and cleaning.
pub fn parse_chat_response(response: &ChatResponse) -> (String, Usage, Option<String>) {
    if let Some(error) = check_response_errors(response) {
        return (String::new(), Usage::default(), Some(error));
    }

    let (content, usage) = extract_content_and_usage(response);
    let content = clean_response_content(content);
    (content, usage, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with_content(content: &str) -> ChatResponse {
        ChatResponse {
            choices: vec![Choice {
                message: ResponseMessage {
                    content: Some(content.to_string()),
                    tool_calls: None,
                },
                finish_reason: Some("stop".to_string()),
                error: None,
            }],
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            error: None,
        }
    }

    #[test]
    fn parses_content_and_usage_together() {
        let response = response_with_content("Hello");
        let (content, usage, error) = parse_chat_response(&response);
        assert_eq!(content, "Hello");
        assert_eq!(usage.total_tokens, 15);
        assert!(error.is_none());
    }

    #[test]
    fn detects_error_finish_reason() {
        let mut response = response_with_content("partial");
        response.choices[0].finish_reason = Some("error".to_string());
        let (content, _usage, error) = parse_chat_response(&response);
        assert_eq!(content, "");
        assert_eq!(error.as_deref(), Some("Response finished with error status"));
    }

    #[test]
    fn missing_usage_defaults_to_zero() {
        let mut response = response_with_content("hi");
        response.usage = None;
        let usage = extract_usage_data(&response);
        assert_eq!(usage.prompt_tokens, 0);
        assert_eq!(usage.total_tokens, 0);
    }
}
