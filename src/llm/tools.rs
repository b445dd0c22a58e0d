//! Built-in tool-calling support (currently just `now`).
//!
//! Port of `original_source/litassist/llm/tools.py`. Models frequently get
//! the current date wrong, so the gateway offers a `now` tool and forces
//! the model to call it before date-sensitive answers.

use chrono::TimeZone;
use serde_json::{json, Value};

/// The OpenAI/OpenRouter function-calling tool definitions this gateway
/// supports.
pub fn get_tool_definitions() -> Value {
    json!([
        {
            "type": "function",
            "function": {
                "name": "now",
                "description": "Get the current date and time in Australia/Sydney timezone. You MUST call this before answering any date-related questions.",
                "parameters": {
                    "type": "object",
                    "properties": {},
                    "additionalProperties": false
                }
            }
        }
    ])
}

/// Executes a named tool and returns its structured result.
pub fn execute_tool(tool_name: &str) -> Result<Value, String> {
    if tool_name != "now" {
        return Err(format!("Unknown tool: {tool_name}"));
    }

    let sydney: chrono_tz::Tz = chrono_tz::Australia::Sydney;
    let now = chrono::Utc::now().with_timezone(&sydney);

    Ok(json!({
        "date": now.format("%Y-%m-%d").to_string(),
        "datetime": now.format("%Y-%m-%d %H:%M:%S %Z").to_string(),
        "timezone": "Australia/Sydney",
        "year": now.format("%Y").to_string(),
        "month": now.format("%m").to_string(),
        "day": now.format("%d").to_string(),
        "formatted": now.format("%B %d, %Y").to_string(),
    }))
}

/// Formats a tool's result for injection back into the conversation as a
/// `tool` role message.
pub fn format_tool_response(tool_name: &str, result: &Value) -> String {
    if tool_name == "now" {
        return format!(
            "Current date/time (Australia/Sydney): {} ({}). You must use this date for all calculations and references to 'today' or 'current date'.",
            result["formatted"].as_str().unwrap_or_default(),
            result["datetime"].as_str().unwrap_or_default(),
        );
    }
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_tool_returns_sydney_timezone_fields() {
        let result = execute_tool("now").unwrap();
        assert_eq!(result["timezone"], json!("Australia/Sydney"));
        assert!(result["formatted"].as_str().is_some());
    }

    #[test]
    fn unknown_tool_is_rejected() {
        assert!(execute_tool("unknown").is_err());
    }

    #[test]
    fn formats_now_response_with_instruction() {
        let result = execute_tool("now").unwrap();
        let formatted = format_tool_response("now", &result);
        assert!(formatted.contains("Australia/Sydney"));
        assert!(formatted.contains("must use this date"));
    }
}
