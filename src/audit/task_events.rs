//! Structured event logging for multistage commands.
//!
//! Port of `original_source/litassist/logging/task_events.py`.

use serde_json::{json, Value};

use crate::config::Config;
use crate::error::AuditError;

/// Logs a structured event for one stage of a multistage command: writes an
/// audit record via [`super::save_log`] tagged
/// `task_event_{command}_{stage}_{event}`, then echoes a one-line summary to
/// the console for start/end/llm_call/llm_response/progress events.
pub fn log_task_event(
    config: &Config,
    command: &str,
    stage: &str,
    event: &str,
    message: &str,
    details: Option<Value>,
) -> Result<(), AuditError> {
    let mut payload = json!({
        "command": command,
        "stage": stage,
        "event": event,
        "message": message,
        "timestamp": current_timestamp(),
    });
    if let Some(details) = &details {
        payload["details"] = details.clone();
    }

    let model_suffix = details
        .as_ref()
        .and_then(|d| d.get("model"))
        .and_then(Value::as_str)
        .map(|m| format!(" [model: {m}]"))
        .unwrap_or_default();

    let tag = format!("task_event_{command}_{stage}_{event}");
    super::save_log(config, &tag, payload)?;

    match event {
        "start" | "end" => {
            println!("[{}] {command}.{stage}: {message}{model_suffix}", event.to_uppercase());
        }
        "llm_call" => println!("[LLM CALL] {command}.{stage}: {message}{model_suffix}"),
        "llm_response" => println!("[LLM RESPONSE] {command}.{stage}: {message}{model_suffix}"),
        "progress" => println!("[PROGRESS] {command}.{stage}: {message}{model_suffix}"),
        _ => {}
    }

    Ok(())
}

fn current_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_format_matches_command_stage_event() {
        let tag = format!("task_event_{}_{}_{}", "verify", "citations", "start");
        assert_eq!(tag, "task_event_verify_citations_start");
    }
}
