//! Command-to-model assignment.
//!
//! `original_source/litassist/llm/factory.py` is referenced throughout the
//! original (`commands/*/core.py`, `verification_chain.py`,
//! `llm/verification.py` all call `LLMClientFactory.for_command(...)`) but
//! was not part of the retrieved source pack — only its call sites were.
//! This module is reconstructed from those call sites: the command/mode
//! strings passed to `for_command` and `get_model_for_command` enumerate
//! the table below. See DESIGN.md for this reconstruction decision.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::Config;
use crate::error::LlmError;

use super::client::LlmClient;

/// Static per-command assignment: which model backs a command, its default
/// sampling parameters, and whether it runs with tools/citation
/// enforcement disabled.
struct CommandProfile {
    model: &'static str,
    temperature: f64,
    top_p: f64,
    enforce_citations: bool,
    disable_tools: bool,
}

/// `(command, mode)` keys match exactly the strings observed at
/// `LLMClientFactory.for_command` call sites; `mode: None` matches any mode
/// not otherwise listed for that command. An unrecognized `(command, mode)`
/// pair raises rather than silently defaulting to a profile — the original
/// factory has no fallback model for an unknown command.
fn profile_for(command: &str, mode: Option<&str>) -> Result<CommandProfile, LlmError> {
    let profile = match (command, mode) {
        ("lookup", _) => CommandProfile {
            model: "google/gemini-2.5-pro",
            temperature: 0.1,
            top_p: 0.9,
            enforce_citations: false,
            disable_tools: false,
        },
        ("digest", _) => CommandProfile {
            model: "anthropic/claude-sonnet-4",
            temperature: 0.2,
            top_p: 0.9,
            enforce_citations: false,
            disable_tools: false,
        },
        ("extractfacts", _) => CommandProfile {
            model: "anthropic/claude-opus-4",
            temperature: 0.0,
            top_p: 0.8,
            enforce_citations: true,
            disable_tools: false,
        },
        ("strategy", _) => CommandProfile {
            model: "anthropic/claude-opus-4",
            temperature: 0.2,
            top_p: 0.85,
            enforce_citations: true,
            disable_tools: false,
        },
        ("brainstorm", Some("orthodox")) => CommandProfile {
            model: "anthropic/claude-sonnet-4",
            temperature: 0.3,
            top_p: 0.9,
            enforce_citations: false,
            disable_tools: false,
        },
        ("brainstorm", Some("unorthodox")) => CommandProfile {
            model: "x-ai/grok-4",
            temperature: 0.9,
            top_p: 0.95,
            enforce_citations: false,
            disable_tools: false,
        },
        ("brainstorm", Some("analysis")) => CommandProfile {
            model: "anthropic/claude-opus-4",
            temperature: 0.2,
            top_p: 0.9,
            enforce_citations: false,
            disable_tools: false,
        },
        ("caseplan", Some("assessment")) => CommandProfile {
            model: "openai/gpt-5",
            temperature: 0.1,
            top_p: 0.9,
            enforce_citations: false,
            disable_tools: false,
        },
        ("caseplan", _) => CommandProfile {
            model: "anthropic/claude-sonnet-4",
            temperature: 0.2,
            top_p: 0.9,
            enforce_citations: false,
            disable_tools: false,
        },
        ("counselnotes", _) => CommandProfile {
            model: "anthropic/claude-sonnet-4",
            temperature: 0.2,
            top_p: 0.9,
            enforce_citations: true,
            disable_tools: false,
        },
        ("barbrief", _) => CommandProfile {
            model: "anthropic/claude-opus-4",
            temperature: 0.2,
            top_p: 0.9,
            enforce_citations: true,
            disable_tools: false,
        },
        ("verification", _) | ("verify-soundness", _) => CommandProfile {
            model: "anthropic/claude-sonnet-4",
            temperature: 0.0,
            top_p: 0.2,
            enforce_citations: true,
            disable_tools: true,
        },
        ("verification-light", _) => CommandProfile {
            model: "anthropic/claude-sonnet-4",
            temperature: 0.0,
            top_p: 0.2,
            enforce_citations: false,
            disable_tools: true,
        },
        ("verification-heavy", _) => CommandProfile {
            model: "anthropic/claude-opus-4",
            temperature: 0.0,
            top_p: 0.2,
            enforce_citations: true,
            disable_tools: true,
        },
        ("verify-reasoning", _) => CommandProfile {
            model: "anthropic/claude-opus-4",
            temperature: 0.0,
            top_p: 0.2,
            enforce_citations: false,
            disable_tools: true,
        },
        ("cove-questions", _) | ("cove-answers", _) | ("cove-verify", _) | ("cove-final", _) => {
            CommandProfile {
                model: "anthropic/claude-sonnet-4",
                temperature: 0.0,
                top_p: 0.2,
                enforce_citations: false,
                disable_tools: true,
            }
        }
        _ => {
            let key = match mode {
                Some(mode) => format!("{command}:{mode}"),
                None => command.to_string(),
            };
            return Err(LlmError::UnknownCommand(key));
        }
    };
    Ok(profile)
}

/// Builds a configured [`LlmClient`] for a command, optionally disambiguated
/// by `mode` (e.g. `brainstorm`'s `orthodox`/`unorthodox`/`analysis` passes).
/// `overrides` layers additional default parameters on top of the command's
/// profile, mirroring the original's `**overrides` kwargs passthrough.
pub fn for_command(
    http: reqwest::Client,
    config: Arc<Config>,
    command: &str,
    mode: Option<&str>,
    overrides: serde_json::Map<String, Value>,
) -> Result<LlmClient, LlmError> {
    let profile = profile_for(command, mode)?;

    let mut default_params = serde_json::Map::new();
    default_params.insert("temperature".to_string(), json!(profile.temperature));
    default_params.insert("top_p".to_string(), json!(profile.top_p));
    for (k, v) in overrides {
        default_params.insert(k, v);
    }

    let mut client = LlmClient::new(http, config, profile.model, default_params);
    client.disable_tools = profile.disable_tools;
    client.enforce_citations = profile.enforce_citations;
    client.command_context = Some(match mode {
        Some(mode) => format!("{command}:{mode}"),
        None => command.to_string(),
    });
    Ok(client)
}

/// The model name a command would use, without constructing a client.
pub fn get_model_for_command(command: &str) -> Result<&'static str, LlmError> {
    Ok(profile_for(command, None)?.model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_uses_gemini() {
        assert_eq!(get_model_for_command("lookup").unwrap(), "google/gemini-2.5-pro");
    }

    #[test]
    fn extractfacts_enforces_citations() {
        let profile = profile_for("extractfacts", None).unwrap();
        assert!(profile.enforce_citations);
        assert_eq!(profile.temperature, 0.0);
    }

    #[test]
    fn brainstorm_modes_pick_distinct_models() {
        assert_ne!(
            profile_for("brainstorm", Some("orthodox")).unwrap().model,
            profile_for("brainstorm", Some("unorthodox")).unwrap().model
        );
    }

    #[test]
    fn unknown_command_raises_rather_than_falling_back() {
        assert!(matches!(
            get_model_for_command("nonexistent"),
            Err(LlmError::UnknownCommand(_))
        ));
    }
}
