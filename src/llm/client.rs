//! Unified chat-completion client.
//!
//! Port of `original_source/litassist/llm/client.py`'s `LLMClient`. The
//! Python class inherits `LLMVerificationMixin`; this crate keeps that
//! functionality as free functions in `verification.rs` taking `&LlmClient`
//! (see DESIGN.md's resolution of the "should the mixin become a trait"
//! open question — a trait added nothing since there is exactly one
//! implementor).

use std::sync::Arc;

use serde_json::{json, Value};

use crate::audit::save_log;
use crate::config::Config;
use crate::error::LlmError;
use crate::prompts::PromptRegistry;

use super::api_handlers::execute_api_call_with_retry;
use super::citation_handler::{handle_retry_failure, process_citation_verification};
use super::message::{Message, Role};
use super::parameter_handler::{get_model_family, get_model_parameters, supports_system_messages};
use super::response_parser::{extract_content_and_usage, Usage};
use super::retry::handle_citation_retry;
use super::tools::{execute_tool, format_tool_response, get_tool_definitions};

/// Collapses anything that isn't alphanumeric into `_` so a model id or
/// command-context string is safe to use as a log filename tag.
fn sanitize_tag(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

/// A configured chat-completion client for one model, with default
/// decoding parameters and the verification/retry policy this crate wraps
/// around every call.
pub struct LlmClient {
    pub model: String,
    pub default_params: serde_json::Map<String, Value>,
    pub disable_tools: bool,
    pub enforce_citations: bool,
    pub command_context: Option<String>,
    pub(crate) http: reqwest::Client,
    pub(crate) config: Arc<Config>,
}

impl LlmClient {
    /// Builds a client for `model`, applying the configured token limit to
    /// `max_tokens` (or its transformed name) when not already present in
    /// `default_params` and `config.use_token_limits` is set.
    pub fn new(
        http: reqwest::Client,
        config: Arc<Config>,
        model: impl Into<String>,
        mut default_params: serde_json::Map<String, Value>,
    ) -> Self {
        let model = model.into();

        if config.use_token_limits {
            let mut probe = serde_json::Map::new();
            probe.insert("max_tokens".to_string(), json!(1));
            let filtered = get_model_parameters(&model, &probe.into_iter().collect());
            let token_param = if filtered.contains_key("max_completion_tokens") {
                "max_completion_tokens"
            } else {
                "max_tokens"
            };
            if !default_params.contains_key(token_param) {
                default_params.insert(token_param.to_string(), json!(config.token_limit));
            }
        }

        Self {
            model,
            default_params,
            disable_tools: false,
            enforce_citations: true,
            command_context: None,
            http,
            config,
        }
    }

    fn format_date_string(&self) -> String {
        let sydney: chrono_tz::Tz = chrono_tz::Australia::Sydney;
        chrono::Utc::now()
            .with_timezone(&sydney)
            .format("%B %d, %Y")
            .to_string()
    }

    fn prepare_messages_for_model(&self, messages: Vec<Message>) -> Vec<Message> {
        if !supports_system_messages(&self.model) {
            self.merge_system_into_user(messages)
        } else {
            self.add_australian_law_to_system(messages)
        }
    }

    fn merge_system_into_user(&self, messages: Vec<Message>) -> Vec<Message> {
        let (system, non_system): (Vec<_>, Vec<_>) =
            messages.into_iter().partition(|m| m.role == Role::System);

        if system.is_empty() {
            return non_system;
        }

        let mut system_content = system
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        if !system_content.contains("Australian English") {
            system_content.push('\n');
            system_content.push_str(
                PromptRegistry::get("base.australian_law").unwrap_or_default(),
            );
        }

        let Some(first_user_idx) = non_system.iter().position(|m| m.role == Role::User) else {
            return non_system;
        };

        let mut modified = non_system[..first_user_idx].to_vec();
        let merged_content = format!("{system_content}\n\n{}", non_system[first_user_idx].content);
        modified.push(Message::user(merged_content));
        modified.extend_from_slice(&non_system[first_user_idx + 1..]);
        modified
    }

    fn add_australian_law_to_system(&self, messages: Vec<Message>) -> Vec<Message> {
        let Some(australian_law) = PromptRegistry::get("base.australian_law") else {
            return messages;
        };

        messages
            .into_iter()
            .map(|mut msg| {
                if msg.role == Role::System && !msg.content.contains(australian_law) {
                    msg.content = format!("{australian_law}\n\n{}", msg.content);
                }
                msg
            })
            .collect()
    }

    fn add_date_instruction(&self, messages: Vec<Message>) -> Vec<Message> {
        let date_text = if self.disable_tools {
            let today = self.format_date_string();
            PromptRegistry::get_formatted("base.date_fallback_instruction", &[("date", &today)])
                .unwrap_or(today)
        } else {
            PromptRegistry::get("base.date_tool_instruction")
                .unwrap_or_default()
                .to_string()
        };

        let mut date_added = false;
        messages
            .into_iter()
            .map(|mut msg| {
                if !date_added && matches!(msg.role, Role::System | Role::User) {
                    msg.content = format!("{date_text}\n\n{}", msg.content);
                    date_added = true;
                }
                msg
            })
            .collect()
    }

    fn model_name_for_api(&self) -> String {
        if self.model.starts_with("openai/") && get_model_family(&self.model) != "openai_reasoning" {
            self.model.replacen("openai/", "", 1)
        } else {
            self.model.clone()
        }
    }

    /// Validates and verifies citations in `content`, delegating to
    /// [`super::verification::validate_and_verify_citations`].
    pub async fn validate_and_verify_citations(
        &self,
        content: &str,
        strict_mode: bool,
    ) -> Result<(String, Vec<String>), LlmError> {
        super::verification::validate_and_verify_citations(self, content, strict_mode).await
    }

    fn messages_to_json(messages: &[Message]) -> Value {
        json!(messages
            .iter()
            .map(|m| {
                let mut obj = serde_json::Map::new();
                obj.insert("role".to_string(), json!(m.role));
                obj.insert("content".to_string(), json!(m.content));
                if let Some(id) = &m.tool_call_id {
                    obj.insert("tool_call_id".to_string(), json!(id));
                }
                Value::Object(obj)
            })
            .collect::<Vec<_>>())
    }

    /// Runs a single chat completion with this client's model, applying
    /// message preparation, date injection, parameter filtering, the
    /// `now` tool fallback chain, and (unless `skip_citation_verification`)
    /// the citation verification/retry workflow.
    pub async fn complete(
        &self,
        messages: Vec<Message>,
        skip_citation_verification: bool,
        overrides: serde_json::Map<String, Value>,
    ) -> Result<(String, Usage), LlmError> {
        let messages = self.prepare_messages_for_model(messages);
        let messages = self.add_date_instruction(messages);

        let mut params = self.default_params.clone();
        for (k, v) in overrides {
            params.insert(k, v);
        }

        let model_name = self.model_name_for_api();
        let params_map: std::collections::HashMap<String, Value> =
            params.clone().into_iter().collect();
        let filtered_params: serde_json::Map<String, Value> =
            get_model_parameters(&self.model, &params_map).into_iter().collect();

        let messages_json = Self::messages_to_json(&messages);

        let response = if self.disable_tools {
            tracing::info!(model = %self.model, "tools disabled, using date injection fallback");
            execute_api_call_with_retry(
                &self.http,
                &self.config,
                &model_name,
                &messages_json,
                &filtered_params,
            )
            .await?
        } else {
            let mut with_tools = filtered_params.clone();
            with_tools.insert("tools".to_string(), get_tool_definitions());

            let first_attempt = execute_api_call_with_retry(
                &self.http,
                &self.config,
                &model_name,
                &messages_json,
                &with_tools,
            )
            .await;

            match first_attempt {
                Ok(response) => {
                    let empty = response
                        .choices
                        .first()
                        .map(|c| c.message.content.is_none() && c.message.tool_calls.is_none())
                        .unwrap_or(false);
                    if empty {
                        tracing::info!(model = %model_name, "empty response with forced tools, falling back");
                        execute_api_call_with_retry(
                            &self.http,
                            &self.config,
                            &model_name,
                            &messages_json,
                            &filtered_params,
                        )
                        .await?
                    } else {
                        response
                    }
                }
                Err(e) => {
                    let msg = e.to_string().to_lowercase();
                    if msg.contains("tools") || msg.contains("tool_choice") {
                        tracing::info!(model = %model_name, "model doesn't support tools, falling back");
                        execute_api_call_with_retry(
                            &self.http,
                            &self.config,
                            &model_name,
                            &messages_json,
                            &filtered_params,
                        )
                        .await?
                    } else {
                        return Err(e);
                    }
                }
            }
        };

        let mut follow_up_messages = messages.clone();
        let response = if let Some(choice) = response.choices.first() {
            if let Some(tool_calls) = &choice.message.tool_calls {
                for call in tool_calls {
                    let result = execute_tool(&call.function.name)
                        .map_err(LlmError::InvalidResponse)?;
                    let tool_message = format_tool_response(&call.function.name, &result);
                    follow_up_messages.push(Message::assistant(
                        choice.message.content.clone().unwrap_or_default(),
                    ));
                    follow_up_messages.push(Message::tool(tool_message, call.id.clone()));
                }
                let follow_up_json = Self::messages_to_json(&follow_up_messages);
                execute_api_call_with_retry(
                    &self.http,
                    &self.config,
                    &model_name,
                    &follow_up_json,
                    &filtered_params,
                )
                .await?
            } else {
                response
            }
        } else {
            response
        };

        let (mut content, mut usage) = extract_content_and_usage(&response);

        if !skip_citation_verification {
            match process_citation_verification(content.clone(), self, false).await {
                Ok((verified_content, _issues)) => content = verified_content,
                Err(citation_error) => {
                    let exec_http = self.http.clone();
                    let exec_config = Arc::clone(&self.config);
                    let exec_model_name = model_name.clone();
                    let exec_filtered_params = filtered_params.clone();

                    let retry_result = handle_citation_retry(
                        &citation_error,
                        &follow_up_messages,
                        move |enhanced| async move {
                            let enhanced_json = Self::messages_to_json(&enhanced);
                            let retry_response = execute_api_call_with_retry(
                                &exec_http,
                                &exec_config,
                                &exec_model_name,
                                &enhanced_json,
                                &exec_filtered_params,
                            )
                            .await?;
                            let (c, u) = extract_content_and_usage(&retry_response);
                            Ok::<_, LlmError>((c, u))
                        },
                        move |retry_content| async move {
                            self.validate_and_verify_citations(&retry_content, true).await
                        },
                    )
                    .await;

                    match retry_result {
                        Ok((verified_retry_content, retry_usage, retry_issues)) => {
                            content = verified_retry_content;
                            usage = retry_usage;
                            if retry_issues.is_empty() {
                                let msg = PromptRegistry::get("warnings.all_citations_verified")
                                    .unwrap_or("Retry successful: All citations verified");
                                tracing::info!("{msg}");
                            }
                        }
                        Err(retry_error) => return Err(handle_retry_failure(&retry_error)),
                    }
                }
            }
        }

        tracing::debug!(model = %self.model, command_context = ?self.command_context, "completion finished");

        let audit_key = self.command_context.as_deref().unwrap_or(&self.model);
        save_log(
            &self.config,
            &format!("llm_{}", sanitize_tag(audit_key)),
            json!({
                "model": self.model,
                "command_context": self.command_context,
                "messages": messages_json,
                "response_length": content.chars().count(),
                "usage": usage,
            }),
        )
        .ok();

        Ok((content, usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config::from_toml_str(
            r#"
            [openrouter]
            api_key = "sk-or-test"
            [openai]
            api_key = "sk-oa-test"
            [google_cse]
            api_key = "g-test"
            cse_id = "cse-test"
            [pinecone]
            api_key = "pc-test"
            environment = "us-west1-gcp"
            index = "litassist"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn token_limit_applied_when_absent() {
        let client = LlmClient::new(
            reqwest::Client::new(),
            Arc::new(test_config()),
            "anthropic/claude-sonnet-4",
            serde_json::Map::new(),
        );
        assert_eq!(client.default_params["max_tokens"], json!(16384));
    }

    #[test]
    fn token_limit_not_overridden_when_present() {
        let mut params = serde_json::Map::new();
        params.insert("max_tokens".to_string(), json!(42));
        let client = LlmClient::new(
            reqwest::Client::new(),
            Arc::new(test_config()),
            "anthropic/claude-sonnet-4",
            params,
        );
        assert_eq!(client.default_params["max_tokens"], json!(42));
    }

    #[test]
    fn openai_prefix_is_stripped_for_standard_models() {
        let client = LlmClient::new(
            reqwest::Client::new(),
            Arc::new(test_config()),
            "openai/gpt-4o",
            serde_json::Map::new(),
        );
        assert_eq!(client.model_name_for_api(), "gpt-4o");
    }

    #[test]
    fn openai_reasoning_prefix_is_preserved() {
        let client = LlmClient::new(
            reqwest::Client::new(),
            Arc::new(test_config()),
            "openai/o3-pro",
            serde_json::Map::new(),
        );
        assert_eq!(client.model_name_for_api(), "openai/o3-pro");
    }

    #[test]
    fn merges_system_into_first_user_message_for_reasoning_models() {
        let client = LlmClient::new(
            reqwest::Client::new(),
            Arc::new(test_config()),
            "openai/o3-pro",
            serde_json::Map::new(),
        );
        let messages = vec![Message::system("Be terse."), Message::user("Hello")];
        let prepared = client.prepare_messages_for_model(messages);
        assert_eq!(prepared.len(), 1);
        assert_eq!(prepared[0].role, Role::User);
        assert!(prepared[0].content.contains("Be terse."));
        assert!(prepared[0].content.contains("Hello"));
    }

    #[test]
    fn sanitize_tag_lowercases_and_collapses_punctuation() {
        assert_eq!(sanitize_tag("anthropic/claude-sonnet-4.5"), "anthropic_claude_sonnet_4_5");
        assert_eq!(sanitize_tag("cove-questions:draft"), "cove_questions_draft");
    }
}
