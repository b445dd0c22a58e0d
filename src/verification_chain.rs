//! Soundness-check orchestrator and the four-stage Chain-of-Verification
//! (CoVe) pipeline.
//!
//! Port of `original_source/litassist/verification_chain.py`. Per the §9
//! open-question resolution, [`run_verification_chain`] implements only the
//! Patterns/Database/LLM-verify stages and never invokes CoVe itself — CoVe
//! is a separate entry point ([`run_cove_verification`]) that command-level
//! callers invoke directly.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use crate::audit::{log_task_event, save_log};
use crate::citation::{context::fetch_citation_context, patterns::validate_citation_patterns, verify::verify_all_citations};
use crate::config::Config;
use crate::error::LlmError;
use crate::llm::verification::verify;
use crate::llm::{factory, Message};
use crate::prompts::PromptRegistry;
use crate::truncation::TruncationManager;

const HIGH_RISK_COMMANDS: &[&str] = &["extractfacts", "strategy", "draft"];
const STRICT_COMMANDS: &[&str] = &["extractfacts", "strategy"];

#[derive(Debug, Clone, Default, Serialize)]
pub struct PatternStage {
    pub issues: Vec<String>,
    pub passed: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DatabaseStage {
    pub verified: Vec<String>,
    pub unverified: Vec<(String, String)>,
    pub passed: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LlmStage {
    pub corrections_made: bool,
    pub passed: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VerificationChainResults {
    pub patterns: Option<PatternStage>,
    pub database: Option<DatabaseStage>,
    pub llm: Option<LlmStage>,
}

/// Runs the Patterns → Database → LLM-verify chain over `content`,
/// returning (possibly LLM-corrected) content plus a record of every stage
/// that ran. High-risk commands exit early on pattern issues; strict
/// commands exit early on unverified citations.
pub async fn run_verification_chain(
    http: &reqwest::Client,
    config: &Arc<Config>,
    content: &str,
    command: &str,
    skip_stages: &HashSet<&str>,
) -> Result<(String, VerificationChainResults), LlmError> {
    let mut results = VerificationChainResults::default();
    let mut content = content.to_string();

    if !skip_stages.contains("patterns") {
        let issues = validate_citation_patterns(&content, false);
        let passed = issues.is_empty();
        let terminal = !issues.is_empty() && HIGH_RISK_COMMANDS.contains(&command);
        results.patterns = Some(PatternStage { issues, passed });
        if terminal {
            return Ok((content, results));
        }
    }

    let patterns_passed = results.patterns.as_ref().map_or(true, |p| p.passed);
    if !skip_stages.contains("database") && patterns_passed {
        let (verified, unverified) = verify_all_citations(http, config, &content).await;
        let passed = unverified.is_empty();
        let terminal = !unverified.is_empty() && STRICT_COMMANDS.contains(&command);
        results.database = Some(DatabaseStage { verified, unverified, passed });
        if terminal {
            return Ok((content, results));
        }
    }

    if !skip_stages.contains("llm") && HIGH_RISK_COMMANDS.contains(&command) {
        let client = factory::for_command(
            http.clone(),
            Arc::clone(config),
            "verification",
            None,
            serde_json::Map::new(),
        )?;
        let citation_report = format_simple_report(results.database.as_ref());
        let (corrected_content, _model_name) =
            verify(&client, &content, citation_report.as_deref(), None).await?;

        let corrections_made = corrected_content != content;
        results.llm = Some(LlmStage { corrections_made, passed: true });
        if corrections_made {
            content = corrected_content;
        }
    }

    Ok((content, results))
}

fn format_simple_report(database: Option<&DatabaseStage>) -> Option<String> {
    let database = database?;
    if database.verified.is_empty() && database.unverified.is_empty() {
        return None;
    }
    let mut report = format!("Verified: {}\n", database.verified.len());
    if !database.unverified.is_empty() {
        let names: Vec<&str> = database.unverified.iter().map(|(c, _)| c.as_str()).collect();
        report.push_str(&format!("Unverified: {}", names.join(", ")));
    }
    Some(report)
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PriorContexts {
    pub citations: bool,
    pub reasoning: bool,
    pub soundness_issue_count: usize,
    pub cove_reference_files: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoveResult {
    pub questions: String,
    pub answers: String,
    pub issues: String,
    pub passed: bool,
    pub regenerated: bool,
    pub final_content_length: usize,
    pub original_content_length: usize,
}

/// Runs the four CoVe stages (questions → answers → inconsistency detection
/// → regeneration) in strict sequence, persisting each stage's full
/// prompt/response to the audit log and emitting `task_event_*` records.
pub async fn run_cove_verification(
    http: &reqwest::Client,
    config: &Arc<Config>,
    content: &str,
    command: &str,
    prior_contexts: &PriorContexts,
) -> Result<(String, CoveResult), LlmError> {
    let client_questions = factory::for_command(
        http.clone(),
        Arc::clone(config),
        "cove-questions",
        None,
        serde_json::Map::new(),
    )?;
    let client_answers = factory::for_command(
        http.clone(),
        Arc::clone(config),
        "cove-answers",
        None,
        serde_json::Map::new(),
    )?;
    let client_verify = factory::for_command(
        http.clone(),
        Arc::clone(config),
        "cove-verify",
        None,
        serde_json::Map::new(),
    )?;

    let mut context_summary = String::new();
    if prior_contexts.citations {
        context_summary.push_str("\n\n=== PRIOR VERIFICATION: CITATIONS ===\n");
        context_summary.push_str("Citation verification found issues that should be addressed.\n");
        context_summary.push_str("=== END PRIOR VERIFICATION: CITATIONS ===\n");
    }
    if prior_contexts.reasoning {
        context_summary.push_str("\n\n=== PRIOR VERIFICATION: REASONING ===\n");
        context_summary.push_str("Reasoning trace has been verified and validated.\n");
        context_summary.push_str("=== END PRIOR VERIFICATION: REASONING ===\n");
    }
    if prior_contexts.soundness_issue_count > 0 {
        context_summary.push_str("\n\n=== PRIOR VERIFICATION: SOUNDNESS ===\n");
        context_summary.push_str(&format!(
            "Legal soundness check identified {} issues requiring attention.\n",
            prior_contexts.soundness_issue_count
        ));
        context_summary.push_str("=== END PRIOR VERIFICATION: SOUNDNESS ===\n");
    }

    // Stage 1: questions.
    let questions_prompt = PromptRegistry::get_formatted(
        "verification.cove.questions_generation",
        &[("context", &context_summary), ("content", content)],
    )
    .unwrap_or_default();

    log_task_event(config, command, "cove-questions", "start", "Generating verification questions", None)
        .ok();
    log_task_event(
        config,
        command,
        "cove-questions",
        "llm_call",
        "Sending questions prompt to LLM",
        Some(json!({"model": client_questions.model, "prompt_length": questions_prompt.chars().count()})),
    )
    .ok();

    let (questions, usage1) = client_questions
        .complete(vec![Message::user(questions_prompt.clone())], true, serde_json::Map::new())
        .await?;

    log_task_event(
        config,
        command,
        "cove-questions",
        "llm_response",
        "Received questions from LLM",
        Some(json!({"model": client_questions.model, "response_length": questions.chars().count(), "usage": usage1})),
    )
    .ok();

    // Stage 1.5: extract citations from the questions and fetch full legal context.
    let citations = crate::citation::patterns::extract_citations(&questions);
    let legal_context = if citations.is_empty() {
        save_log(
            config,
            "cove_no_citations_found",
            json!({"command": command, "questions_sample": truncate_for_log(&questions, 500)}),
        )
        .ok();
        std::collections::HashMap::new()
    } else {
        save_log(
            config,
            "cove_citation_extraction",
            json!({"command": command, "citations_found": citations, "count": citations.len()}),
        )
        .ok();
        let fetched = fetch_citation_context(http, config, &citations).await;
        if fetched.is_empty() {
            save_log(
                config,
                "cove_citation_fetch_empty",
                json!({"command": command, "citations_requested": citations}),
            )
            .ok();
        } else {
            let total_chars: usize = fetched.values().map(|v| v.len()).sum();
            save_log(
                config,
                "cove_citation_context",
                json!({"command": command, "citations_fetched": fetched.keys().collect::<Vec<_>>(), "total_chars": total_chars}),
            )
            .ok();
        }
        fetched
    };

    // Stage 2: independent answers, with drop-largest retry on token-limit errors.
    log_task_event(config, command, "cove-answers", "start", "Answering verification questions", None).ok();

    let reference_context = prior_contexts.cove_reference_files.clone().unwrap_or_default();
    let mut manager = TruncationManager::new(legal_context.into_iter().collect(), Some(5));
    let mut answers: Option<String> = None;
    let mut usage2 = Value::Null;

    loop {
        let has_any_context = !manager.documents().is_empty() || !reference_context.is_empty();
        let mut context_text = String::new();
        if !manager.documents().is_empty() {
            context_text.push_str("\n=== LEGAL AUTHORITIES (FULL TEXT) ===\n");
            for (citation, full_text) in manager.documents() {
                context_text.push_str(&format!("\n=== {citation} ===\n{full_text}\n=== END {citation} ===\n\n"));
            }
            context_text.push_str("=== END LEGAL AUTHORITIES ===\n\n");
        }
        if !reference_context.is_empty() {
            context_text.push_str("\n=== REFERENCE DOCUMENTS ===\n");
            context_text.push_str(&reference_context);
            context_text.push_str("=== END REFERENCE DOCUMENTS ===\n\n");
        }

        let answers_prompt = if has_any_context {
            PromptRegistry::get_formatted(
                "verification.cove.answers_with_context",
                &[("questions", &questions), ("legal_context", &context_text)],
            )
        } else {
            PromptRegistry::get_formatted("verification.cove.answers_verification", &[("content", &questions)])
        }
        .unwrap_or_default();

        log_task_event(
            config,
            command,
            "cove-answers",
            "llm_call",
            "Sending answers prompt to LLM",
            Some(json!({"model": client_answers.model, "prompt_length": answers_prompt.chars().count(), "attempt": manager.attempt() + 1})),
        )
        .ok();

        match client_answers
            .complete(vec![Message::user(answers_prompt.clone())], true, serde_json::Map::new())
            .await
        {
            Ok((text, usage)) => {
                answers = Some(text);
                usage2 = serde_json::to_value(usage).unwrap_or(Value::Null);
                break;
            }
            Err(error) if TruncationManager::is_token_error(&error) => {
                let Some(dropped_name) = manager.drop_largest() else {
                    return Err(error);
                };
                let remaining: Vec<String> = manager.documents().iter().map(|(n, _)| n.clone()).collect();
                save_log(
                    config,
                    "cove_answers_scaling_drop",
                    json!({"command": command, "dropped_case": dropped_name, "remaining_cases": remaining, "attempt": manager.attempt() + 1, "error": error.to_string()}),
                )
                .ok();
                manager.record_attempt();
                if !manager.can_retry() {
                    return Err(error);
                }
            }
            Err(error) => return Err(error),
        }
    }
    let answers = answers.expect("loop only exits with Some(answers) or an early Err return");

    log_task_event(
        config,
        command,
        "cove-answers",
        "llm_response",
        "Received independent answers from LLM",
        Some(json!({"model": client_answers.model, "response_length": answers.chars().count(), "usage": usage2})),
    )
    .ok();

    // Stage 3: inconsistency detection.
    let verify_prompt = PromptRegistry::get_formatted(
        "verification.cove.inconsistency_detection",
        &[("context", &answers), ("content", content)],
    )
    .unwrap_or_default();

    log_task_event(config, command, "cove-verify", "start", "Detecting inconsistencies against the original", None).ok();
    log_task_event(
        config,
        command,
        "cove-verify",
        "llm_call",
        "Sending verification (inconsistency detection) prompt to LLM",
        Some(json!({"model": client_verify.model, "prompt_length": verify_prompt.chars().count()})),
    )
    .ok();

    let (issues, usage3) = client_verify
        .complete(vec![Message::user(verify_prompt)], true, serde_json::Map::new())
        .await?;

    log_task_event(
        config,
        command,
        "cove-verify",
        "llm_response",
        "Received inconsistency report from LLM",
        Some(json!({"model": client_verify.model, "response_length": issues.chars().count(), "usage": usage3})),
    )
    .ok();

    let passed = issues.to_lowercase().contains("no issues found");

    // Stage 4: regeneration, only if issues were found.
    let final_content = if passed {
        content.to_string()
    } else {
        let client_final = factory::for_command(
            http.clone(),
            Arc::clone(config),
            "cove-final",
            None,
            serde_json::Map::new(),
        )?;
        let regenerate_prompt = PromptRegistry::get_formatted(
            "verification.cove.regeneration",
            &[("context", &issues), ("prompt", &answers), ("content", content)],
        )
        .unwrap_or_default();

        log_task_event(config, command, "cove-regenerate", "start", "Regenerating corrected document", None).ok();
        log_task_event(
            config,
            command,
            "cove-regenerate",
            "llm_call",
            "Sending regeneration prompt to LLM",
            Some(json!({"model": client_final.model, "prompt_length": regenerate_prompt.chars().count()})),
        )
        .ok();

        let (regenerated, usage4) = client_final
            .complete(vec![Message::user(regenerate_prompt)], true, serde_json::Map::new())
            .await?;

        log_task_event(
            config,
            command,
            "cove-regenerate",
            "llm_response",
            "Received regenerated document from LLM",
            Some(json!({"model": client_final.model, "response_length": regenerated.chars().count(), "usage": usage4})),
        )
        .ok();

        regenerated
    };

    save_log(
        config,
        &format!("cove_{command}_summary"),
        json!({
            "command": command,
            "prior_contexts": {
                "had_citations": prior_contexts.citations,
                "had_reasoning": prior_contexts.reasoning,
                "had_soundness": prior_contexts.soundness_issue_count > 0,
                "had_cove_reference": prior_contexts.cove_reference_files.is_some(),
            },
            "result": {"passed": passed, "issues_found": if passed { "None".to_string() } else { issues.clone() }},
        }),
    )
    .ok();

    let result = CoveResult {
        final_content_length: final_content.chars().count(),
        original_content_length: content.chars().count(),
        regenerated: !passed,
        passed,
        questions,
        answers,
        issues,
    };
    Ok((final_content, result))
}

fn truncate_for_log(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Formats a [`CoveResult`] into a readable Markdown report.
pub fn format_cove_report(result: &CoveResult) -> String {
    format!(
        "## Chain of Verification Report\n\n\
         **Status**: {}\n\n\
         ### Verification Questions\n{}\n\n\
         ### Independent Answers\n{}\n\n\
         ### Verification Results\n{}",
        if result.passed { "PASSED" } else { "ISSUES FOUND" },
        result.questions,
        result.answers,
        result.issues,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_cove_report_includes_status_and_sections() {
        let result = CoveResult {
            questions: "Q1?".to_string(),
            answers: "A1.".to_string(),
            issues: "No issues found".to_string(),
            passed: true,
            regenerated: false,
            final_content_length: 10,
            original_content_length: 10,
        };
        let report = format_cove_report(&result);
        assert!(report.contains("**Status**: PASSED"));
        assert!(report.contains("Q1?"));
    }

    #[test]
    fn format_simple_report_summarises_verified_and_unverified() {
        let database = DatabaseStage {
            verified: vec!["A".to_string()],
            unverified: vec![("B".to_string(), "not found".to_string())],
            passed: false,
        };
        let report = format_simple_report(Some(&database)).unwrap();
        assert!(report.contains("Verified: 1"));
        assert!(report.contains("Unverified: B"));
    }

    #[test]
    fn format_simple_report_none_when_no_citations() {
        let database = DatabaseStage::default();
        assert!(format_simple_report(Some(&database)).is_none());
    }
}
