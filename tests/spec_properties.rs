//! Cross-module property and literal-scenario tests.
//!
//! Each test name references the testable property or end-to-end scenario it
//! exercises; module-local unit tests already cover extraction boundary
//! cases, citation normalization round-trips, and international-citation
//! classification, so this file focuses on the properties that span more
//! than one module.

use std::collections::HashMap;
use std::sync::Arc;

use litassist_core::citation::cache::{clear_verification_cache, get_from_cache};
use litassist_core::citation::verify::verify_single_citation;
use litassist_core::llm::parameter_handler::get_model_parameters;
use litassist_core::reasoning_trace::{extract_reasoning_trace, verify_reasoning_trace};
use litassist_core::truncation::{execute_with_truncation, TruncationManager};
use litassist_core::verification_chain::{format_cove_report, CoveResult};
use litassist_core::Config;

const MINIMAL_CONFIG: &str = r#"
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
"#;

fn test_config() -> Config {
    Config::from_toml_str(MINIMAL_CONFIG).expect("minimal config should parse")
}

/// Scenario 6: parameter filtering for `openai/o3-pro`.
#[test]
fn parameter_filtering_for_o3_pro_matches_literal_scenario() {
    let mut requested = HashMap::new();
    requested.insert("temperature".to_string(), serde_json::json!(0.7));
    requested.insert("top_p".to_string(), serde_json::json!(0.95));
    requested.insert("max_tokens".to_string(), serde_json::json!(1000));
    requested.insert("thinking_effort".to_string(), serde_json::json!("high"));
    requested.insert("presence_penalty".to_string(), serde_json::json!(0.1));

    let filtered = get_model_parameters("openai/o3-pro", &requested);

    assert_eq!(filtered.len(), 2);
    assert_eq!(filtered["max_completion_tokens"], serde_json::json!(1000));
    assert_eq!(filtered["reasoning"], serde_json::json!({"effort": "high"}));
    assert!(!filtered.contains_key("temperature"));
    assert!(!filtered.contains_key("top_p"));
    assert!(!filtered.contains_key("presence_penalty"));
    assert!(!filtered.contains_key("max_tokens"));
}

/// Invariant: `thinking_effort` and `reasoning_effort` are never both
/// present in the filtered parameter set.
#[test]
fn thinking_effort_and_reasoning_effort_are_mutually_exclusive() {
    let mut requested = HashMap::new();
    requested.insert("thinking_effort".to_string(), serde_json::json!("high"));
    requested.insert("reasoning_effort".to_string(), serde_json::json!("low"));

    let filtered = get_model_parameters("openai/o3-pro", &requested);

    assert!(!(filtered.contains_key("reasoning_effort") && filtered.contains_key("thinking_effort")));
}

/// Scenario 3: drop-largest truncation retries twice, dropping "big" then
/// "mid", and succeeds with only "small" remaining.
#[tokio::test]
async fn drop_largest_truncation_matches_literal_scenario() {
    let documents = vec![
        ("small".to_string(), "a".repeat(100)),
        ("big".to_string(), "a".repeat(10_000)),
        ("mid".to_string(), "a".repeat(2_000)),
    ];

    let calls = std::sync::atomic::AtomicU32::new(0);
    let dropped_order = std::sync::Mutex::new(Vec::new());
    let mut log_fn = |dropped: &str, _remaining: &[String], _attempt: u32| {
        dropped_order.lock().unwrap().push(dropped.to_string());
    };

    let result = execute_with_truncation(
        |docs| format!("prompt over {} docs", docs.len()),
        documents,
        |_prompt| {
            let n = calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(litassist_core::error::LlmError::NonRetryable(
                        "exceeded maximum context length".to_string(),
                    ))
                } else {
                    Ok(("done".to_string(), litassist_core::llm::Usage::default()))
                }
            }
        },
        None,
        Some(&mut log_fn),
    )
    .await;

    assert_eq!(result.unwrap().0, "done");
    assert_eq!(
        dropped_order.into_inner().unwrap(),
        vec!["big".to_string(), "mid".to_string()]
    );
}

/// Invariant: the TruncationManager never retries on a non-token-limit
/// error — it must propagate immediately without dropping any document.
#[tokio::test]
async fn non_token_error_is_not_retried() {
    let documents = vec![("only".to_string(), "x".repeat(10))];
    let calls = std::sync::atomic::AtomicU32::new(0);

    let result = execute_with_truncation(
        |_docs| "prompt".to_string(),
        documents,
        |_prompt| {
            calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            async { Err(litassist_core::error::LlmError::Authentication("bad key".to_string())) }
        },
        None,
        None,
    )
    .await;

    assert!(result.is_err());
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

/// Invariant: `format_cove_report` returns a string for every input, even
/// when the stage contents are empty.
#[test]
fn cove_report_renders_even_with_empty_stage_content() {
    let result = CoveResult {
        questions: String::new(),
        answers: String::new(),
        issues: String::new(),
        passed: false,
        regenerated: true,
        final_content_length: 0,
        original_content_length: 0,
    };
    let report = format_cove_report(&result);
    assert!(report.contains("ISSUES FOUND"));
}

/// Invariant: citation verification caches its result, so a second lookup
/// of the same citation returns identical data without recomputing (the
/// international short-circuit never touches the network either way, but
/// the cache write/read path itself must round-trip faithfully).
#[tokio::test]
async fn citation_verification_is_idempotent_via_cache() {
    clear_verification_cache();
    let http = reqwest::Client::new();
    let config = Arc::new(test_config());

    let first = verify_single_citation(&http, &config, "[1994] 1 AC 324").await;
    assert!(first.exists);
    assert!(get_from_cache("[1994] 1 AC 324").is_some());

    let second = verify_single_citation(&http, &config, "[1994] 1 AC 324").await;
    assert_eq!(first.exists, second.exists);
    assert_eq!(first.url, second.url);
    assert_eq!(first.reason, second.reason);
}

/// Boundary: `TruncationManager::can_retry` is false once the document set
/// is exhausted, regardless of `max_attempts`.
#[test]
fn cannot_retry_once_all_documents_are_dropped() {
    let mut manager = TruncationManager::new(vec![("only".to_string(), "x".to_string())], None);
    assert!(manager.can_retry());
    manager.drop_largest();
    assert!(!manager.can_retry());
}

/// §4.5 reasoning trace: a block with every field just under its minimum
/// length is extracted successfully but flagged incomplete on every
/// threshold simultaneously.
#[test]
fn reasoning_trace_length_thresholds_are_enforced_independently() {
    let block = "\
## Issue
Too brief

## Applicable Law
Still too short

## Application
Also not long enough

## Conclusion
Brief

## Confidence
40

## Sources
- Some Act 2000
";

    let trace = extract_reasoning_trace(block, "verify").expect("well-formed IRAC headings extract");
    let status = verify_reasoning_trace(&trace);

    assert!(!status.complete);
    assert!(status.issues.iter().any(|i| i.contains("Issue statement")));
    assert!(status.issues.iter().any(|i| i.contains("Applicable law")));
    assert!(status.issues.iter().any(|i| i.contains("Application")));
    assert!(status.issues.iter().any(|i| i.contains("Conclusion")));
}
