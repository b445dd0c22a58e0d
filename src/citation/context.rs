//! Legal-authority context fetching for citations.
//!
//! Port of `original_source/litassist/citation_context.py`: given a list of
//! citations, locate and fetch the full document text for each, used to
//! ground CoVe's answer stage and reasoning-trace verification.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

use crate::config::Config;
use crate::fetch::fetch_url;

use super::legislation::is_legislation_reference;

/// A small table of Acts whose government-PDF URL Google search often
/// misses, overriding CSE/AustLII lookup entirely. Distinct from
/// `constants::HARDCODED_FOIA_FILES` (which short-circuits *verification*
/// with a local file path) — this one is a remote URL used only by context
/// fetching.
pub static HARDCODED_LEGISLATION_URLS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let foia_url =
        "https://www.legislation.gov.au/C2004A02562/2025-02-21/2025-02-21/text/original/pdf";
    [
        ("Freedom of Information Act 1982", foia_url),
        ("Freedom of Information Act 1982 (Cth)", foia_url),
        ("Freedom of Information Act 1982 (Commonwealth)", foia_url),
        ("FOI Act 1982", foia_url),
        ("FOI Act 1982 (Cth)", foia_url),
    ]
    .into_iter()
    .collect()
});

/// Process-wide "last AustLII request completion" timestamp (milliseconds
/// since epoch), shared between this module's rate limiter and the
/// verification path's (SPEC_FULL.md §5). A single `AtomicU64` is
/// sufficient: reads/writes don't need to be atomic-with-the-decision, only
/// monotonically advancing.
static LAST_AUSTLII_COMPLETION_MS: AtomicU64 = AtomicU64::new(0);

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Waits out the shared AustLII rate-limit gap (uniform random 2.0-3.0s
/// since the last completed AustLII request), then records this request's
/// completion.
pub async fn austlii_rate_limit() {
    let last = LAST_AUSTLII_COMPLETION_MS.load(Ordering::SeqCst);
    let now = now_ms();
    let gap_ms = rand::rng().random_range(2000..=3000);
    let elapsed = now.saturating_sub(last);
    if elapsed < gap_ms {
        tokio::time::sleep(Duration::from_millis(gap_ms - elapsed)).await;
    }
    LAST_AUSTLII_COMPLETION_MS.store(now_ms(), Ordering::SeqCst);
}

static BOILERPLATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)Copyright.*?(?:\n|$)",
        r"(?i)©.*?(?:\n|$)",
        r"(?i)Privacy\s*(?:Policy|Statement)?.*?(?:\n|$)",
        r"(?i)Terms\s+of\s+[Uu]se.*?(?:\n|$)",
        r"(?i)Disclaimer.*?(?:\n|$)",
        r"(?i)Contact\s+[Uu]s.*?(?:\n|$)",
        r"(?i)Page\s+\d+\s+of\s+\d+",
        r"(?i)\[Home\]\[Index\]\[Search\]",
        r"(?i)Last\s+updated\s*:.*?(?:\n|$)",
        r"(?i)This\s+document\s+is\s+available\s+at.*?(?:\n|$)",
        r"(?i)Skip\s+to\s+main.*?(?:\n|$)",
        r"(?i)AIATSIS\s+acknowledges.*?(?:\n|$)",
        r"(?i)Federal\s+Register\s+of\s+Legislation.*?(?:\n|$)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Strips known boilerplate footers and collapses excess blank lines. Never
/// truncates content.
pub fn clean_document(content: &str) -> String {
    let mut cleaned = content.to_string();
    for pattern in BOILERPLATE_PATTERNS.iter() {
        cleaned = pattern.replace_all(&cleaned, "").to_string();
    }
    let collapse_blank_lines = Regex::new(r"\n{3,}").unwrap();
    cleaned = collapse_blank_lines.replace_all(&cleaned, "\n\n").to_string();
    cleaned.trim().to_string()
}

fn strip_jurisdiction_suffix(name: &str) -> String {
    Regex::new(r"\s*\([A-Za-z]+\)\s*$")
        .unwrap()
        .replace(name, "")
        .trim()
        .to_string()
}

/// Validates that fetched `content` genuinely corresponds to `citation` by
/// checking the first ~500 characters for the core citation/name (with
/// jurisdiction suffix stripped for legislation, bracket/whitespace
/// normalized for medium-neutral citations).
pub fn validate_citation_match(content: &str, citation: &str) -> bool {
    if citation.contains('\n') {
        return false;
    }

    let window: String = content.chars().take(500).collect();
    let window_lower = window.to_lowercase();

    if is_legislation_reference(citation) {
        let core_name = strip_jurisdiction_suffix(citation).to_lowercase();
        return window_lower.contains(&core_name);
    }

    let normalized = citation
        .replace(['[', ']', '(', ')'], "")
        .to_lowercase();
    window_lower.contains(&normalized)
}

/// Extracts the section containing `section N`/`s N` plus one adjoining
/// section on each side, or the full document if no section reference is
/// present.
pub fn extract_section_context(document: &str, citation: &str) -> String {
    let section_re = Regex::new(r"(?i)\bs(?:ection)?\.?\s*(\d+[A-Za-z]?)\b").unwrap();
    let Some(caps) = section_re.captures(citation) else {
        return document.to_string();
    };
    let Ok(section_num) = caps[1].trim_end_matches(|c: char| c.is_alphabetic()).parse::<i64>()
    else {
        return document.to_string();
    };

    let heading_re = Regex::new(r"(?im)^\s*(\d+[A-Za-z]?)\.?\s").unwrap();
    let headings: Vec<(i64, usize)> = heading_re
        .captures_iter(document)
        .filter_map(|c| {
            let n: i64 = c[1]
                .trim_end_matches(|ch: char| ch.is_alphabetic())
                .parse()
                .ok()?;
            Some((n, c.get(0).unwrap().start()))
        })
        .collect();

    if headings.is_empty() {
        return document.to_string();
    }

    let target_index = headings
        .iter()
        .position(|(n, _)| *n == section_num)
        .unwrap_or(0);
    let start_index = target_index.saturating_sub(1);
    let end_index = (target_index + 2).min(headings.len());

    let start_offset = headings[start_index].1;
    let end_offset = if end_index < headings.len() {
        headings[end_index].1
    } else {
        document.len()
    };

    document[start_offset..end_offset].to_string()
}

/// Fetches the full legal-authority text for each of `citations`, returning
/// a map keyed by citation. Best-effort: a citation with no fetchable
/// source is simply absent from the result (the original logs and
/// continues rather than aborting).
pub async fn fetch_citation_context(
    http: &reqwest::Client,
    config: &Config,
    citations: &[String],
) -> HashMap<String, String> {
    let mut context = HashMap::new();

    for citation in citations {
        if citation.to_lowercase().contains("jade.io") {
            continue;
        }

        let is_legislation = is_legislation_reference(citation);

        let url = if let Some(hardcoded) = HARDCODED_LEGISLATION_URLS.get(citation.as_str()) {
            hardcoded.to_string()
        } else if is_legislation {
            find_legislation_url(http, config, citation).await
        } else {
            find_case_law_url(http, config, citation).await
        };

        if url.is_empty() {
            continue;
        }

        let fetched = fetch_url(http, config, &url, Duration::from_secs(15)).await;
        let Ok(raw) = fetched else { continue };

        if !validate_citation_match(&raw, citation) {
            continue;
        }

        let cleaned = clean_document(&raw);
        let extracted = extract_section_context(&cleaned, citation);
        context.insert(citation.clone(), extracted);

        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    context
}

async fn find_legislation_url(http: &reqwest::Client, config: &Config, citation: &str) -> String {
    use super::google_cse::search_legal_database_via_cse;

    let pdf_query = format!("{citation} PDF");
    let pdf_result = search_legal_database_via_cse(
        http,
        config,
        &pdf_query,
        Some(&config.cse_id_comprehensive),
        Duration::from_secs(10),
    )
    .await;
    if pdf_result.success && pdf_result.url.contains(".gov.au") {
        return pdf_result.url;
    }

    austlii_rate_limit().await;
    let austlii = search_legal_database_via_cse(
        http,
        config,
        citation,
        Some(&config.cse_id_austlii),
        Duration::from_secs(10),
    )
    .await;
    if austlii.success && austlii.url.contains("/au/legis/") {
        return austlii.url;
    }

    let fallback = search_legal_database_via_cse(
        http,
        config,
        citation,
        Some(&config.cse_id_comprehensive),
        Duration::from_secs(10),
    )
    .await;
    if fallback.success && fallback.url.contains(".gov.au") {
        return fallback.url;
    }

    String::new()
}

async fn find_case_law_url(http: &reqwest::Client, config: &Config, citation: &str) -> String {
    use super::austlii::construct_austlii_url;
    use super::google_cse::search_legal_database_via_cse;

    austlii_rate_limit().await;
    let austlii = search_legal_database_via_cse(
        http,
        config,
        citation,
        Some(&config.cse_id_austlii),
        Duration::from_secs(10),
    )
    .await;
    if austlii.success && austlii.url.contains("/au/cases/") {
        return austlii.url;
    }

    let fallback = search_legal_database_via_cse(
        http,
        config,
        citation,
        Some(&config.cse_id_comprehensive),
        Duration::from_secs(10),
    )
    .await;
    if fallback.success && (fallback.url.contains(".gov.au") || fallback.url.contains("austlii.edu.au")) {
        return fallback.url;
    }

    construct_austlii_url(citation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_document_strips_copyright_footer() {
        let dirty = "The judgment text.\nCopyright 2024 AustLII\n";
        let cleaned = clean_document(dirty);
        assert!(!cleaned.to_lowercase().contains("copyright"));
        assert!(cleaned.contains("The judgment text."));
    }

    #[test]
    fn validates_legislation_name_ignoring_jurisdiction_suffix() {
        let content = "Freedom of Information Act 1982\n\nAn Act about access to information.";
        assert!(validate_citation_match(
            content,
            "Freedom of Information Act 1982 (Cth)"
        ));
    }

    #[test]
    fn rejects_unrelated_content() {
        let content = "Some unrelated judgment about contract law.";
        assert!(!validate_citation_match(content, "[2020] HCA 45"));
    }
}
