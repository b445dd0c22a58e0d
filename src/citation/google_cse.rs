//! Google Custom Search Engine citation verification.
//!
//! Port of `original_source/litassist/citation/google_cse.py`.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::config::Config;

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})").unwrap());
static VOLUME: Lazy<Regex> = Lazy::new(|| Regex::new(r"\)\s*(\d+)\s+([A-Z]+)\s+(\d+)").unwrap());

#[derive(Debug, Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Debug, Deserialize)]
struct CseItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    link: String,
}

#[derive(Debug, Clone)]
pub struct CseResult {
    pub success: bool,
    pub url: String,
}

fn strip_brackets(citation: &str) -> String {
    citation
        .replace(['(', ')', '[', ']'], "")
}

fn citation_variations(citation: &str) -> Vec<String> {
    let base = strip_brackets(citation);
    vec![
        citation.to_lowercase(),
        base.to_lowercase(),
        citation.replace('[', "(").replace(']', ")").to_lowercase(),
        citation.replace('(', "[").replace(')', "]").to_lowercase(),
    ]
}

/// Searches a legal-database Custom Search Engine for `citation`. Returns
/// `(success, url)`; `success=false` on any network/parse error (the
/// original swallows all exceptions here and falls through to the next
/// verification source).
pub async fn search_legal_database_via_cse(
    http: &reqwest::Client,
    config: &Config,
    citation: &str,
    cse_id: Option<&str>,
    timeout: Duration,
) -> CseResult {
    let cse_id = cse_id.unwrap_or(&config.cse_id);
    let search_query = strip_brackets(citation);

    let request = http
        .get("https://www.googleapis.com/customsearch/v1")
        .query(&[
            ("q", search_query.as_str()),
            ("cx", cse_id),
            ("key", config.g_key.as_str()),
            ("num", "10"),
        ])
        .timeout(timeout)
        .send()
        .await;

    let Ok(response) = request else {
        return CseResult {
            success: false,
            url: String::new(),
        };
    };
    let Ok(parsed) = response.json::<CseResponse>().await else {
        return CseResult {
            success: false,
            url: String::new(),
        };
    };

    if parsed.items.is_empty() {
        return CseResult {
            success: false,
            url: String::new(),
        };
    }

    let variations = citation_variations(citation);
    let year_match = YEAR.captures(citation).map(|c| c[1].to_string());
    let volume_match = VOLUME.captures(citation).map(|c| {
        (
            c[1].to_string(),
            c[2].to_lowercase(),
            c[3].to_string(),
        )
    });

    for item in &parsed.items {
        let combined = format!(
            "{} {} {}",
            item.title.to_lowercase(),
            item.snippet.to_lowercase(),
            item.link.to_lowercase()
        );

        if variations.iter().any(|v| combined.contains(v.as_str())) {
            return CseResult {
                success: true,
                url: item.link.clone(),
            };
        }

        if let (Some(year), Some((_vol, series, page))) = (&year_match, &volume_match) {
            if combined.contains(year.as_str())
                && combined.contains(series.as_str())
                && combined.contains(page.as_str())
            {
                return CseResult {
                    success: true,
                    url: item.link.clone(),
                };
            }
        }
    }

    CseResult {
        success: false,
        url: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn citation_variations_cover_bracket_swaps() {
        let vars = citation_variations("[2020] HCA 45");
        assert!(vars.contains(&"[2020] hca 45".to_string()));
        assert!(vars.contains(&"2020 hca 45".to_string()));
        assert!(vars.contains(&"(2020) hca 45".to_string()));
    }
}
