//! Domain-aware web fetcher routing by URL, per SPEC_FULL.md §4.3.
//!
//! No fetcher survives in the retrieved `original_source/` slice (only its
//! callers, in `citation_context.py`/`citation/verify.py`, do) — this module
//! is built directly from SPEC_FULL.md's routing table, reusing the
//! teacher's `reqwest` client-construction idiom and the shared AustLII
//! rate limiter already defined in `citation::context`.

pub mod html;
pub mod pdf;

use std::path::Path;
use std::time::Duration;

use serde_json::json;
use url::Url;

use crate::config::Config;
use crate::error::FetchError;

const AUSTLII_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const JINA_READER_BASE: &str = "https://r.jina.ai/";
const GIBBERISH_MIN_CHARS: usize = 100;
const GIBBERISH_MIN_NEWLINES: usize = 5;

/// Fetches `url` (or reads it as a local file path if it isn't http(s)/ftp),
/// routing by domain per SPEC_FULL.md §4.3, and returns extracted text.
/// Emits one `fetch_attempt` audit record per call (method used, outcome,
/// content size, and the full extracted content on success) per SPEC_FULL.md
/// §4.3's Observability note.
pub async fn fetch_url(
    http: &reqwest::Client,
    config: &Config,
    url: &str,
    timeout: Duration,
) -> Result<String, FetchError> {
    let (method, result) = dispatch(http, config, url, timeout).await;

    let payload = match &result {
        Ok(content) => json!({
            "url": url,
            "method": method,
            "status": "ok",
            "final_size": content.chars().count(),
            "content": content,
        }),
        Err(error) => json!({
            "url": url,
            "method": method,
            "status": "failed",
            "error": error.to_string(),
        }),
    };
    if let Err(e) = crate::audit::save_log(config, "fetch_attempt", payload) {
        tracing::warn!(url, error = %e, "failed to save fetch_attempt audit log");
    }

    result
}

async fn dispatch(
    http: &reqwest::Client,
    config: &Config,
    url: &str,
    timeout: Duration,
) -> (&'static str, Result<String, FetchError>) {
    if !url.starts_with("http://") && !url.starts_with("https://") && !url.starts_with("ftp://") {
        return ("local_file", fetch_local_file(url));
    }

    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            return (
                "parse",
                Err(FetchError::Failed { url: url.to_string(), reason: e.to_string() }),
            )
        }
    };
    let host = parsed.host_str().unwrap_or_default().to_lowercase();

    if host.ends_with("jade.io") {
        return ("jade", fetch_jade(http, config, url, &host, timeout).await);
    }
    if host.ends_with("austlii.edu.au") {
        return ("austlii", fetch_austlii(http, config, url, timeout).await);
    }
    if host.ends_with("gov.au") || host.contains("legislation.") {
        return ("gov", fetch_gov(http, config, url, timeout).await);
    }
    ("other", fetch_other(http, config, url, timeout).await)
}

fn fetch_local_file(path_str: &str) -> Result<String, FetchError> {
    let path = Path::new(path_str);
    if !path.exists() {
        return Err(FetchError::LocalFileNotFound(path_str.to_string()));
    }

    let bytes = std::fs::read(path).map_err(|e| FetchError::Failed {
        url: path_str.to_string(),
        reason: e.to_string(),
    })?;

    let content = if bytes.starts_with(b"%PDF") {
        pdf::extract_pdf_text(&bytes, path_str)?
    } else {
        String::from_utf8_lossy(&bytes).into_owned()
    };

    Ok(format!("[Local file: {path_str}]\n\n{content}"))
}

/// Jade.io is blocked from direct scraping except `ndfv.jade.io`, for which
/// a `/download` suffix is appended and the Jina Reader path is used.
async fn fetch_jade(
    http: &reqwest::Client,
    config: &Config,
    url: &str,
    host: &str,
    timeout: Duration,
) -> Result<String, FetchError> {
    if host != "ndfv.jade.io" {
        return Err(FetchError::Failed {
            url: url.to_string(),
            reason: "jade.io subdomains are blocked from web scraping".to_string(),
        });
    }
    let download_url = format!("{}/download", url.trim_end_matches('/'));
    fetch_via_jina(http, config, &download_url, timeout).await
}

async fn fetch_austlii(
    http: &reqwest::Client,
    config: &Config,
    url: &str,
    timeout: Duration,
) -> Result<String, FetchError> {
    crate::citation::context::austlii_rate_limit().await;

    let result = http
        .get(url)
        .header("User-Agent", AUSTLII_USER_AGENT)
        .timeout(timeout)
        .send()
        .await
        .and_then(|r| r.error_for_status());

    match result {
        Ok(response) => {
            let bytes = response.bytes().await.map_err(FetchError::Http)?;
            if bytes.starts_with(b"%PDF") {
                pdf::extract_pdf_text(&bytes, url)
            } else {
                let text = String::from_utf8_lossy(&bytes);
                Ok(html::extract_text(&text))
            }
        }
        Err(e) => {
            tracing::warn!(url, error = %e, "AustLII direct fetch failed, falling back to Jina Reader");
            fetch_via_jina(http, config, url, timeout).await
        }
    }
}

async fn fetch_gov(
    http: &reqwest::Client,
    config: &Config,
    url: &str,
    timeout: Duration,
) -> Result<String, FetchError> {
    let fetch_once = |target: String| {
        let http = http.clone();
        async move {
            http.get(&target)
                .timeout(timeout)
                .send()
                .await
                .and_then(|r| r.error_for_status())
        }
    };

    let response = match fetch_once(url.to_string()).await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(url, error = %e, "gov.au fetch failed, falling back to Jina Reader");
            return fetch_via_jina(http, config, url, timeout).await;
        }
    };

    let bytes = response.bytes().await.map_err(FetchError::Http)?;

    if url.contains("legislation.gov.au") && url.contains("/latest/text") {
        let shell = String::from_utf8_lossy(&bytes);
        if let Some(doc_url) = find_document_link(&shell, url) {
            return fetch_gov(http, config, &doc_url, timeout).await;
        }
    }

    if bytes.starts_with(b"%PDF") {
        return pdf::extract_pdf_text(&bytes, url);
    }

    let text = html::extract_text(&String::from_utf8_lossy(&bytes));
    if is_gibberish(&text) {
        tracing::warn!(url, "gov.au content looks like gibberish, falling back to Jina Reader");
        return fetch_via_jina(http, config, url, timeout).await;
    }
    Ok(text)
}

fn find_document_link(shell_html: &str, base_url: &str) -> Option<String> {
    let document = scraper::Html::parse_document(shell_html);
    let selector = scraper::Selector::parse("a[href]").ok()?;
    document.select(&selector).find_map(|el| {
        let href = el.value().attr("href")?;
        if href.contains("document_1.html") {
            Url::parse(base_url).ok()?.join(href).ok().map(|u| u.to_string())
        } else {
            None
        }
    })
}

fn is_gibberish(text: &str) -> bool {
    text.len() < GIBBERISH_MIN_CHARS || text.matches('\n').count() < GIBBERISH_MIN_NEWLINES
}

/// Unrecognised domains: HEAD to detect content type, GET+extract for PDFs,
/// otherwise route through the Jina Reader.
async fn fetch_other(
    http: &reqwest::Client,
    config: &Config,
    url: &str,
    timeout: Duration,
) -> Result<String, FetchError> {
    let head = http.head(url).timeout(timeout).send().await;
    let is_pdf = head
        .as_ref()
        .ok()
        .and_then(|r| r.headers().get(reqwest::header::CONTENT_TYPE))
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("application/pdf"))
        .unwrap_or(false);

    if is_pdf {
        let response = http
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(FetchError::Http)?;
        let bytes = response.bytes().await.map_err(FetchError::Http)?;
        return pdf::extract_pdf_text(&bytes, url);
    }

    fetch_via_jina(http, config, url, timeout).await
}

async fn fetch_via_jina(
    http: &reqwest::Client,
    config: &Config,
    url: &str,
    timeout: Duration,
) -> Result<String, FetchError> {
    let reader_url = format!("{JINA_READER_BASE}{url}");
    let mut request = http
        .get(&reader_url)
        .header("Accept", "text/markdown")
        .timeout(timeout);
    if let Some(key) = &config.jina_api_key {
        request = request.bearer_auth(key);
    }

    let response = request
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(FetchError::Http)?;
    response.text().await.map_err(FetchError::Http)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_file_missing_is_reported() {
        let err = fetch_local_file("/nonexistent/path/to/file.txt").unwrap_err();
        assert!(matches!(err, FetchError::LocalFileNotFound(_)));
    }

    #[test]
    fn gibberish_detection_flags_short_content() {
        assert!(is_gibberish("too short"));
        assert!(!is_gibberish(&"line\n".repeat(10)));
    }

    #[test]
    fn document_link_is_resolved_against_base_url() {
        let html = r#"<html><body><a href="document_1.html">View</a></body></html>"#;
        let resolved = find_document_link(
            html,
            "https://www.legislation.gov.au/C2004A02562/latest/text",
        )
        .unwrap();
        assert!(resolved.ends_with("document_1.html"));
    }
}
