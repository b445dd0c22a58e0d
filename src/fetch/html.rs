//! HTML-to-text extraction for fetched legal documents.
//!
//! Grounded in the broader example pack's `scraper` usage (no HTML-specific
//! extraction exists in `original_source/`; reconstructed from SPEC_FULL.md
//! §4.3's "strip script/style/meta/link, collapse whitespace" rule).

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

static SCRIPT_OR_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</\1>").unwrap());

/// Strips `<script>`/`<style>` blocks (and, implicitly, `<meta>`/`<link>`,
/// which are void elements with no text content) and returns the remaining
/// visible text with whitespace collapsed to single spaces.
pub fn extract_text(html: &str) -> String {
    let without_scripts = SCRIPT_OR_STYLE.replace_all(html, "");
    let document = Html::parse_document(&without_scripts);
    let text = document.root_element().text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&text)
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_and_style_content() {
        let html = "<html><head><style>body{color:red}</style></head><body><script>alert(1)</script><p>Hello   world</p></body></html>";
        let text = extract_text(html);
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn collapses_internal_whitespace() {
        assert_eq!(collapse_whitespace("a   b\n\nc"), "a b c");
    }
}
