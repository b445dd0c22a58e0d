//! Legislation and foreign-citation identification.
//!
//! Port of `original_source/litassist/citation/legislation.py`.

use once_cell::sync::Lazy;
use regex::Regex;

use super::constants::UK_INTERNATIONAL_COURTS;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static MEDIUM_NEUTRAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[(\d{4})\]\s+([A-Z]+[A-Za-z]*)\s+(\d+)").unwrap());
static ACT_WITH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bAct\s+\d{4}(?:\s+\([A-Za-z]+\))?").unwrap());
static REGULATIONS_WITH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bRegulations?\s+\d{4}(?:\s+\([A-Za-z]+\))?").unwrap());
static EWCA_EWHC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(\d{4})\]\s+(EWCA|EWHC)\s+(?:Civ|Crim|Admin|Fam|QB|Ch|Pat|Comm|TCC)\s+(\d+)")
        .unwrap()
});
static US_REPORTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\s+U\.?S\.?\s+\d+").unwrap());
static FEDERAL_REPORTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\s+F\.?\s*[23]d\s+\d+").unwrap());
static SCOTUS_REPORTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\s+S\.?\s*Ct\.?\s+\d+").unwrap());
static SPECIAL_REPORTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\[(\d{4})\]|\((\d{4})\))\s+\d+\s+(Lloyd's\s*Rep|Cr\s*App\s*R|CrAppR)\s+\d+")
        .unwrap()
});
static VOLUME_BETWEEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[(\d{4})\]\s+\d+\s+([A-Z]+[A-Za-z]*)\s+\d+").unwrap());

/// Collapses whitespace and canonicalises medium-neutral citation spacing.
pub fn normalize_citation(citation: &str) -> String {
    let collapsed = WHITESPACE.replace_all(citation.trim(), " ").to_string();
    if let Some(caps) = MEDIUM_NEUTRAL.captures(&collapsed) {
        format!("[{}] {} {}", &caps[1], &caps[2], &caps[3])
    } else {
        collapsed
    }
}

/// True if `citation` names an Act or Regulations (case law databases don't
/// carry legislation).
pub fn is_legislation_reference(citation: &str) -> bool {
    ACT_WITH_YEAR.is_match(citation) || REGULATIONS_WITH_YEAR.is_match(citation)
}

/// Returns a human-readable reason if `citation` is a recognised
/// UK/International form (valid, but not verifiable against Australian
/// databases); empty string if the citation looks Australian.
pub fn check_international_citation(citation: &str) -> String {
    if let Some(caps) = EWCA_EWHC.captures(citation) {
        let court = &caps[2];
        if let Some(name) = UK_INTERNATIONAL_COURTS.get(court) {
            return format!("UK/International citation ({name}) - not in Australian databases");
        }
    }

    if US_REPORTS.is_match(citation) {
        return "UK/International citation (United States Reports (Supreme Court)) - not in Australian databases".to_string();
    }
    if FEDERAL_REPORTER.is_match(citation) {
        return "UK/International citation (Federal Reporter) - not in Australian databases"
            .to_string();
    }
    if SCOTUS_REPORTER.is_match(citation) {
        return "UK/International citation (Supreme Court Reporter (US)) - not in Australian databases".to_string();
    }

    if let Some(caps) = SPECIAL_REPORTS.captures(citation) {
        let report_type = &caps[3];
        if report_type.contains("Lloyd") {
            return "UK/International citation (Lloyd's Law Reports) - not in Australian databases".to_string();
        } else if report_type.starts_with("Cr") {
            return "UK/International citation (Criminal Appeal Reports) - not in Australian databases".to_string();
        }
    }

    if let Some(caps) = VOLUME_BETWEEN.captures(citation) {
        let series = &caps[2];
        if let Some(name) = UK_INTERNATIONAL_COURTS.get(series) {
            return format!("UK/International citation ({name}) - not in Australian databases");
        }
    }

    if let Some(caps) = MEDIUM_NEUTRAL.captures(citation) {
        let court = &caps[2];
        if let Some(name) = UK_INTERNATIONAL_COURTS.get(court) {
            return format!("UK/International citation ({name}) - not in Australian databases");
        }
    }

    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize_citation("[2022]   ACTSC   272");
        let twice = normalize_citation(&once);
        assert_eq!(once, twice);
        assert_eq!(once, "[2022] ACTSC 272");
    }

    #[test]
    fn detects_act_with_jurisdiction_suffix() {
        assert!(is_legislation_reference("Family Violence Act 2016 (ACT)"));
        assert!(is_legislation_reference("Fair Work Regulations 2009"));
        assert!(!is_legislation_reference("[2020] HCA 45"));
    }

    #[test]
    fn classifies_house_of_lords_citation() {
        let reason = check_international_citation("[1994] 1 AC 324");
        assert_eq!(
            reason,
            "UK/International citation (Appeal Cases (House of Lords/Privy Council)) - not in Australian databases"
        );
    }

    #[test]
    fn australian_citation_is_not_international() {
        assert_eq!(check_international_citation("[2022] ACTSC 272"), "");
    }
}
