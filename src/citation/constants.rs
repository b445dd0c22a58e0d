//! Static lookup tables: Australian court abbreviation → AustLII path,
//! foreign court abbreviation → human name, and hardcoded FOIA file paths.
//!
//! Verbatim port of `original_source/litassist/citation/constants.py`.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Court abbreviation -> "jurisdiction/COURT" path segment used in AustLII
/// direct-URL construction.
pub static COURT_MAPPINGS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("HCA", "cth/HCA"),
        ("FCA", "cth/FCA"),
        ("FCAFC", "cth/FCAFC"),
        ("FCFCOA", "cth/FCFCOA"),
        ("FedCFamC1A", "cth/FedCFamC1A"),
        ("FedCFamC2A", "cth/FedCFamC2A"),
        ("FamCA", "cth/FamCA"),
        ("FamCAFC", "cth/FamCAFC"),
        ("NSWSC", "nsw/NSWSC"),
        ("NSWCA", "nsw/NSWCA"),
        ("NSWCCA", "nsw/NSWCCA"),
        ("NSWDC", "nsw/NSWDC"),
        ("NSWLC", "nsw/NSWLC"),
        ("VSC", "vic/VSC"),
        ("VSCA", "vic/VSCA"),
        ("VCC", "vic/VCC"),
        ("VCAT", "vic/VCAT"),
        ("QSC", "qld/QSC"),
        ("QCA", "qld/QCA"),
        ("QDC", "qld/QDC"),
        ("QCAT", "qld/QCAT"),
        ("SASC", "sa/SASC"),
        ("SASCFC", "sa/SASCFC"),
        ("SADC", "sa/SADC"),
        ("SACAT", "sa/SACAT"),
        ("WASC", "wa/WASC"),
        ("WASCA", "wa/WASCA"),
        ("WADC", "wa/WADC"),
        ("WASAT", "wa/WASAT"),
        ("TASSC", "tas/TASSC"),
        ("TASFC", "tas/TASFC"),
        ("ACTSC", "act/ACTSC"),
        ("ACAT", "act/ACAT"),
        ("NTSC", "nt/NTSC"),
        ("NTCA", "nt/NTCA"),
        ("FCWA", "wa/FCWA"),
    ]
    .into_iter()
    .collect()
});

/// Foreign/international court or report-series abbreviation -> human name,
/// used to classify a citation as valid-but-not-Australian.
pub static UK_INTERNATIONAL_COURTS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("AC", "Appeal Cases (House of Lords/Privy Council)"),
        ("PC", "Privy Council"),
        ("Ch", "Chancery Division (England)"),
        ("QB", "Queen's Bench Division (England)"),
        ("KB", "King's Bench Division (England)"),
        ("WLR", "Weekly Law Reports (England)"),
        ("All ER", "All England Law Reports"),
        ("AllER", "All England Law Reports"),
        ("UKHL", "United Kingdom House of Lords"),
        ("UKSC", "United Kingdom Supreme Court"),
        ("EWCA", "England and Wales Court of Appeal"),
        ("EWHC", "England and Wales High Court"),
        ("Fam", "Family Division (England)"),
        ("ER", "English Reports"),
        ("Cr App R", "Criminal Appeal Reports (England)"),
        ("CrAppR", "Criminal Appeal Reports (England)"),
        ("Lloyd's Rep", "Lloyd's Law Reports"),
        ("NZLR", "New Zealand Law Reports"),
        ("NZCA", "New Zealand Court of Appeal"),
        ("NZSC", "New Zealand Supreme Court"),
        ("NZHC", "New Zealand High Court"),
        ("SCR", "Supreme Court Reports (Canada)"),
        ("DLR", "Dominion Law Reports (Canada)"),
        ("OR", "Ontario Reports (Canada)"),
        ("BCR", "British Columbia Reports (Canada)"),
        ("AR", "Alberta Reports (Canada)"),
        ("QR", "Quebec Reports (Canada)"),
        ("SCC", "Supreme Court of Canada"),
        ("ONCA", "Ontario Court of Appeal"),
        ("BCCA", "British Columbia Court of Appeal"),
        ("SLR", "Singapore Law Reports"),
        ("SGCA", "Singapore Court of Appeal"),
        ("SGHC", "Singapore High Court"),
        ("HKLR", "Hong Kong Law Reports"),
        ("HKLRD", "Hong Kong Law Reports & Digest"),
        ("HKCFA", "Hong Kong Court of Final Appeal"),
        ("HKCA", "Hong Kong Court of Appeal"),
        ("HKCFI", "Hong Kong Court of First Instance"),
        ("MLJ", "Malayan Law Journal"),
        ("CLJ", "Current Law Journal (Malaysia)"),
        ("SALR", "South African Law Reports"),
        ("ZASCA", "South African Supreme Court of Appeal"),
        ("ZACC", "South African Constitutional Court"),
        ("ICJ", "International Court of Justice"),
        ("ECHR", "European Court of Human Rights"),
        ("ECJ", "European Court of Justice"),
        ("ICC", "International Criminal Court"),
        ("ITLOS", "International Tribunal for the Law of the Sea"),
        ("US", "United States Reports (Supreme Court)"),
        ("S.Ct", "Supreme Court Reporter (US)"),
        ("SCt", "Supreme Court Reporter (US)"),
        ("F.2d", "Federal Reporter"),
        ("F.3d", "Federal Reporter"),
        ("F2d", "Federal Reporter"),
        ("F3d", "Federal Reporter"),
        ("ICLQ", "International and Comparative Law Quarterly"),
        ("LQR", "Law Quarterly Review"),
        ("MLR", "Modern Law Review"),
        ("OJLS", "Oxford Journal of Legal Studies"),
        ("AILR", "Australian Indigenous Law Review"),
        ("IPR", "Intellectual Property Reports"),
        ("IPLR", "Intellectual Property Law Review"),
    ]
    .into_iter()
    .collect()
});

/// Hardcoded FOIA-name variants -> local path, short-circuiting
/// verification for a frequently-cited Act whose government-PDF URL CSE
/// search often misses.
pub static HARDCODED_FOIA_FILES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        (
            "Freedom of Information Act 1982",
            "docs/legislation/FOIA.md",
        ),
        (
            "Freedom of Information Act 1982 (Cth)",
            "docs/legislation/FOIA.md",
        ),
        (
            "Freedom of Information Act 1982 (Commonwealth)",
            "docs/legislation/FOIA.md",
        ),
        ("FOI Act 1982", "docs/legislation/FOIA.md"),
        ("FOI Act 1982 (Cth)", "docs/legislation/FOIA.md"),
    ]
    .into_iter()
    .collect()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn court_mappings_has_expected_count() {
        assert_eq!(COURT_MAPPINGS.len(), 35);
        assert_eq!(COURT_MAPPINGS.get("ACTSC"), Some(&"act/ACTSC"));
    }

    #[test]
    fn uk_international_courts_resolves_ac() {
        assert_eq!(
            UK_INTERNATIONAL_COURTS.get("AC"),
            Some(&"Appeal Cases (House of Lords/Privy Council)")
        );
    }

    #[test]
    fn foia_variants_all_map_to_same_file() {
        let target = "docs/legislation/FOIA.md";
        for key in [
            "Freedom of Information Act 1982",
            "Freedom of Information Act 1982 (Cth)",
            "FOI Act 1982",
        ] {
            assert_eq!(HARDCODED_FOIA_FILES.get(key), Some(&target));
        }
    }
}
