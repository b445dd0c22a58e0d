//! Thread-safe citation verification cache.
//!
//! Process-wide, guarded by a single `parking_lot::Mutex` (the only mutable
//! shared state in the core per SPEC_FULL.md §5). Entries are immutable
//! after insertion.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub exists: bool,
    pub url: String,
    pub reason: String,
}

static CITATION_CACHE: Lazy<Mutex<HashMap<String, CacheEntry>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

pub fn get_from_cache(citation: &str) -> Option<CacheEntry> {
    CITATION_CACHE.lock().get(citation).cloned()
}

pub fn add_to_cache(citation: &str, exists: bool, url: &str, reason: &str) {
    CITATION_CACHE.lock().insert(
        citation.to_string(),
        CacheEntry {
            exists,
            url: url.to_string(),
            reason: reason.to_string(),
        },
    );
}

#[derive(Debug, Clone, Copy)]
pub struct VerificationStats {
    pub total_checked: usize,
    pub verified: usize,
    pub unverified: usize,
}

impl VerificationStats {
    pub fn cache_hit_rate(&self) -> String {
        if self.total_checked == 0 {
            "0%".to_string()
        } else {
            format!(
                "{:.1}%",
                (self.verified as f64 / self.total_checked as f64) * 100.0
            )
        }
    }
}

pub fn get_verification_stats() -> VerificationStats {
    let cache = CITATION_CACHE.lock();
    let total = cache.len();
    let verified = cache.values().filter(|e| e.exists).count();
    VerificationStats {
        total_checked: total,
        verified,
        unverified: total - verified,
    }
}

/// Clears the cache. Exposed for tests; production callers should not need
/// it within a single command invocation.
pub fn clear_verification_cache() {
    CITATION_CACHE.lock().clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    // The cache is process-wide, so these tests share state; each clears
    // before asserting rather than relying on `cargo test`'s default
    // same-process, multi-threaded execution order.

    #[test]
    fn round_trips_entry() {
        clear_verification_cache();
        add_to_cache("[2020] HCA 45", true, "https://example", "Verified via test");
        let entry = get_from_cache("[2020] HCA 45").unwrap();
        assert!(entry.exists);
        assert_eq!(entry.url, "https://example");
    }

    #[test]
    fn stats_compute_hit_rate() {
        clear_verification_cache();
        add_to_cache("a", true, "", "x");
        add_to_cache("b", false, "", "y");
        let stats = get_verification_stats();
        assert_eq!(stats.total_checked, 2);
        assert_eq!(stats.cache_hit_rate(), "50.0%");
    }
}
