//! Legal citation extraction, classification, and verification.

pub mod austlii;
pub mod cache;
pub mod constants;
pub mod context;
pub mod google_cse;
pub mod legislation;
pub mod patterns;
pub mod verify;

pub use cache::{clear_verification_cache, get_verification_stats, VerificationStats};
pub use context::fetch_citation_context;
pub use patterns::extract_citations;
pub use verify::{verify_all_citations, verify_single_citation, Verification};
