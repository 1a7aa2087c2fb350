//! All data types for the scripture-check library.

pub mod claim;
pub mod error;
pub mod passage;
pub mod verdict;

pub use claim::{Claim, ClaimType};
pub use error::{ScriptureError, ScriptureResult};
pub use passage::{parse_verse_span, Passage, PassageBuilder};
pub use verdict::{Citation, FactCheckResult, RetrievalMode, Verdict, VerdictLabel};

/// Default dimensionality of the local hashing embedder.
pub const DEFAULT_DIMENSION: usize = 512;

/// Default number of citations returned with a verdict.
pub const DEFAULT_CITATION_LIMIT: usize = 3;

/// Maximum accepted passage text size in bytes.
pub const MAX_PASSAGE_SIZE: usize = 65_536;

/// Returns the current UTC time.
pub fn now_utc() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
}
