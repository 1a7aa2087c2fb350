//! High-level operations: classification, retrieval, verdicts and the
//! request path that ties them together.

pub mod checker;
pub mod classify;
pub mod retrieve;
pub mod snapshot;
pub mod verdict;

pub use checker::{Analysis, FactChecker};
pub use classify::{ClaimClassifier, ClaimSignals, ClassificationResult, RuleId};
pub use retrieve::{MatchKind, RetrievalHit, RetrievalQuery, RetrievalResult, Retriever};
pub use snapshot::{IndexHandle, ScriptureIndex};
pub use verdict::{next_steps, PassageAssessment, Stance, VerdictEngine};
