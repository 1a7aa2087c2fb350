//! scripture-check: scripture retrieval and claim-classification engine.
//!
//! Turns a free-text claim about a religious text into explicit references,
//! a claim-type classification, a ranked set of candidate passages and a
//! verdict with a confidence score, citations and a traceable rationale.

pub mod cli;
pub mod config;
pub mod corpus;
pub mod embed;
pub mod engine;
pub mod history;
pub mod index;
pub mod text;
pub mod types;

// Re-export commonly used types at the crate root
pub use config::EngineConfig;
pub use corpus::{Corpus, CorpusLoader, LoadReport};
pub use embed::{BoundedEmbedder, EmbeddingProvider, HashingEmbedder, UnavailableEmbedder};
pub use engine::{
    Analysis, ClaimClassifier, ClassificationResult, FactChecker, IndexHandle, MatchKind,
    RetrievalHit, RetrievalResult, RuleId, ScriptureIndex, Stance, VerdictEngine,
};
pub use history::JsonlHistory;
pub use index::{cosine_similarity, KeywordIndex, KeywordMatcher, VectorIndex};
pub use text::{normalize, AliasTable, ReferenceExtractor, ScriptureReference};
pub use types::{
    Citation, Claim, ClaimType, FactCheckResult, Passage, PassageBuilder, RetrievalMode,
    ScriptureError, ScriptureResult, Verdict, VerdictLabel, DEFAULT_CITATION_LIMIT,
    DEFAULT_DIMENSION, MAX_PASSAGE_SIZE,
};
