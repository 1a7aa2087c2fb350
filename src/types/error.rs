//! Error types for the scripture-check library.

use thiserror::Error;

/// All errors that can occur in the scripture-check library.
#[derive(Error, Debug)]
pub enum ScriptureError {
    /// The embedding provider failed or did not answer in time.
    #[error("Embedding provider '{provider}' unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    /// A corpus record is missing a required field or is otherwise unusable.
    #[error("Malformed corpus record {index} in {source_name}: {reason}")]
    MalformedCorpusRecord {
        source_name: String,
        index: usize,
        reason: String,
    },

    /// The claim text is blank.
    #[error("Claim is empty")]
    EmptyClaim,

    /// A query ran before the first index snapshot was published.
    #[error("Scripture index has not been built yet")]
    IndexNotBuilt,

    /// Vector dimension mismatch.
    #[error("Vector dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML error (either direction).
    #[error("TOML error: {0}")]
    Toml(String),
}

/// Convenience result type for scripture-check operations.
pub type ScriptureResult<T> = Result<T, ScriptureError>;
