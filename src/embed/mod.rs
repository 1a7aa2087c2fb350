//! Embedding providers.
//!
//! The engine only needs text → fixed-length vector. Real models live behind
//! [`EmbeddingProvider`]; this module ships a deterministic local provider for
//! offline use, an always-unavailable provider, and a timeout wrapper.

pub mod bounded;
pub mod hashing;

pub use bounded::{BoundedEmbedder, MAX_STALLED_WORKERS};
pub use hashing::HashingEmbedder;

use crate::types::{ScriptureError, ScriptureResult};

/// Converts text into a fixed-length embedding vector.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text span.
    fn embed(&self, text: &str) -> ScriptureResult<Vec<f32>>;

    /// Embed several spans. The default calls [`embed`](EmbeddingProvider::embed)
    /// sequentially and fails on the first error.
    fn embed_batch(&self, texts: &[&str]) -> ScriptureResult<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Length of every vector this provider returns.
    fn dimension(&self) -> usize;

    /// Provider name, used in logs and errors.
    fn name(&self) -> &str;
}

/// Provider that is never available. Forces keyword-only retrieval.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableEmbedder;

impl EmbeddingProvider for UnavailableEmbedder {
    fn embed(&self, _text: &str) -> ScriptureResult<Vec<f32>> {
        Err(ScriptureError::ProviderUnavailable {
            provider: self.name().to_string(),
            reason: "no embedding provider configured".to_string(),
        })
    }

    fn dimension(&self) -> usize {
        0
    }

    fn name(&self) -> &str {
        "none"
    }
}
