//! Feature-hashing embedder (no model, deterministic, platform independent).

use super::EmbeddingProvider;
use crate::text::{content_tokens, normalize};
use crate::types::ScriptureResult;

/// Tokens at least this long also contribute a prefix feature, which lets
/// inflected forms ("outcome", "outcomes") land close together.
const PREFIX_LEN: usize = 5;

/// Weight of the prefix feature relative to the full token.
const PREFIX_WEIGHT: f32 = 0.5;

/// Hashes content tokens into a signed bucket vector and L2-normalizes it.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Create an embedder producing vectors of `dimension` (at least 1).
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn add_feature(&self, vec: &mut [f32], feature: &str, weight: f32) {
        let hash = blake3::hash(feature.as_bytes());
        let bytes = hash.as_bytes();
        let mut word = [0u8; 8];
        word.copy_from_slice(&bytes[..8]);
        let bucket = (u64::from_le_bytes(word) % self.dimension as u64) as usize;
        let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
        vec[bucket] += sign * weight;
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(crate::types::DEFAULT_DIMENSION)
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn embed(&self, text: &str) -> ScriptureResult<Vec<f32>> {
        let mut embedding = vec![0.0f32; self.dimension];
        let tokens = normalize(text);

        for token in content_tokens(&tokens, "en") {
            self.add_feature(&mut embedding, token, 1.0);
            let chars: Vec<char> = token.chars().collect();
            if chars.len() > PREFIX_LEN {
                let prefix: String = chars[..PREFIX_LEN].iter().collect();
                self.add_feature(&mut embedding, &format!("{prefix}~"), PREFIX_WEIGHT);
            }
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut embedding {
                *x /= norm;
            }
        }
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "hashing"
    }
}
