//! Vector index: exact cosine nearest-neighbour search over passage embeddings.

use std::cmp::Ordering;

use crate::types::{ScriptureError, ScriptureResult};

/// Flat, build-once vector index.
///
/// Rows are L2-normalized at build time and stored contiguously, so a query is
/// one normalization plus a dot product per row. There is no incremental
/// insert: rebuilding is the only way to change the contents.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    /// Passage IDs, parallel to the rows of `vectors`.
    ids: Vec<u64>,
    /// Row-major, L2-normalized.
    vectors: Vec<f32>,
}

impl VectorIndex {
    /// An index with no rows.
    pub fn empty(dimension: usize) -> Self {
        Self {
            dimension,
            ids: Vec::new(),
            vectors: Vec::new(),
        }
    }

    /// Build the index from `(passage_id, embedding)` pairs.
    ///
    /// Every embedding must have exactly `dimension` elements.
    pub fn build<'a>(
        dimension: usize,
        entries: impl IntoIterator<Item = (u64, &'a [f32])>,
    ) -> ScriptureResult<Self> {
        let mut index = Self::empty(dimension);
        for (id, vec) in entries {
            if vec.len() != dimension {
                return Err(ScriptureError::DimensionMismatch {
                    expected: dimension,
                    got: vec.len(),
                });
            }
            let norm = l2_norm(vec);
            index.ids.push(id);
            if norm > 0.0 {
                index.vectors.extend(vec.iter().map(|x| x / norm));
            } else {
                index.vectors.extend(std::iter::repeat(0.0).take(dimension));
            }
        }
        log::debug!(
            "vector index built: {} rows, dimension {}",
            index.ids.len(),
            dimension
        );
        Ok(index)
    }

    /// Return the `min(k, len)` most similar passages, sorted by similarity
    /// descending, ties broken by passage ID ascending.
    pub fn query(&self, embedding: &[f32], k: usize) -> ScriptureResult<Vec<(u64, f32)>> {
        if self.ids.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if embedding.len() != self.dimension {
            return Err(ScriptureError::DimensionMismatch {
                expected: self.dimension,
                got: embedding.len(),
            });
        }

        let norm = l2_norm(embedding);
        let mut scored: Vec<(u64, f32)> = self
            .ids
            .iter()
            .zip(self.vectors.chunks_exact(self.dimension.max(1)))
            .map(|(&id, row)| {
                let sim = if norm > 0.0 {
                    let mut dot = 0.0f32;
                    for (a, b) in row.iter().zip(embedding) {
                        dot += a * b;
                    }
                    dot / norm
                } else {
                    0.0
                };
                let sim = if sim.is_finite() {
                    sim.clamp(-1.0, 1.0)
                } else {
                    0.0
                };
                (id, sim)
            })
            .collect();

        let k = k.min(scored.len());
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_similarity_then_id);
            scored.truncate(k);
        }
        scored.sort_by(by_similarity_then_id);
        Ok(scored)
    }

    /// Number of indexed passages.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the index holds no passages.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Vector dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

fn by_similarity_then_id(a: &(u64, f32), b: &(u64, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}

fn l2_norm(vec: &[f32]) -> f32 {
    vec.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for i in 0..a.len().min(b.len()) {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        (dot / denom).clamp(-1.0, 1.0)
    }
}
