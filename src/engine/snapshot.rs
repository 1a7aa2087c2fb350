//! Index snapshots and the build-then-swap handle readers share.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};

use crate::corpus::Corpus;
use crate::embed::EmbeddingProvider;
use crate::index::{KeywordIndex, VectorIndex};
use crate::types::{now_utc, Passage, ScriptureError, ScriptureResult};

/// An immutable, fully built view of the corpus and its indexes.
///
/// Built once, never mutated. Readers hold it through an `Arc`.
#[derive(Debug)]
pub struct ScriptureIndex {
    corpus: Corpus,
    /// `None` when embeddings could not be computed.
    vectors: Option<VectorIndex>,
    keywords: KeywordIndex,
    provider: String,
    built_at: DateTime<Utc>,
}

impl ScriptureIndex {
    /// Build a snapshot: assign IDs, embed every passage in one batch, and
    /// build both indexes. If embedding fails the snapshot is keyword-only.
    pub fn build(passages: Vec<Passage>, provider: &dyn EmbeddingProvider) -> Self {
        let mut corpus = Corpus::from_passages(passages);
        let keywords = KeywordIndex::build(corpus.passages());

        let vectors = match embed_corpus(&corpus, provider) {
            Ok(embeddings) => {
                corpus.set_embeddings(embeddings);
                let rows = corpus
                    .passages()
                    .iter()
                    .map(|p| (p.id, p.embedding.as_slice()));
                match VectorIndex::build(provider.dimension(), rows) {
                    Ok(index) => Some(index),
                    Err(e) => {
                        log::warn!("vector index not built, snapshot is keyword-only: {e}");
                        corpus.set_embeddings(vec![Vec::new(); corpus.len()]);
                        None
                    }
                }
            }
            Err(e) => {
                log::warn!("passage embeddings unavailable, snapshot is keyword-only: {e}");
                None
            }
        };

        log::info!(
            "index snapshot built: {} passages, {} works, dimension {}",
            corpus.len(),
            corpus.works().len(),
            vectors
                .as_ref()
                .map_or_else(|| "none".to_string(), |v| v.dimension().to_string())
        );

        Self {
            corpus,
            vectors,
            keywords,
            provider: provider.name().to_string(),
            built_at: now_utc(),
        }
    }

    /// A snapshot without vectors.
    pub fn keyword_only(passages: Vec<Passage>) -> Self {
        let corpus = Corpus::from_passages(passages);
        let keywords = KeywordIndex::build(corpus.passages());
        Self {
            corpus,
            vectors: None,
            keywords,
            provider: "none".to_string(),
            built_at: now_utc(),
        }
    }

    /// The passages.
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// The vector index, if embeddings were available at build time.
    pub fn vectors(&self) -> Option<&VectorIndex> {
        self.vectors.as_ref()
    }

    /// The keyword index.
    pub fn keywords(&self) -> &KeywordIndex {
        &self.keywords
    }

    /// Name of the provider that embedded the passages.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// When this snapshot was built.
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}

fn embed_corpus(
    corpus: &Corpus,
    provider: &dyn EmbeddingProvider,
) -> ScriptureResult<Vec<Vec<f32>>> {
    let texts: Vec<&str> = corpus.passages().iter().map(|p| p.text.as_str()).collect();
    let embeddings = provider.embed_batch(&texts)?;
    if embeddings.len() != texts.len() {
        return Err(ScriptureError::ProviderUnavailable {
            provider: provider.name().to_string(),
            reason: format!(
                "returned {} embeddings for {} passages",
                embeddings.len(),
                texts.len()
            ),
        });
    }
    Ok(embeddings)
}

/// Shared slot holding the current snapshot.
///
/// Readers take a cheap `Arc` clone and keep using it for the whole
/// request. Rebuilding happens off to the side; only the final swap takes
/// the write lock, so no reader ever sees a partially built index.
#[derive(Debug, Default)]
pub struct IndexHandle {
    current: RwLock<Option<Arc<ScriptureIndex>>>,
}

impl IndexHandle {
    /// A handle with no snapshot yet. Queries fail with `IndexNotBuilt`.
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle already holding `index`.
    pub fn with_index(index: ScriptureIndex) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(index))),
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> ScriptureResult<Arc<ScriptureIndex>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ScriptureError::IndexNotBuilt)
    }

    /// Whether a snapshot has been published.
    pub fn is_built(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Swap in a fully built snapshot. Returns the previous one.
    pub fn publish(&self, index: ScriptureIndex) -> Option<Arc<ScriptureIndex>> {
        let next = Arc::new(index);
        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        slot.replace(next)
    }

    /// Build a new snapshot without holding the lock, then publish it.
    pub fn rebuild(
        &self,
        passages: Vec<Passage>,
        provider: &dyn EmbeddingProvider,
    ) -> Arc<ScriptureIndex> {
        let index = Arc::new(ScriptureIndex::build(passages, provider));
        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Arc::clone(&index));
        index
    }
}
