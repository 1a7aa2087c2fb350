//! Scripture corpus: the static, ordered collection of passages.

pub mod loader;

pub use loader::{CorpusLoader, LoadReport};

use std::collections::HashMap;

use crate::text::ScriptureReference;
use crate::types::Passage;

/// All passages, in insertion order. Passage IDs equal their position.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    passages: Vec<Passage>,
    /// Lowercased work name -> positions, in insertion order.
    by_work: HashMap<String, Vec<usize>>,
    /// Work names in first-seen order.
    works: Vec<String>,
}

impl Corpus {
    /// Create an empty corpus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `passages`, assigning IDs by position.
    pub fn from_passages(passages: Vec<Passage>) -> Self {
        let mut corpus = Self::new();
        for passage in passages {
            corpus.push(passage);
        }
        corpus
    }

    fn push(&mut self, mut passage: Passage) {
        let position = self.passages.len();
        passage.id = position as u64;
        let key = passage.work.to_lowercase();
        let slots = self.by_work.entry(key).or_default();
        if slots.is_empty() {
            self.works.push(passage.work.clone());
        }
        slots.push(position);
        self.passages.push(passage);
    }

    /// Number of passages.
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    /// Whether the corpus has no passages.
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Get a passage by ID.
    pub fn get(&self, id: u64) -> Option<&Passage> {
        self.passages.get(usize::try_from(id).ok()?)
    }

    /// All passages in insertion order.
    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    /// Work names in first-seen order.
    pub fn works(&self) -> &[String] {
        &self.works
    }

    /// Passages of one work (case-insensitive), in insertion order.
    pub fn passages_of(&self, work: &str) -> Vec<&Passage> {
        self.by_work
            .get(&work.to_lowercase())
            .map(|slots| slots.iter().map(|&i| &self.passages[i]).collect())
            .unwrap_or_default()
    }

    /// Passages covered by an explicit reference, in insertion order.
    pub fn resolve(&self, reference: &ScriptureReference) -> Vec<&Passage> {
        self.passages_of(&reference.work)
            .into_iter()
            .filter(|p| match p.verse_span() {
                Some((chapter, start, end)) => {
                    let ref_end = reference.verse_end.unwrap_or(reference.verse_start);
                    chapter == reference.chapter && start <= ref_end && reference.verse_start <= end
                }
                None => false,
            })
            .collect()
    }

    /// Attach embeddings, one per passage in ID order.
    pub(crate) fn set_embeddings(&mut self, embeddings: Vec<Vec<f32>>) {
        for (passage, embedding) in self.passages.iter_mut().zip(embeddings) {
            passage.embedding = embedding;
        }
    }
}
