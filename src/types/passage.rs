//! Passage: the citable unit of scripture text.

use serde::Serialize;

/// A single citable unit of scripture text.
///
/// Passages are created by the corpus loader and never mutated afterwards;
/// the `id` is the insertion position in the corpus and doubles as the
/// deterministic tie-breaker for every ranking in the engine.
#[derive(Debug, Clone, Serialize)]
pub struct Passage {
    /// Stable identifier (insertion order within the corpus).
    pub id: u64,
    /// Canonical work name, e.g. "Bhagavad Gita".
    pub work: String,
    /// Reference within the work, e.g. "2:47".
    pub reference: String,
    /// Passage text.
    pub text: String,
    /// Language tag of `text`.
    pub language: String,
    /// Translation or edition the text comes from, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    /// Embedding computed once when the index snapshot is built.
    #[serde(skip_serializing)]
    pub embedding: Vec<f32>,
}

impl Passage {
    /// "Work reference", e.g. "Bhagavad Gita 2:47".
    pub fn label(&self) -> String {
        format!("{} {}", self.work, self.reference)
    }

    /// Parse the reference as `chapter:verse`, `chapter.verse` or
    /// `chapter:start-end`. Returns `(chapter, first_verse, last_verse)`.
    pub fn verse_span(&self) -> Option<(u32, u32, u32)> {
        parse_verse_span(&self.reference)
    }

    /// Whether this passage covers `chapter:verse`.
    pub fn covers(&self, chapter: u32, verse: u32) -> bool {
        match self.verse_span() {
            Some((c, start, end)) => c == chapter && (start..=end).contains(&verse),
            None => false,
        }
    }
}

/// Parse `"2:47"`, `"2.47"` or `"2:47-48"` into `(chapter, start, end)`.
pub fn parse_verse_span(reference: &str) -> Option<(u32, u32, u32)> {
    let reference = reference.trim();
    let (chapter, verses) = reference
        .split_once(':')
        .or_else(|| reference.split_once('.'))?;
    let chapter: u32 = chapter.trim().parse().ok()?;
    let (start, end) = match verses.split_once(['-', '–']) {
        Some((s, e)) => (s.trim().parse().ok()?, e.trim().parse().ok()?),
        None => {
            let v: u32 = verses.trim().parse().ok()?;
            (v, v)
        }
    };
    if end < start {
        return Some((chapter, start, start));
    }
    Some((chapter, start, end))
}

/// Builder for constructing Passage instances.
pub struct PassageBuilder {
    work: String,
    reference: String,
    text: String,
    language: String,
    translation: Option<String>,
    embedding: Vec<f32>,
}

impl PassageBuilder {
    /// Create a new builder with the required fields.
    pub fn new(
        work: impl Into<String>,
        reference: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            work: work.into(),
            reference: reference.into(),
            text: text.into(),
            language: "en".to_string(),
            translation: None,
            embedding: Vec::new(),
        }
    }

    /// Set the language tag.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the translation name.
    pub fn translation(mut self, translation: impl Into<String>) -> Self {
        self.translation = Some(translation.into());
        self
    }

    /// Set a precomputed embedding.
    pub fn embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }

    /// Build the Passage. The id will be 0 (assigned by the corpus on insertion).
    pub fn build(self) -> Passage {
        Passage {
            id: 0,
            work: self.work,
            reference: self.reference,
            text: self.text,
            language: self.language,
            translation: self.translation,
            embedding: self.embedding,
        }
    }
}
