//! Keyword matcher: lexical overlap scoring independent of embeddings.

use std::collections::HashSet;

use crate::text::{is_negation, is_stopword};
use crate::types::Passage;

/// Scores claim tokens against passage tokens by claim-term coverage:
/// `|claim ∩ passage| / |claim|` over content terms.
///
/// Both sides are treated as sets, so token order never matters, and the
/// passage's size only enters through the overlap itself.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    language: String,
}

impl KeywordMatcher {
    /// Matcher using the stop words of `language`.
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    /// The set of scoring terms for a token sequence.
    pub fn terms<'a>(&self, tokens: &'a [String]) -> HashSet<&'a str> {
        term_set(tokens, &self.language)
    }

    /// Overlap score in [0, 1]. Zero when the claim has no content terms.
    pub fn score(&self, claim_tokens: &[String], passage_tokens: &[String]) -> f32 {
        let claim = self.terms(claim_tokens);
        let passage = self.terms(passage_tokens);
        coverage(&claim, |t| passage.contains(t))
    }
}

impl Default for KeywordMatcher {
    fn default() -> Self {
        Self::new("en")
    }
}

fn term_set<'a>(tokens: &'a [String], language: &str) -> HashSet<&'a str> {
    tokens
        .iter()
        .map(String::as_str)
        .filter(|t| !is_stopword(t, language) && !is_negation(t))
        .collect()
}

fn coverage<'a>(claim: &HashSet<&'a str>, contains: impl Fn(&str) -> bool) -> f32 {
    if claim.is_empty() {
        return 0.0;
    }
    let hits = claim.iter().filter(|t| contains(t)).count();
    hits as f32 / claim.len() as f32
}

/// Pre-tokenized passage term sets for ranking a whole corpus.
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    /// Sorted by passage ID.
    entries: Vec<(u64, HashSet<String>)>,
}

impl KeywordIndex {
    /// Tokenize every passage once, with its own language's stop words.
    pub fn build<'a>(passages: impl IntoIterator<Item = &'a Passage>) -> Self {
        let mut entries: Vec<(u64, HashSet<String>)> = passages
            .into_iter()
            .map(|p| {
                let tokens = crate::text::normalize(&p.text);
                let terms = term_set(&tokens, &p.language)
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                (p.id, terms)
            })
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        Self { entries }
    }

    /// Score of one passage against a claim term set.
    pub fn score(&self, passage_id: u64, claim_terms: &HashSet<&str>) -> f32 {
        match self.terms(passage_id) {
            Some(terms) => coverage(claim_terms, |t| terms.contains(t)),
            None => 0.0,
        }
    }

    /// Term set of a passage.
    pub fn terms(&self, passage_id: u64) -> Option<&HashSet<String>> {
        self.entries
            .binary_search_by_key(&passage_id, |(id, _)| *id)
            .ok()
            .map(|pos| &self.entries[pos].1)
    }

    /// Top `k` passages with a non-zero score, sorted by score descending,
    /// ties broken by passage ID ascending.
    pub fn rank(&self, claim_terms: &HashSet<&str>, k: usize) -> Vec<(u64, f32)> {
        if claim_terms.is_empty() || k == 0 {
            return Vec::new();
        }
        let mut scored: Vec<(u64, f32)> = self
            .entries
            .iter()
            .map(|(id, terms)| (*id, coverage(claim_terms, |t| terms.contains(t))))
            .filter(|(_, score)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        scored
    }

    /// Number of indexed passages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
