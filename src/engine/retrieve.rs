//! Retrieval: fuses explicit references, vector hits and keyword hits.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::config::EngineConfig;
use crate::index::{cosine_similarity, KeywordMatcher};
use crate::text::{AliasTable, ScriptureReference};
use crate::types::RetrievalMode;

use super::classify::QUOTE_VERBS;
use super::snapshot::ScriptureIndex;

/// Which signal produced a hit. The declaration order is the tie-break
/// order between hits of equal score on the same passage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchKind {
    /// The claim names this passage's chapter and verse.
    ExplicitReference,
    /// Vector similarity.
    Embedding,
    /// Lexical overlap.
    Keyword,
}

impl MatchKind {
    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ExplicitReference => "explicit-reference",
            Self::Embedding => "embedding",
            Self::Keyword => "keyword",
        }
    }
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One passage found by one signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RetrievalHit {
    pub passage_id: u64,
    pub score: f32,
    pub kind: MatchKind,
}

/// Ranked hits for one claim.
///
/// Scores are comparable within one result only. Hits are sorted by score
/// descending, then passage ID ascending, then [`MatchKind`] order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalResult {
    pub hits: Vec<RetrievalHit>,
    pub mode: RetrievalMode,
    /// Explicit references found in the claim.
    pub references: Vec<ScriptureReference>,
    /// Claim terms used for keyword scoring, sorted.
    pub terms: Vec<String>,
}

impl RetrievalResult {
    /// Whether nothing was found.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// The best hit of each passage, in ranking order.
    pub fn ranked_passages(&self) -> Vec<RetrievalHit> {
        let mut seen = HashSet::new();
        self.hits
            .iter()
            .filter(|h| seen.insert(h.passage_id))
            .copied()
            .collect()
    }

    /// The best hit overall.
    pub fn best(&self) -> Option<&RetrievalHit> {
        self.hits.first()
    }
}

/// Everything retrieval needs to know about one claim.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalQuery<'a> {
    /// Normalized claim tokens.
    pub tokens: &'a [String],
    /// Claim language tag.
    pub language: &'a str,
    /// Explicit references extracted from the claim.
    pub references: &'a [ScriptureReference],
    /// Claim embedding, when the provider answered.
    pub embedding: Option<&'a [f32]>,
}

/// Runs the three retrieval signals against a snapshot.
#[derive(Debug, Clone)]
pub struct Retriever {
    depth: usize,
    reference_base_score: f32,
    /// Tokens that frame a claim rather than carry its content.
    excluded: HashSet<String>,
}

impl Retriever {
    /// Retriever using `config`'s depth and reference score, ignoring the
    /// tokens of every alias in `aliases` when scoring keywords.
    pub fn new(config: &EngineConfig, aliases: &AliasTable) -> Self {
        let mut excluded = aliases.tokens();
        excluded.extend(QUOTE_VERBS.iter().map(|v| v.to_string()));
        Self {
            depth: config.retrieval_depth,
            reference_base_score: config.reference_base_score,
            excluded,
        }
    }

    /// Content terms of a claim: no stop words, negations, work names,
    /// quotation verbs or bare numbers. Sorted and deduplicated.
    pub fn claim_terms(&self, tokens: &[String], language: &str) -> Vec<String> {
        let matcher = KeywordMatcher::new(language);
        let mut terms: Vec<String> = matcher
            .terms(tokens)
            .into_iter()
            .filter(|t| !self.excluded.contains(*t))
            .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
            .map(str::to_string)
            .collect();
        terms.sort();
        terms
    }

    /// Retrieve candidate passages for a claim.
    pub fn retrieve(&self, index: &ScriptureIndex, query: &RetrievalQuery<'_>) -> RetrievalResult {
        let terms = self.claim_terms(query.tokens, query.language);
        let term_set: HashSet<&str> = terms.iter().map(String::as_str).collect();
        let corpus = index.corpus();

        let embedding = match (query.embedding, index.vectors()) {
            (Some(e), Some(v)) if e.len() == v.dimension() => Some((e, v)),
            _ => None,
        };
        let mode = if embedding.is_some() {
            RetrievalMode::Embedding
        } else {
            RetrievalMode::KeywordOnly
        };

        let mut hits = Vec::new();

        // explicit references: one hit per covered passage, best score kept
        let mut referenced: HashMap<u64, f32> = HashMap::new();
        for reference in query.references {
            for passage in corpus.resolve(reference) {
                let lexical = index.keywords().score(passage.id, &term_set);
                let semantic = match embedding {
                    Some((e, _)) if !passage.embedding.is_empty() => {
                        cosine_similarity(e, &passage.embedding).max(0.0)
                    }
                    _ => 0.0,
                };
                let score = self.reference_base_score
                    + (1.0 - self.reference_base_score) * lexical.max(semantic);
                let entry = referenced.entry(passage.id).or_insert(score);
                *entry = entry.max(score);
            }
        }
        hits.extend(referenced.into_iter().map(|(passage_id, score)| RetrievalHit {
            passage_id,
            score,
            kind: MatchKind::ExplicitReference,
        }));

        if let Some((e, vectors)) = embedding {
            match vectors.query(e, self.depth) {
                Ok(found) => hits.extend(
                    found
                        .into_iter()
                        .filter(|(_, sim)| *sim > 0.0)
                        .map(|(passage_id, score)| RetrievalHit {
                            passage_id,
                            score,
                            kind: MatchKind::Embedding,
                        }),
                ),
                Err(e) => log::warn!("vector query failed: {e}"),
            }
        }

        hits.extend(
            index
                .keywords()
                .rank(&term_set, self.depth)
                .into_iter()
                .map(|(passage_id, score)| RetrievalHit {
                    passage_id,
                    score,
                    kind: MatchKind::Keyword,
                }),
        );

        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.passage_id.cmp(&b.passage_id))
                .then(a.kind.cmp(&b.kind))
        });

        log::debug!(
            "retrieved {} hits ({} mode, {} terms, {} references)",
            hits.len(),
            mode.name(),
            terms.len(),
            query.references.len()
        );

        RetrievalResult {
            hits,
            mode,
            references: query.references.to_vec(),
            terms,
        }
    }
}
