//! Verdict engine: turns ranked evidence into a label, a confidence and a
//! traceable rationale.

use std::collections::HashSet;

use serde::Serialize;

use crate::config::EngineConfig;
use crate::corpus::Corpus;
use crate::text::{is_negated_at, normalize};
use crate::types::{Citation, ClaimType, Passage, Verdict, VerdictLabel};

use super::classify::ClassificationResult;
use super::retrieve::{MatchKind, RetrievalResult};

/// How a passage relates to the claim's core terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    /// Shares terms with the claim, with the same polarity.
    Affirms,
    /// At least half of the shared terms have the opposite polarity.
    Denies,
    /// No shared terms.
    Neutral,
}

impl Stance {
    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Affirms => "affirms",
            Self::Denies => "denies",
            Self::Neutral => "neutral",
        }
    }

    fn phrase(&self) -> &'static str {
        match self {
            Self::Affirms => "appears to affirm the claim",
            Self::Denies => "appears to contradict the claim",
            Self::Neutral => "is related but takes no clear position on it",
        }
    }
}

/// One ranked passage with its stance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassageAssessment {
    pub passage_id: u64,
    /// "Work reference".
    pub label: String,
    pub score: f32,
    pub kind: MatchKind,
    pub stance: Stance,
    /// Claim terms that also occur in the passage.
    pub shared_terms: usize,
}

/// Deterministic verdict policy.
#[derive(Debug, Clone)]
pub struct VerdictEngine {
    citation_limit: usize,
    min_relevance: f32,
    support_threshold: f32,
    comparable_margin: f32,
    negation_window: usize,
}

impl VerdictEngine {
    /// Engine using the thresholds in `config`.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            citation_limit: config.citation_limit,
            min_relevance: config.min_relevance,
            support_threshold: config.support_threshold,
            comparable_margin: config.comparable_margin,
            negation_window: config.negation_window,
        }
    }

    /// Stance of `passage` towards a claim with `claim_tokens` and content `terms`.
    ///
    /// A term's polarity is whether its first occurrence falls within the
    /// negation window after a negation cue.
    pub fn stance(
        &self,
        claim_tokens: &[String],
        terms: &[String],
        passage: &Passage,
    ) -> (Stance, usize) {
        let passage_tokens = normalize(&passage.text);
        let present: HashSet<&str> = passage_tokens.iter().map(String::as_str).collect();

        let mut shared = 0;
        let mut flipped = 0;
        for term in terms.iter().filter(|t| present.contains(t.as_str())) {
            shared += 1;
            let claim_negated = self.polarity(claim_tokens, term);
            let passage_negated = self.polarity(&passage_tokens, term);
            if claim_negated != passage_negated {
                flipped += 1;
            }
        }

        let stance = if shared == 0 {
            Stance::Neutral
        } else if flipped * 2 >= shared {
            Stance::Denies
        } else {
            Stance::Affirms
        };
        (stance, shared)
    }

    fn polarity(&self, tokens: &[String], term: &str) -> bool {
        tokens
            .iter()
            .position(|t| t == term)
            .is_some_and(|pos| is_negated_at(tokens, pos, self.negation_window))
    }

    /// Best hit per passage, with stance, in ranking order.
    pub fn assess(
        &self,
        claim_tokens: &[String],
        retrieval: &RetrievalResult,
        corpus: &Corpus,
    ) -> Vec<PassageAssessment> {
        retrieval
            .ranked_passages()
            .into_iter()
            .filter_map(|hit| {
                let passage = corpus.get(hit.passage_id)?;
                let (stance, shared_terms) = self.stance(claim_tokens, &retrieval.terms, passage);
                Some(PassageAssessment {
                    passage_id: hit.passage_id,
                    label: passage.label(),
                    score: hit.score,
                    kind: hit.kind,
                    stance,
                    shared_terms,
                })
            })
            .collect()
    }

    /// Decide the verdict for one claim.
    pub fn decide(
        &self,
        claim_tokens: &[String],
        classification: &ClassificationResult,
        retrieval: &RetrievalResult,
        corpus: &Corpus,
    ) -> Verdict {
        let assessed = self.assess(claim_tokens, retrieval, corpus);
        let relevant: Vec<&PassageAssessment> = assessed
            .iter()
            .filter(|a| a.score >= self.min_relevance)
            .collect();
        let theological = classification.claim_type == ClaimType::Theological;

        let citations: Vec<Citation> = relevant
            .iter()
            .filter_map(|a| corpus.get(a.passage_id))
            .take(self.citation_limit)
            .map(Citation::from)
            .collect();

        let Some(best) = relevant.first().copied() else {
            let closest = assessed.first();
            let closest_score = closest.map_or(0.0, |a| a.score.max(0.0));
            let mut rationale = if theological {
                format!(
                    "The claim is theological and no passage reached the relevance floor of {:.2}; \
                     doctrinal questions cannot be settled by text matching alone.",
                    self.min_relevance
                )
            } else {
                format!(
                    "No passage reached the relevance floor of {:.2}.",
                    self.min_relevance
                )
            };
            if let Some(a) = closest {
                rationale.push_str(&format!(
                    " The closest match was {} (score {:.2}, {}).",
                    a.label, a.score, a.kind
                ));
            }
            let (label, confidence) = if theological {
                (VerdictLabel::Theological, theological_confidence(closest_score))
            } else {
                let ratio = if self.min_relevance > 0.0 {
                    closest_score / self.min_relevance
                } else {
                    0.0
                };
                (VerdictLabel::Unclear, to_confidence(25.0 + 15.0 * ratio.clamp(0.0, 1.0)))
            };
            return self.finish(label, confidence, rationale, citations, Vec::new());
        };

        let tier: Vec<&PassageAssessment> = relevant
            .iter()
            .copied()
            .filter(|a| a.score >= best.score - self.comparable_margin)
            .collect();
        let alternative_views = alternative_views(&tier, self.citation_limit);
        let strength = self.strength(best.score);

        let affirmed = tier.iter().any(|a| a.stance == Stance::Affirms);
        let denied = tier.iter().any(|a| a.stance == Stance::Denies);

        let (label, confidence, reason) = if affirmed && denied {
            (
                VerdictLabel::PartiallySupported,
                to_confidence(45.0 + 24.0 * strength),
                "The top-ranked passages point in different directions: some affirm the claim and some deny it.".to_string(),
            )
        } else if best.stance == Stance::Denies {
            (
                VerdictLabel::Contradicted,
                to_confidence(60.0 + 30.0 * strength),
                "The best-matching passage negates the claim's core terms.".to_string(),
            )
        } else if best.kind == MatchKind::ExplicitReference
            && best.score >= self.support_threshold
        {
            if best.stance == Stance::Neutral {
                // the citation resolves, the predicate is unverified
                (
                    VerdictLabel::Supported,
                    SUPPORTED_FLOOR,
                    format!(
                        "The explicitly referenced passage {} exists, but its text does not lexically support the rest of the claim; only the citation itself is confirmed.",
                        best.label
                    ),
                )
            } else {
                (
                    VerdictLabel::Supported,
                    self.supported_confidence(best.score),
                    format!(
                        "The explicitly referenced passage {} shares the claim's core terms and scored {:.2}, at or above the support threshold of {:.2}.",
                        best.label, best.score, self.support_threshold
                    ),
                )
            }
        } else if best.score >= self.support_threshold && best.stance == Stance::Affirms {
            (
                VerdictLabel::Supported,
                self.supported_confidence(best.score),
                format!(
                    "The best-matching passage shares the claim's core terms with the same polarity and scored at or above the support threshold of {:.2}.",
                    self.support_threshold
                ),
            )
        } else if theological {
            (
                VerdictLabel::Theological,
                theological_confidence(best.score),
                "The claim is theological; related passages exist, but text matching alone cannot settle a doctrinal question.".to_string(),
            )
        } else {
            (
                VerdictLabel::PartiallySupported,
                to_confidence(45.0 + 24.0 * strength),
                "Related passages were found, but none matches the claim strongly enough to support it outright.".to_string(),
            )
        };

        let evidence: Vec<String> = tier
            .iter()
            .take(self.citation_limit)
            .map(|a| format!("{} ({}, score {:.2}, {})", a.label, a.kind, a.score, a.stance.name()))
            .collect();
        let rationale = format!("{reason} Evidence: {}.", evidence.join("; "));

        self.finish(label, confidence, rationale, citations, alternative_views)
    }

    fn finish(
        &self,
        label: VerdictLabel,
        confidence: u8,
        rationale: String,
        citations: Vec<Citation>,
        alternative_views: Vec<String>,
    ) -> Verdict {
        Verdict {
            label,
            confidence,
            rationale,
            citations,
            alternative_views,
            next_steps: next_steps(label),
        }
    }

    /// Position of `score` between the relevance floor and 1, in [0, 1].
    fn strength(&self, score: f32) -> f32 {
        let span = 1.0 - self.min_relevance;
        if span <= 0.0 {
            return 1.0;
        }
        ((score - self.min_relevance) / span).clamp(0.0, 1.0)
    }

    fn supported_confidence(&self, score: f32) -> u8 {
        let span = 1.0 - self.support_threshold;
        let ratio = if span > 0.0 {
            ((score - self.support_threshold) / span).clamp(0.0, 1.0)
        } else {
            1.0
        };
        to_confidence(SUPPORTED_FLOOR as f32 + 25.0 * ratio)
    }
}

/// Lowest confidence a Supported verdict carries.
const SUPPORTED_FLOOR: u8 = 70;

fn theological_confidence(score: f32) -> u8 {
    to_confidence((30.0 + 30.0 * score.clamp(0.0, 1.0)).min(60.0))
}

fn to_confidence(value: f32) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

/// One line per top-tier passage, only when some affirm and some deny.
/// Neutral passages take no position and never open a disagreement.
fn alternative_views(tier: &[&PassageAssessment], limit: usize) -> Vec<String> {
    let stances: HashSet<Stance> = tier
        .iter()
        .map(|a| a.stance)
        .filter(|s| *s != Stance::Neutral)
        .collect();
    if stances.len() < 2 {
        return Vec::new();
    }
    tier.iter()
        .take(limit.max(2))
        .map(|a| format!("{} {} (score {:.2}).", a.label, a.stance.phrase(), a.score))
        .collect()
}

/// Fixed follow-up suggestions for a verdict.
pub fn next_steps(label: VerdictLabel) -> Vec<String> {
    let steps: &[&str] = match label {
        VerdictLabel::Supported => &[
            "Read the cited passages in their full context",
            "Compare the wording across several translations",
        ],
        VerdictLabel::Contradicted => &[
            "Review the cited passages that conflict with the claim",
            "Check whether the claim relies on a different translation or interpretation",
        ],
        VerdictLabel::PartiallySupported => &[
            "Review the cited passages in their full context",
            "Consult multiple translations for better understanding",
            "Check scholarly commentaries for detailed analysis",
        ],
        VerdictLabel::Unclear => &[
            "Try rephrasing your claim with more specific scripture references",
            "Consult primary religious texts and commentaries directly",
        ],
        VerdictLabel::Theological => &[
            "Consult commentaries from the relevant tradition",
            "Compare how different schools interpret the passages involved",
            "Discuss the question with a scholar of the tradition",
        ],
    };
    steps.iter().map(|s| s.to_string()).collect()
}
