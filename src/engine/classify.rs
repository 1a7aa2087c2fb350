//! Claim classifier: an ordered rule table over lexical signals.
//!
//! Every rule is evaluated and recorded, but only the first one that fires
//! decides the claim type. Confidences are fixed per rule.

use std::collections::HashSet;

use serde::Serialize;

use crate::text::{normalize, AliasTable, ScriptureReference};
use crate::types::{Claim, ClaimType};

/// Verbs that introduce a quotation or paraphrase of a text.
pub const QUOTE_VERBS: &[&str] = &[
    "say", "says", "said", "saying", "state", "states", "stated", "mean", "means", "meant",
    "teach", "teaches", "taught", "mention", "mentions", "mentioned", "write", "writes",
    "written", "quote", "quotes", "quoted", "declare", "declares", "tell", "tells", "told",
];

const QUOTE_MARKS: &[char] = &['"', '\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'];

const HISTORICAL_TERMS: &[&str] = &[
    "history", "historical", "historically", "event", "events", "occurred", "happened", "born",
    "died", "death", "war", "battle", "king", "kingdom", "empire", "emperor", "century",
    "centuries", "ancient", "dynasty", "archaeology", "archaeological", "era", "bc", "bce", "ad",
    "ce", "year", "years", "lived", "ruled", "founded", "conquered",
];

const HISTORICAL_PERSONS: &[&str] = &[
    "moses", "abraham", "jesus", "muhammad", "krishna", "arjuna", "buddha", "siddhartha",
    "david", "solomon", "nanak", "paul", "pharaoh", "herod", "pilate", "ashoka", "rama",
];

const VALUE_LADEN_TERMS: &[&str] = &[
    "should", "must", "ought", "sin", "sins", "sinful", "salvation", "saved", "destiny", "fate",
    "heaven", "hell", "karma", "moksha", "nirvana", "righteous", "evil", "sacred", "divine",
    "god", "gods", "faith", "belief", "believe", "afterlife", "soul", "souls", "forgiven",
    "forgiveness", "punish", "punishment", "moral", "immoral", "worship", "holy", "blessed",
    "damnation", "grace", "dharma",
];

/// Confidence of the fallback rule. Kept at or below 0.3.
pub const FALLBACK_CONFIDENCE: f32 = 0.25;

/// Identifies a classifier rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleId {
    /// Explicit chapter:verse citation with a quotation verb.
    CitedQuotation,
    /// Historical event, person or date without a scripture citation.
    HistoricalWithoutCitation,
    /// Value-laden terms without a scripture citation.
    ValueLadenWithoutCitation,
    /// Textual and value-laden signals together.
    TextualAndValueLaden,
    /// Nothing else fired.
    Fallback,
}

impl RuleId {
    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CitedQuotation => "cited-quotation",
            Self::HistoricalWithoutCitation => "historical-without-citation",
            Self::ValueLadenWithoutCitation => "value-laden-without-citation",
            Self::TextualAndValueLaden => "textual-and-value-laden",
            Self::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Lexical signals the rules are evaluated on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClaimSignals {
    /// At least one explicit chapter:verse reference.
    pub has_reference: bool,
    /// A known work is named, with or without chapter and verse.
    pub names_work: bool,
    /// A quotation verb or quotation marks.
    pub has_quote_verb: bool,
    /// Historical events, persons or dates.
    pub has_historical: bool,
    /// Value-laden vocabulary.
    pub has_value_laden: bool,
}

impl ClaimSignals {
    /// Any kind of scripture citation, explicit or by name.
    pub fn cites_scripture(&self) -> bool {
        self.has_reference || self.names_work
    }

    /// Signals that the claim is about what a text says.
    pub fn textual(&self) -> bool {
        self.has_reference || self.has_quote_verb
    }
}

struct Rule {
    id: RuleId,
    claim_type: ClaimType,
    confidence: f32,
    applies: fn(&ClaimSignals) -> bool,
}

/// Priority order. The first rule that applies wins.
const RULES: &[Rule] = &[
    Rule {
        id: RuleId::CitedQuotation,
        claim_type: ClaimType::Textual,
        confidence: 0.9,
        applies: |s| s.has_reference && s.has_quote_verb,
    },
    Rule {
        id: RuleId::HistoricalWithoutCitation,
        claim_type: ClaimType::Historical,
        confidence: 0.75,
        applies: |s| s.has_historical && !s.cites_scripture(),
    },
    Rule {
        id: RuleId::ValueLadenWithoutCitation,
        claim_type: ClaimType::Theological,
        confidence: 0.7,
        applies: |s| s.has_value_laden && !s.cites_scripture(),
    },
    Rule {
        id: RuleId::TextualAndValueLaden,
        claim_type: ClaimType::Mixed,
        confidence: 0.6,
        applies: |s| s.textual() && s.has_value_laden,
    },
    Rule {
        id: RuleId::Fallback,
        claim_type: ClaimType::Textual,
        confidence: FALLBACK_CONFIDENCE,
        applies: |_| true,
    },
];

/// Outcome of classifying one claim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    /// The primary claim type.
    pub claim_type: ClaimType,
    /// Fixed confidence of the deciding rule, in [0, 1].
    pub confidence: f32,
    /// The rule that decided the claim type.
    pub rule: RuleId,
    /// Every rule that fired, in priority order.
    pub fired_rules: Vec<RuleId>,
    /// The signals the rules saw.
    pub signals: ClaimSignals,
}

/// Rule-based claim classifier. Stateless apart from the work names it
/// recognizes.
#[derive(Debug, Clone)]
pub struct ClaimClassifier {
    /// Token sequences of known work aliases (aliases of 3+ characters).
    work_names: Vec<Vec<String>>,
}

impl ClaimClassifier {
    /// Classifier recognizing the works in `aliases`.
    pub fn new(aliases: &AliasTable) -> Self {
        let mut work_names: Vec<Vec<String>> = aliases
            .entries()
            .flat_map(|(alias, work)| [normalize(alias), normalize(work)])
            .filter(|tokens| !tokens.is_empty() && tokens.concat().chars().count() >= 3)
            .collect();
        work_names.sort();
        work_names.dedup();
        Self { work_names }
    }

    /// Compute the signals of a claim text.
    pub fn signals(&self, text: &str, references: &[ScriptureReference]) -> ClaimSignals {
        let tokens = normalize(text);
        let set: HashSet<&str> = tokens.iter().map(String::as_str).collect();

        let has_quote_verb =
            QUOTE_VERBS.iter().any(|v| set.contains(v)) || text.contains(QUOTE_MARKS);

        let has_historical = HISTORICAL_TERMS.iter().any(|t| set.contains(t))
            || HISTORICAL_PERSONS.iter().any(|t| set.contains(t))
            || tokens.iter().any(|t| is_year(t));

        let has_value_laden = VALUE_LADEN_TERMS.iter().any(|t| set.contains(t));

        let names_work = self
            .work_names
            .iter()
            .any(|name| tokens.windows(name.len()).any(|w| w == name.as_slice()));

        ClaimSignals {
            has_reference: !references.is_empty(),
            names_work,
            has_quote_verb,
            has_historical,
            has_value_laden,
        }
    }

    /// Classify raw text with its extracted references.
    pub fn classify(&self, text: &str, references: &[ScriptureReference]) -> ClassificationResult {
        evaluate(self.signals(text, references))
    }

    /// Classify a claim. The declared hint only replaces the fallback decision;
    /// any rule with real evidence takes precedence over it.
    pub fn classify_claim(
        &self,
        claim: &Claim,
        references: &[ScriptureReference],
    ) -> ClassificationResult {
        let mut result = self.classify(&claim.text, references);
        if let (RuleId::Fallback, Some(hint)) = (result.rule, claim.hint) {
            result.claim_type = hint;
        }
        result
    }
}

impl Default for ClaimClassifier {
    fn default() -> Self {
        Self::new(&AliasTable::builtin())
    }
}

/// Apply the rule table to precomputed signals.
pub fn evaluate(signals: ClaimSignals) -> ClassificationResult {
    let fired: Vec<&Rule> = RULES.iter().filter(|r| (r.applies)(&signals)).collect();
    // the fallback always applies, so `fired` is never empty
    let winner = fired.first().copied().unwrap_or(&RULES[RULES.len() - 1]);
    ClassificationResult {
        claim_type: winner.claim_type,
        confidence: winner.confidence,
        rule: winner.id,
        fired_rules: fired.iter().map(|r| r.id).collect(),
        signals,
    }
}

/// Four-digit number in a plausible calendar range.
fn is_year(token: &str) -> bool {
    token.len() == 4
        && token.bytes().all(|b| b.is_ascii_digit())
        && token.parse::<u32>().is_ok_and(|y| (100..=2100).contains(&y))
}
