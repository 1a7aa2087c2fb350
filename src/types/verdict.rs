//! Verdicts and the caller-facing result schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::claim::ClaimType;
use super::passage::Passage;

/// The engine's categorical conclusion about a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerdictLabel {
    Supported,
    Contradicted,
    #[serde(rename = "Partially supported")]
    PartiallySupported,
    Unclear,
    Theological,
}

impl VerdictLabel {
    /// Return the display name used in results and history.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Supported => "Supported",
            Self::Contradicted => "Contradicted",
            Self::PartiallySupported => "Partially supported",
            Self::Unclear => "Unclear",
            Self::Theological => "Theological",
        }
    }

    /// Parse a verdict label from its display name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "supported" => Some(Self::Supported),
            "contradicted" => Some(Self::Contradicted),
            "partially supported" | "partially_supported" => Some(Self::PartiallySupported),
            "unclear" => Some(Self::Unclear),
            "theological" => Some(Self::Theological),
            _ => None,
        }
    }
}

impl std::fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A passage surfaced to the caller as evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub work: String,
    pub reference: String,
    pub text: String,
}

impl From<&Passage> for Citation {
    fn from(passage: &Passage) -> Self {
        Self {
            work: passage.work.clone(),
            reference: passage.reference.clone(),
            text: passage.text.clone(),
        }
    }
}

/// Verdict produced for a single claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub label: VerdictLabel,
    /// 0..=100.
    pub confidence: u8,
    pub rationale: String,
    pub citations: Vec<Citation>,
    pub alternative_views: Vec<String>,
    pub next_steps: Vec<String>,
}

/// Which retrieval signals were available for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetrievalMode {
    /// Vector similarity, keyword overlap and explicit references.
    Embedding,
    /// The embedding provider was unavailable; keyword overlap and references only.
    KeywordOnly,
}

impl RetrievalMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Embedding => "embedding",
            Self::KeywordOnly => "keyword-only",
        }
    }
}

/// The structured result emitted per request; also the persisted history schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactCheckResult {
    pub claim: String,
    pub language: String,
    pub claim_type: ClaimType,
    pub verdict: VerdictLabel,
    pub confidence: u8,
    pub rationale: String,
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub alternative_views: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    pub retrieval_mode: RetrievalMode,
    pub timestamp: DateTime<Utc>,
}
