//! Claim input and claim-type classification labels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of claim being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimType {
    /// What a passage literally says.
    Textual,
    /// Events, people or dates.
    Historical,
    /// Doctrine, values and interpretation.
    Theological,
    /// Textual and theological at once.
    Mixed,
}

impl ClaimType {
    /// Return a human-readable name for this claim type.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Textual => "textual",
            Self::Historical => "historical",
            Self::Theological => "theological",
            Self::Mixed => "mixed",
        }
    }

    /// Parse a claim type from a string name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "textual" => Some(Self::Textual),
            "historical" => Some(Self::Historical),
            "theological" => Some(Self::Theological),
            "mixed" => Some(Self::Mixed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ClaimType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A claim submitted for checking. Lives for the duration of one request.
#[derive(Debug, Clone)]
pub struct Claim {
    /// Raw claim text.
    pub text: String,
    /// Declared language tag.
    pub language: String,
    /// Claim type the submitter believes applies, if any.
    pub hint: Option<ClaimType>,
    /// Submission time.
    pub submitted_at: DateTime<Utc>,
}

impl Claim {
    /// Create an English claim submitted now.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: "en".to_string(),
            hint: None,
            submitted_at: Utc::now(),
        }
    }

    /// Set the declared language.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the declared claim-type hint.
    pub fn hint(mut self, hint: ClaimType) -> Self {
        self.hint = Some(hint);
        self
    }

    /// Set the submission timestamp.
    pub fn submitted_at(mut self, at: DateTime<Utc>) -> Self {
        self.submitted_at = at;
        self
    }
}
