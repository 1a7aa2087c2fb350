//! Engine configuration with TOML persistence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::{ScriptureError, ScriptureResult, DEFAULT_CITATION_LIMIT, DEFAULT_DIMENSION};

/// Default number of passages requested from each retrieval signal.
pub const DEFAULT_RETRIEVAL_DEPTH: usize = 10;
/// Default relevance floor. Nothing below it counts as evidence.
pub const DEFAULT_MIN_RELEVANCE: f32 = 0.35;
/// Default score at or above which a match can support a claim.
pub const DEFAULT_SUPPORT_THRESHOLD: f32 = 0.75;
/// Default score floor of a passage named by an explicit reference.
pub const DEFAULT_REFERENCE_BASE_SCORE: f32 = 0.80;
/// Default width of the top tier used for alternative views.
pub const DEFAULT_COMPARABLE_MARGIN: f32 = 0.10;
/// Default number of tokens scanned backwards for a negation cue.
pub const DEFAULT_NEGATION_WINDOW: usize = 3;
/// Default bound on a single embedding call.
pub const DEFAULT_EMBEDDING_TIMEOUT_MS: u64 = 2_000;

/// Tunable policy of the retrieval and verdict engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum citations per verdict.
    pub citation_limit: usize,

    /// `k` passed to the vector and keyword queries.
    pub retrieval_depth: usize,

    /// Relevance floor (0.0 - 1.0).
    pub min_relevance: f32,

    /// Score needed for a Supported verdict (0.0 - 1.0).
    pub support_threshold: f32,

    /// Score floor of an explicit-reference hit (0.0 - 1.0).
    pub reference_base_score: f32,

    /// Passages within this distance of the best score form the top tier.
    pub comparable_margin: f32,

    /// Tokens before a term scanned for a negation cue.
    pub negation_window: usize,

    /// Dimension of the local hashing embedder.
    pub embedding_dimension: usize,

    /// Timeout of one embedding call, in milliseconds.
    pub embedding_timeout_ms: u64,

    /// Extra alias → canonical work entries, merged over the built-in table.
    pub aliases: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            citation_limit: DEFAULT_CITATION_LIMIT,
            retrieval_depth: DEFAULT_RETRIEVAL_DEPTH,
            min_relevance: DEFAULT_MIN_RELEVANCE,
            support_threshold: DEFAULT_SUPPORT_THRESHOLD,
            reference_base_score: DEFAULT_REFERENCE_BASE_SCORE,
            comparable_margin: DEFAULT_COMPARABLE_MARGIN,
            negation_window: DEFAULT_NEGATION_WINDOW,
            embedding_dimension: DEFAULT_DIMENSION,
            embedding_timeout_ms: DEFAULT_EMBEDDING_TIMEOUT_MS,
            aliases: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Default config file location: `<config dir>/scripture-check/config.toml`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scripture-check")
            .join("config.toml")
    }

    /// Load and validate a TOML file.
    pub fn load(path: &Path) -> ScriptureResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML text. Missing fields take their defaults.
    pub fn from_toml(content: &str) -> ScriptureResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ScriptureError::Toml(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as pretty TOML.
    pub fn to_toml(&self) -> ScriptureResult<String> {
        toml::to_string_pretty(self).map_err(|e| ScriptureError::Toml(e.to_string()))
    }

    /// Save to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> ScriptureResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Load from the default location, or fall back to defaults.
    pub fn load_or_default() -> Self {
        Self::load_or_default_from(&Self::default_path()).0
    }

    /// Load from `path` if it holds a valid config, otherwise use defaults.
    /// The second element is the file the values came from, if any.
    pub fn load_or_default_from(path: &Path) -> (Self, Option<PathBuf>) {
        if !path.exists() {
            return (Self::default(), None);
        }
        match Self::load(path) {
            Ok(config) => (config, Some(path.to_path_buf())),
            Err(e) => {
                log::warn!("ignoring config at {}: {e}", path.display());
                (Self::default(), None)
            }
        }
    }

    /// Check ranges and cross-field constraints.
    pub fn validate(&self) -> ScriptureResult<()> {
        if self.citation_limit == 0 {
            return Err(invalid("citation_limit must be at least 1"));
        }
        if self.retrieval_depth == 0 {
            return Err(invalid("retrieval_depth must be at least 1"));
        }
        for (name, value) in [
            ("min_relevance", self.min_relevance),
            ("support_threshold", self.support_threshold),
            ("reference_base_score", self.reference_base_score),
            ("comparable_margin", self.comparable_margin),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(&format!("{name} must be within [0, 1], got {value}")));
            }
        }
        if self.min_relevance > self.support_threshold {
            return Err(invalid("min_relevance must not exceed support_threshold"));
        }
        if self.embedding_dimension == 0 {
            return Err(invalid("embedding_dimension must be at least 1"));
        }
        if self.embedding_timeout_ms == 0 {
            return Err(invalid("embedding_timeout_ms must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> ScriptureError {
    ScriptureError::InvalidConfig(message.to_string())
}
