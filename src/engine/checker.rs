//! Fact checker: the request path from claim text to structured result.

use std::sync::Arc;
use std::time::Duration;

use crate::config::EngineConfig;
use crate::embed::{BoundedEmbedder, EmbeddingProvider};
use crate::text::{normalize, AliasTable, ReferenceExtractor, ScriptureReference};
use crate::types::{
    now_utc, Claim, FactCheckResult, Passage, ScriptureError, ScriptureResult, Verdict,
};

use super::classify::{ClaimClassifier, ClassificationResult};
use super::retrieve::{RetrievalQuery, RetrievalResult, Retriever};
use super::snapshot::{IndexHandle, ScriptureIndex};
use super::verdict::VerdictEngine;

/// Every intermediate product of checking one claim.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub tokens: Vec<String>,
    pub references: Vec<ScriptureReference>,
    pub classification: ClassificationResult,
    pub retrieval: RetrievalResult,
    pub verdict: Verdict,
}

/// Checks claims against the current index snapshot.
///
/// Holds no per-request state; any number of threads may call
/// [`check`](FactChecker::check) concurrently.
pub struct FactChecker {
    index: Arc<IndexHandle>,
    provider: BoundedEmbedder,
    extractor: ReferenceExtractor,
    classifier: ClaimClassifier,
    retriever: Retriever,
    verdicts: VerdictEngine,
    config: EngineConfig,
}

impl FactChecker {
    /// Create a checker. The provider is wrapped with the configured timeout.
    pub fn new(
        index: Arc<IndexHandle>,
        provider: Arc<dyn EmbeddingProvider>,
        config: EngineConfig,
    ) -> ScriptureResult<Self> {
        config.validate()?;
        let mut aliases = AliasTable::builtin();
        aliases.extend(&config.aliases);
        let extractor = ReferenceExtractor::new(aliases)?;
        let classifier = ClaimClassifier::new(extractor.aliases());
        let retriever = Retriever::new(&config, extractor.aliases());
        let verdicts = VerdictEngine::new(&config);
        let provider = BoundedEmbedder::new(
            provider,
            Duration::from_millis(config.embedding_timeout_ms),
        );
        Ok(Self {
            index,
            provider,
            extractor,
            classifier,
            retriever,
            verdicts,
            config,
        })
    }

    /// The shared index handle.
    pub fn index(&self) -> &Arc<IndexHandle> {
        &self.index
    }

    /// The effective configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The reference extractor in use.
    pub fn extractor(&self) -> &ReferenceExtractor {
        &self.extractor
    }

    /// The claim classifier in use.
    pub fn classifier(&self) -> &ClaimClassifier {
        &self.classifier
    }

    /// The timeout-bounded embedding provider.
    pub fn provider(&self) -> &BoundedEmbedder {
        &self.provider
    }

    /// Build a snapshot of `passages` with this checker's provider and swap it in.
    pub fn rebuild(&self, passages: Vec<Passage>) -> Arc<ScriptureIndex> {
        self.index.rebuild(passages, &self.provider)
    }

    /// Check a claim and produce the caller-facing result.
    pub fn check(&self, claim: &Claim) -> ScriptureResult<FactCheckResult> {
        let analysis = self.analyze(claim)?;
        let verdict = analysis.verdict;
        Ok(FactCheckResult {
            claim: claim.text.clone(),
            language: claim.language.clone(),
            claim_type: analysis.classification.claim_type,
            verdict: verdict.label,
            confidence: verdict.confidence,
            rationale: verdict.rationale,
            citations: verdict.citations,
            alternative_views: verdict.alternative_views,
            next_steps: verdict.next_steps,
            retrieval_mode: analysis.retrieval.mode,
            timestamp: now_utc(),
        })
    }

    /// Run the full pipeline and keep every intermediate result.
    pub fn analyze(&self, claim: &Claim) -> ScriptureResult<Analysis> {
        let (tokens, references) = self.prepare(&claim.text)?;
        let snapshot = self.index.snapshot()?;

        let classification = self.classifier.classify_claim(claim, &references);
        let retrieval = self.retrieve_with(&snapshot, &claim.text, &claim.language, &tokens, &references);
        let verdict = self.verdicts.decide(
            &tokens,
            &classification,
            &retrieval,
            snapshot.corpus(),
        );

        log::debug!(
            "checked claim: {} tokens, {} references, type {}, verdict {} ({})",
            tokens.len(),
            references.len(),
            classification.claim_type,
            verdict.label,
            verdict.confidence
        );

        Ok(Analysis {
            tokens,
            references,
            classification,
            retrieval,
            verdict,
        })
    }

    /// Retrieval only, without classification or verdict.
    pub fn search(&self, text: &str, language: &str) -> ScriptureResult<RetrievalResult> {
        let (tokens, references) = self.prepare(text)?;
        let snapshot = self.index.snapshot()?;
        Ok(self.retrieve_with(&snapshot, text, language, &tokens, &references))
    }

    /// Tokenize and extract references, rejecting empty claims.
    fn prepare(&self, text: &str) -> ScriptureResult<(Vec<String>, Vec<ScriptureReference>)> {
        if text.trim().is_empty() {
            return Err(ScriptureError::EmptyClaim);
        }
        let tokens = normalize(text);
        let references = self.extractor.extract(text);
        if tokens.is_empty() && references.is_empty() {
            return Err(ScriptureError::EmptyClaim);
        }
        Ok((tokens, references))
    }

    fn retrieve_with(
        &self,
        snapshot: &ScriptureIndex,
        text: &str,
        language: &str,
        tokens: &[String],
        references: &[ScriptureReference],
    ) -> RetrievalResult {
        let embedding = self.embed_claim(snapshot, text);
        self.retriever.retrieve(
            snapshot,
            &RetrievalQuery {
                tokens,
                language,
                references,
                embedding: embedding.as_deref(),
            },
        )
    }

    /// Query embedding, or `None` when retrieval must fall back to keywords.
    fn embed_claim(&self, snapshot: &ScriptureIndex, text: &str) -> Option<Vec<f32>> {
        let vectors = snapshot.vectors()?;
        match self.provider.embed(text) {
            Ok(embedding) if embedding.len() == vectors.dimension() => Some(embedding),
            Ok(embedding) => {
                log::warn!(
                    "falling back to keyword-only retrieval: claim embedding has {} dimensions, index has {}",
                    embedding.len(),
                    vectors.dimension()
                );
                None
            }
            Err(e) => {
                log::warn!("falling back to keyword-only retrieval: {e}");
                None
            }
        }
    }
}
