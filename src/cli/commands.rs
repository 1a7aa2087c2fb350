//! CLI command implementations.

use std::path::Path;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::corpus::{CorpusLoader, LoadReport};
use crate::embed::{EmbeddingProvider, HashingEmbedder, UnavailableEmbedder};
use crate::engine::{ClaimClassifier, FactChecker, IndexHandle};
use crate::history::JsonlHistory;
use crate::text::{AliasTable, ReferenceExtractor};
use crate::types::{Claim, FactCheckResult, ScriptureResult};

/// Load passages from `corpus_dir`, or the built-in sample corpus.
pub fn load_corpus(corpus_dir: Option<&Path>) -> ScriptureResult<LoadReport> {
    let report = match corpus_dir {
        Some(dir) => {
            let mut loader = CorpusLoader::new();
            loader.load_dir(dir)?;
            loader.finish()
        }
        None => CorpusLoader::builtin(),
    };
    if report.skipped_count() > 0 {
        log::warn!(
            "{} corpus records skipped while loading",
            report.skipped_count()
        );
    }
    Ok(report)
}

/// Build a checker over a freshly published snapshot.
pub fn build_checker(
    config: &EngineConfig,
    corpus_dir: Option<&Path>,
    offline: bool,
) -> ScriptureResult<FactChecker> {
    let report = load_corpus(corpus_dir)?;
    let provider: Arc<dyn EmbeddingProvider> = if offline {
        Arc::new(UnavailableEmbedder)
    } else {
        Arc::new(HashingEmbedder::new(config.embedding_dimension))
    };
    let checker = FactChecker::new(Arc::new(IndexHandle::new()), provider, config.clone())?;
    checker.rebuild(report.passages);
    Ok(checker)
}

fn extractor(config: &EngineConfig) -> ScriptureResult<ReferenceExtractor> {
    let mut aliases = AliasTable::builtin();
    aliases.extend(&config.aliases);
    ReferenceExtractor::new(aliases)
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

/// Check one claim and print the verdict.
pub fn cmd_check(
    config: &EngineConfig,
    claim: &Claim,
    corpus_dir: Option<&Path>,
    offline: bool,
    history: Option<&Path>,
    json: bool,
) -> ScriptureResult<()> {
    let checker = build_checker(config, corpus_dir, offline)?;
    let result = checker.check(claim)?;

    if let Some(path) = history {
        JsonlHistory::new(path).append(&result)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }
    Ok(())
}

fn print_result(result: &FactCheckResult) {
    println!("Claim: {}", result.claim);
    println!("Type: {}", result.claim_type);
    println!("Verdict: {} ({}%)", result.verdict, result.confidence);
    println!("Retrieval: {}", result.retrieval_mode.name());
    println!("Rationale: {}", result.rationale);
    if !result.citations.is_empty() {
        println!("Citations:");
        for citation in &result.citations {
            println!(
                "  {} {}: {}",
                citation.work, citation.reference, citation.text
            );
        }
    }
    if !result.alternative_views.is_empty() {
        println!("Alternative views:");
        for view in &result.alternative_views {
            println!("  - {view}");
        }
    }
    println!("Next steps:");
    for step in &result.next_steps {
        println!("  - {step}");
    }
}

/// Print the references found in `text`.
pub fn cmd_refs(config: &EngineConfig, text: &str, json: bool) -> ScriptureResult<()> {
    let references = extractor(config)?.extract(text);
    if json {
        println!("{}", serde_json::to_string_pretty(&references)?);
    } else if references.is_empty() {
        println!("No references found.");
    } else {
        for reference in &references {
            println!("{reference} (written as \"{}\")", reference.alias);
        }
    }
    Ok(())
}

/// Print the classification of `text` and every rule that fired.
pub fn cmd_classify(config: &EngineConfig, text: &str, json: bool) -> ScriptureResult<()> {
    let extractor = extractor(config)?;
    let references = extractor.extract(text);
    let result = ClaimClassifier::new(extractor.aliases()).classify(text, &references);
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Type: {}", result.claim_type);
        println!("Confidence: {:.2}", result.confidence);
        println!("Rule: {}", result.rule);
        let fired: Vec<&str> = result.fired_rules.iter().map(|r| r.name()).collect();
        println!("Fired: {}", fired.join(", "));
    }
    Ok(())
}

/// Print raw retrieval hits for a query.
pub fn cmd_search(
    config: &EngineConfig,
    query: &str,
    language: &str,
    corpus_dir: Option<&Path>,
    limit: usize,
    offline: bool,
    json: bool,
) -> ScriptureResult<()> {
    let checker = build_checker(config, corpus_dir, offline)?;
    let mut result = checker.search(query, language)?;
    result.hits.truncate(limit);
    let snapshot = checker.index().snapshot()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    println!("Mode: {}", result.mode.name());
    if result.hits.is_empty() {
        println!("No matches.");
    }
    for hit in &result.hits {
        let label = snapshot
            .corpus()
            .get(hit.passage_id)
            .map(|p| p.label())
            .unwrap_or_default();
        println!(
            "  {:.4}  {:<18}  [{}] {}",
            hit.score,
            hit.kind.name(),
            hit.passage_id,
            label
        );
    }
    Ok(())
}

/// Summarize a corpus: works, passage counts and skipped records.
pub fn cmd_corpus(corpus_dir: Option<&Path>, json: bool) -> ScriptureResult<()> {
    let report = load_corpus(corpus_dir)?;
    let skipped: Vec<String> = report.skipped.iter().map(|e| e.to_string()).collect();
    let sources = report.sources;
    let corpus = report.into_corpus();
    let works: Vec<(String, usize)> = corpus
        .works()
        .iter()
        .map(|w| (w.clone(), corpus.passages_of(w).len()))
        .collect();

    if json {
        let works_json: Vec<serde_json::Value> = works
            .iter()
            .map(|(w, n)| serde_json::json!({"work": w, "passages": n}))
            .collect();
        print_json(&serde_json::json!({
            "sources": sources,
            "passages": corpus.len(),
            "works": works_json,
            "skipped": skipped,
        }));
    } else {
        println!("Sources: {sources}");
        println!("Passages: {}", corpus.len());
        println!("Works:");
        for (work, count) in &works {
            println!("  {work}: {count}");
        }
        println!("Skipped records: {}", skipped.len());
        for reason in &skipped {
            println!("  {reason}");
        }
    }
    Ok(())
}

/// Print stored results, newest first.
pub fn cmd_history(path: &Path, limit: usize, offset: usize, json: bool) -> ScriptureResult<()> {
    let results = JsonlHistory::new(path).list(limit, offset)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_empty() {
        println!("No history.");
    } else {
        for result in &results {
            println!(
                "{}  {:<20} {:>3}%  {}",
                result.timestamp.format("%Y-%m-%d %H:%M:%S"),
                result.verdict.name(),
                result.confidence,
                result.claim
            );
        }
    }
    Ok(())
}

/// Print the effective configuration as TOML.
pub fn cmd_config(config: &EngineConfig, source: Option<&Path>) -> ScriptureResult<()> {
    match source {
        Some(path) => println!("# {}", path.display()),
        None => println!("# defaults ({})", EngineConfig::default_path().display()),
    }
    print!("{}", config.to_toml()?);
    Ok(())
}
