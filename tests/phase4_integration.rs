//! Phase 4 tests: end-to-end checks over the built-in corpus, degraded
//! providers, concurrent rebuilds, persistence and the CLI.

use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tempfile::TempDir;

use scripture_check::config::EngineConfig;
use scripture_check::corpus::CorpusLoader;
use scripture_check::embed::{EmbeddingProvider, HashingEmbedder, UnavailableEmbedder};
use scripture_check::engine::{FactChecker, IndexHandle, ScriptureIndex};
use scripture_check::history::JsonlHistory;
use scripture_check::types::{
    Claim, ClaimType, FactCheckResult, Passage, PassageBuilder, RetrievalMode, ScriptureError,
    ScriptureResult, VerdictLabel,
};

const GITA_CLAIM: &str = "Does Bhagavad Gita 2:47 say that outcomes don't matter?";
const OFF_TOPIC_CLAIM: &str = "The stock market closed higher today";

// ==================== Helpers ====================

fn builtin_passages() -> Vec<Passage> {
    CorpusLoader::builtin().passages
}

/// Route engine logs through the test harness; `RUST_LOG=debug` shows them.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn checker_with(provider: Arc<dyn EmbeddingProvider>, config: EngineConfig) -> FactChecker {
    init_logging();
    let checker = FactChecker::new(Arc::new(IndexHandle::new()), provider, config).unwrap();
    checker.rebuild(builtin_passages());
    checker
}

fn online_checker() -> FactChecker {
    checker_with(Arc::new(HashingEmbedder::new(512)), EngineConfig::default())
}

/// Fast for corpus batches, slow for single claims.
struct SlowQueryEmbedder {
    inner: HashingEmbedder,
    delay: Duration,
}

impl EmbeddingProvider for SlowQueryEmbedder {
    fn embed(&self, text: &str) -> ScriptureResult<Vec<f32>> {
        thread::sleep(self.delay);
        self.inner.embed(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> ScriptureResult<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.inner.embed(t)).collect()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn name(&self) -> &str {
        "slow-query"
    }
}

/// Drop the timestamp so two results can be compared.
fn without_timestamp(result: &FactCheckResult) -> serde_json::Value {
    let mut value = serde_json::to_value(result).unwrap();
    value.as_object_mut().unwrap().remove("timestamp");
    value
}

// ==================== End-to-End Tests ====================

#[test]
fn test_explicit_reference_claim_supported() {
    for checker in [
        online_checker(),
        checker_with(Arc::new(UnavailableEmbedder), EngineConfig::default()),
    ] {
        let result = checker.check(&Claim::new(GITA_CLAIM)).unwrap();
        assert_eq!(result.verdict, VerdictLabel::Supported);
        assert!(result.confidence >= 70);
        assert_eq!(result.claim_type, ClaimType::Textual);
        assert_eq!(result.citations[0].work, "Bhagavad Gita");
        assert_eq!(result.citations[0].reference, "2:47");
        assert!(result.citations[0].text.contains("fruits of action"));
        assert!(result.citations.len() <= 3);
        assert!(!result.next_steps.is_empty());
    }
}

#[test]
fn test_off_topic_claim_unclear() {
    let checker = online_checker();
    let result = checker.check(&Claim::new(OFF_TOPIC_CLAIM)).unwrap();
    assert_eq!(result.verdict, VerdictLabel::Unclear);
    assert!(result.confidence <= 40);
    assert!(result.citations.is_empty());
    assert_eq!(result.retrieval_mode, RetrievalMode::Embedding);
}

#[test]
fn test_keyword_match_across_traditions() {
    let checker = online_checker();
    let result = checker.check(&Claim::new("Love your enemies")).unwrap();
    assert_eq!(result.verdict, VerdictLabel::Supported);
    assert_eq!(result.citations[0].work, "Matthew");
    assert_eq!(result.citations[0].reference, "5:44");
}

#[test]
fn test_check_idempotent() {
    let checker = online_checker();
    let claim = Claim::new(GITA_CLAIM);
    let a = checker.check(&claim).unwrap();
    let b = checker.check(&claim).unwrap();
    assert_eq!(without_timestamp(&a), without_timestamp(&b));
}

#[test]
fn test_hint_applies_to_fallback_only() {
    let checker = online_checker();
    let result = checker
        .check(&Claim::new("Pray daily").hint(ClaimType::Theological))
        .unwrap();
    assert_eq!(result.claim_type, ClaimType::Theological);

    let result = checker
        .check(&Claim::new("Moses was born in Egypt").hint(ClaimType::Textual))
        .unwrap();
    assert_eq!(result.claim_type, ClaimType::Historical);
}

#[test]
fn test_language_carried_into_result() {
    let checker = online_checker();
    let result = checker
        .check(&Claim::new("Bhagavad Gita 2:47").language("sa"))
        .unwrap();
    assert_eq!(result.language, "sa");
    assert_eq!(result.citations.len(), 2);
}

// ==================== Degraded Provider Tests ====================

#[test]
fn test_provider_unavailable_falls_back_to_keywords() {
    let checker = checker_with(Arc::new(UnavailableEmbedder), EngineConfig::default());
    let snapshot = checker.index().snapshot().unwrap();
    assert!(snapshot.vectors().is_none());

    let result = checker.check(&Claim::new("Love your enemies")).unwrap();
    assert_eq!(result.retrieval_mode, RetrievalMode::KeywordOnly);
    assert_eq!(result.verdict, VerdictLabel::Supported);
}

#[test]
fn test_slow_provider_times_out_per_claim() {
    let config = EngineConfig {
        embedding_timeout_ms: 20,
        ..EngineConfig::default()
    };
    let provider = Arc::new(SlowQueryEmbedder {
        inner: HashingEmbedder::new(512),
        delay: Duration::from_millis(500),
    });
    let checker = checker_with(provider, config);
    assert!(checker.index().snapshot().unwrap().vectors().is_some());

    let result = checker.check(&Claim::new(GITA_CLAIM)).unwrap();
    assert_eq!(result.retrieval_mode, RetrievalMode::KeywordOnly);
    assert_eq!(result.verdict, VerdictLabel::Supported);
}

// ==================== Error Tests ====================

#[test]
fn test_index_not_built() {
    let checker = FactChecker::new(
        Arc::new(IndexHandle::new()),
        Arc::new(HashingEmbedder::default()),
        EngineConfig::default(),
    )
    .unwrap();
    assert!(!checker.index().is_built());
    assert!(matches!(
        checker.check(&Claim::new(GITA_CLAIM)),
        Err(ScriptureError::IndexNotBuilt)
    ));
    assert!(matches!(
        checker.search("duty", "en"),
        Err(ScriptureError::IndexNotBuilt)
    ));
}

#[test]
fn test_empty_claim_rejected() {
    let checker = online_checker();
    for text in ["", "   ", "?! ..."] {
        assert!(matches!(
            checker.check(&Claim::new(text)),
            Err(ScriptureError::EmptyClaim)
        ));
    }

    // checked before the index is consulted
    let unbuilt = FactChecker::new(
        Arc::new(IndexHandle::new()),
        Arc::new(UnavailableEmbedder),
        EngineConfig::default(),
    )
    .unwrap();
    assert!(matches!(
        unbuilt.check(&Claim::new("  ")),
        Err(ScriptureError::EmptyClaim)
    ));
}

#[test]
fn test_invalid_config_rejected_by_checker() {
    let config = EngineConfig {
        citation_limit: 0,
        ..EngineConfig::default()
    };
    let result = FactChecker::new(
        Arc::new(IndexHandle::new()),
        Arc::new(UnavailableEmbedder),
        config,
    );
    assert!(matches!(result, Err(ScriptureError::InvalidConfig(_))));
}

#[test]
fn test_empty_corpus_is_unclear() {
    let checker = FactChecker::new(
        Arc::new(IndexHandle::new()),
        Arc::new(HashingEmbedder::new(64)),
        EngineConfig::default(),
    )
    .unwrap();
    checker.rebuild(Vec::new());
    let result = checker.check(&Claim::new(GITA_CLAIM)).unwrap();
    assert_eq!(result.verdict, VerdictLabel::Unclear);
    assert!(result.citations.is_empty());
}

// ==================== Concurrency Tests ====================

#[test]
fn test_checks_during_rebuild_see_whole_snapshots() {
    let checker = Arc::new(online_checker());
    let small: Vec<Passage> = vec![PassageBuilder::new(
        "Matthew",
        "5:44",
        "Love your enemies, bless them that curse you.",
    )
    .build()];

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let checker = Arc::clone(&checker);
            thread::spawn(move || {
                let mut outcomes = Vec::new();
                for _ in 0..20 {
                    let result = checker.check(&Claim::new("Love your enemies")).unwrap();
                    outcomes.push((result.verdict, result.citations));
                }
                outcomes
            })
        })
        .collect();

    let writer = {
        let checker = Arc::clone(&checker);
        thread::spawn(move || {
            for round in 0..10 {
                if round % 2 == 0 {
                    checker.rebuild(small.clone());
                } else {
                    checker.rebuild(builtin_passages());
                }
            }
        })
    };

    writer.join().unwrap();
    for reader in readers {
        for (label, citations) in reader.join().unwrap() {
            assert_eq!(label, VerdictLabel::Supported);
            assert_eq!(citations[0].work, "Matthew");
            assert_eq!(citations[0].reference, "5:44");
        }
    }
}

#[test]
fn test_publish_returns_previous_snapshot() {
    let handle = IndexHandle::new();
    assert!(handle.snapshot().is_err());
    let first = handle.rebuild(builtin_passages(), &HashingEmbedder::new(64));
    let held = handle.snapshot().unwrap();
    assert!(Arc::ptr_eq(&first, &held));

    let second = handle.rebuild(Vec::new(), &HashingEmbedder::new(64));
    assert!(second.corpus().is_empty());
    // a reader keeps the snapshot it started with
    assert_eq!(held.corpus().len(), first.corpus().len());
    assert!(handle.snapshot().unwrap().corpus().is_empty());

    let previous = handle.publish(ScriptureIndex::keyword_only(builtin_passages()));
    assert!(Arc::ptr_eq(&previous.unwrap(), &second));
    assert!(handle.snapshot().unwrap().vectors().is_none());
}

// ==================== Persistence Tests ====================

#[test]
fn test_result_json_round_trip() {
    let checker = online_checker();
    let result = checker.check(&Claim::new(GITA_CLAIM)).unwrap();
    let json = serde_json::to_string(&result).unwrap();
    assert!(json.contains("\"verdict\":\"Supported\""));
    assert!(json.contains("\"claim_type\":\"textual\""));
    assert!(json.contains("\"retrieval_mode\":\"embedding\""));
    let back: FactCheckResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
}

#[test]
fn test_history_append_and_list() {
    let dir = TempDir::new().unwrap();
    let history = JsonlHistory::new(dir.path().join("nested").join("history.jsonl"));
    assert!(history.is_empty().unwrap());
    assert!(history.list(10, 0).unwrap().is_empty());

    let checker = online_checker();
    for claim in [GITA_CLAIM, OFF_TOPIC_CLAIM, "Love your enemies"] {
        history.append(&checker.check(&Claim::new(claim)).unwrap()).unwrap();
    }
    assert_eq!(history.len().unwrap(), 3);

    let newest = history.list(2, 0).unwrap();
    assert_eq!(newest.len(), 2);
    assert_eq!(newest[0].claim, "Love your enemies");
    assert_eq!(newest[1].claim, OFF_TOPIC_CLAIM);

    let rest = history.list(10, 2).unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].claim, GITA_CLAIM);
}

#[test]
fn test_history_skips_bad_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.jsonl");
    let checker = online_checker();
    let history = JsonlHistory::new(&path);
    history.append(&checker.check(&Claim::new(GITA_CLAIM)).unwrap()).unwrap();

    let mut content = std::fs::read_to_string(&path).unwrap();
    content.push_str("{not json\n\n");
    std::fs::write(&path, content).unwrap();

    assert_eq!(history.list(10, 0).unwrap().len(), 1);
}

#[test]
fn test_config_toml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf").join("config.toml");
    let mut config = EngineConfig {
        citation_limit: 5,
        min_relevance: 0.4,
        ..EngineConfig::default()
    };
    config
        .aliases
        .insert("lun yu".to_string(), "Analects".to_string());
    config.save(&path).unwrap();

    let loaded = EngineConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_config_partial_toml_uses_defaults() {
    let config = EngineConfig::from_toml("citation_limit = 2\n").unwrap();
    assert_eq!(config.citation_limit, 2);
    assert_eq!(config.retrieval_depth, EngineConfig::default().retrieval_depth);
    assert!(config.aliases.is_empty());
}

#[test]
fn test_config_validation() {
    assert!(EngineConfig::default().validate().is_ok());
    assert!(matches!(
        EngineConfig::from_toml("min_relevance = 0.9\nsupport_threshold = 0.5\n"),
        Err(ScriptureError::InvalidConfig(_))
    ));
    assert!(matches!(
        EngineConfig::from_toml("reference_base_score = 1.5\n"),
        Err(ScriptureError::InvalidConfig(_))
    ));
    assert!(matches!(
        EngineConfig::from_toml("citation_limit = \"three\"\n"),
        Err(ScriptureError::Toml(_))
    ));
}

#[test]
fn test_config_load_or_default_reports_source() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    let (config, source) = EngineConfig::load_or_default_from(&path);
    assert_eq!(config, EngineConfig::default());
    assert!(source.is_none());

    std::fs::write(&path, "citation_limit = 5\n").unwrap();
    let (config, source) = EngineConfig::load_or_default_from(&path);
    assert_eq!(config.citation_limit, 5);
    assert_eq!(source.as_deref(), Some(path.as_path()));

    // invalid files are ignored, not reported as the source
    std::fs::write(&path, "citation_limit = 0\n").unwrap();
    let (config, source) = EngineConfig::load_or_default_from(&path);
    assert_eq!(config, EngineConfig::default());
    assert!(source.is_none());
}

#[test]
fn test_config_aliases_reach_extraction_and_retrieval() {
    let mut config = EngineConfig::default();
    config
        .aliases
        .insert("lun yu".to_string(), "Analects".to_string());
    let checker = FactChecker::new(
        Arc::new(IndexHandle::new()),
        Arc::new(HashingEmbedder::new(512)),
        config,
    )
    .unwrap();
    checker.rebuild(vec![PassageBuilder::new(
        "Analects",
        "2:4",
        "At fifteen, I had my mind bent on learning.",
    )
    .build()]);

    let analysis = checker
        .analyze(&Claim::new("Lun Yu 2:4 says learning matters"))
        .unwrap();
    assert_eq!(analysis.references.len(), 1);
    assert_eq!(analysis.references[0].work, "Analects");
    assert_eq!(analysis.retrieval.terms, vec!["learning", "matters"]);
    assert_eq!(analysis.verdict.label, VerdictLabel::Supported);
    assert_eq!(analysis.verdict.citations[0].work, "Analects");
}

// ==================== CLI Helpers ====================

fn scheck_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_scheck"))
}

/// Run the `scheck` CLI with the given arguments.
fn run_scheck(args: &[&str]) -> Output {
    Command::new(scheck_bin())
        .args(args)
        .output()
        .expect("Failed to run scheck")
}

/// Run `scheck` with its config and home directories pointed at `home`.
fn run_scheck_in(home: &std::path::Path, args: &[&str]) -> Output {
    Command::new(scheck_bin())
        .args(args)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .output()
        .expect("Failed to run scheck")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "scheck failed with status {:?}\nstdout: {}\nstderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr),
    );
}

fn stdout_str(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

// ==================== CLI Tests ====================

#[test]
fn test_cli_check_json_and_history() {
    let dir = TempDir::new().unwrap();
    let history = dir.path().join("history.jsonl");
    let history_arg = history.to_str().unwrap();

    let output = run_scheck(&[
        "--format",
        "json",
        "check",
        GITA_CLAIM,
        "--offline",
        "--history",
        history_arg,
    ]);
    assert_success(&output);
    let result: FactCheckResult = serde_json::from_str(&stdout_str(&output)).unwrap();
    assert_eq!(result.verdict, VerdictLabel::Supported);
    assert_eq!(result.retrieval_mode, RetrievalMode::KeywordOnly);

    let output = run_scheck(&["--format", "json", "history", "--history", history_arg]);
    assert_success(&output);
    let listed: Vec<FactCheckResult> = serde_json::from_str(&stdout_str(&output)).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].claim, GITA_CLAIM);
}

#[test]
fn test_cli_check_text() {
    let output = run_scheck(&["check", "Love your enemies"]);
    assert_success(&output);
    let out = stdout_str(&output);
    assert!(out.contains("Verdict: Supported"));
    assert!(out.contains("Matthew 5:44"));
}

#[test]
fn test_cli_refs() {
    let output = run_scheck(&["refs", "Compare Gita 2:47 with Qur'an 2:256."]);
    assert_success(&output);
    let out = stdout_str(&output);
    assert!(out.contains("Bhagavad Gita 2:47"));
    assert!(out.contains("Quran 2:256"));

    let output = run_scheck(&["refs", "nothing to see here"]);
    assert_success(&output);
    assert!(stdout_str(&output).contains("No references found."));
}

#[test]
fn test_cli_classify_json() {
    let output = run_scheck(&["--format", "json", "classify", "The Quran says we should pray"]);
    assert_success(&output);
    let value: serde_json::Value = serde_json::from_str(&stdout_str(&output)).unwrap();
    assert_eq!(value["claim_type"], "mixed");
}

#[test]
fn test_cli_search() {
    let output = run_scheck(&["search", "love enemies", "--offline", "--limit", "2"]);
    assert_success(&output);
    let out = stdout_str(&output);
    assert!(out.contains("Mode: keyword-only"));
    assert!(out.contains("Matthew 5:44"));
}

#[test]
fn test_cli_corpus_from_dir() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("gita.json"),
        r#"[
            {"work": "Bhagavad Gita", "reference": "2:47", "text": "Duty.", "language": "en"},
            {"work": "Bhagavad Gita", "text": "No reference.", "language": "en"}
        ]"#,
    )
    .unwrap();
    let output = run_scheck(&[
        "--format",
        "json",
        "corpus",
        "--corpus",
        dir.path().to_str().unwrap(),
    ]);
    assert_success(&output);
    let value: serde_json::Value = serde_json::from_str(&stdout_str(&output)).unwrap();
    assert_eq!(value["passages"], 1);
    assert_eq!(value["skipped"].as_array().unwrap().len(), 1);
    assert_eq!(value["works"][0]["work"], "Bhagavad Gita");
}

#[test]
fn test_cli_exit_codes() {
    let output = run_scheck(&["check", "   "]);
    assert_eq!(output.status.code(), Some(2));

    let output = run_scheck(&["check", "Love your enemies", "--hint", "poetic"]);
    assert_eq!(output.status.code(), Some(2));

    let dir = TempDir::new().unwrap();
    let bad = dir.path().join("bad.toml");
    std::fs::write(&bad, "citation_limit = 0\n").unwrap();
    let output = run_scheck(&["--config", bad.to_str().unwrap(), "config"]);
    assert_eq!(output.status.code(), Some(3));

    let output = run_scheck(&["corpus", "--corpus", dir.path().join("missing").to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_cli_config_prints_toml() {
    let home = TempDir::new().unwrap();
    let output = run_scheck_in(home.path(), &["config"]);
    assert_success(&output);
    let out = stdout_str(&output);
    assert!(out.starts_with("# defaults ("));
    assert!(out.contains("citation_limit = 3"));
    assert!(out.contains("min_relevance"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_cli_config_names_loaded_default_file() {
    let home = TempDir::new().unwrap();
    let path = home
        .path()
        .join(".config")
        .join("scripture-check")
        .join("config.toml");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "citation_limit = 5\n").unwrap();

    let output = run_scheck_in(home.path(), &["config"]);
    assert_success(&output);
    let out = stdout_str(&output);
    assert!(out.starts_with(&format!("# {}\n", path.display())), "{out}");
    assert!(!out.contains("# defaults"));
    assert!(out.contains("citation_limit = 5"));
}
