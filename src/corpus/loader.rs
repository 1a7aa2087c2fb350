//! Corpus loader: reads JSON record files into passages, skipping bad records.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::types::{Passage, PassageBuilder, ScriptureError, ScriptureResult, MAX_PASSAGE_SIZE};

use super::Corpus;

const BUILTIN_CORPUS: &str = include_str!("../../data/sample_corpus.json");

/// One record as it appears in a source file. Both the canonical shape
/// (`work`, `reference`) and the legacy shapes (`book`, `chapter` + `verse`,
/// `surah` + `ayah`) are accepted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRecord {
    work: Option<String>,
    book: Option<String>,
    reference: Option<String>,
    chapter: Option<Value>,
    verse: Option<Value>,
    surah: Option<Value>,
    ayah: Option<Value>,
    text: Option<String>,
    language: Option<String>,
    translation: Option<String>,
}

/// Outcome of a load: the accepted passages and every skipped record.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Accepted passages in load order. IDs are assigned by [`Corpus`].
    pub passages: Vec<Passage>,
    /// One `MalformedCorpusRecord` per skipped record.
    pub skipped: Vec<ScriptureError>,
    /// Number of source files (or strings) read.
    pub sources: usize,
}

impl LoadReport {
    /// Number of skipped records.
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Consume the report into a corpus.
    pub fn into_corpus(self) -> Corpus {
        Corpus::from_passages(self.passages)
    }
}

/// Accumulates passages from one or more sources.
///
/// A duplicate `(work, reference, language)` is skipped even across files,
/// so the first source to provide a passage wins.
#[derive(Debug, Default)]
pub struct CorpusLoader {
    seen: HashSet<(String, String, String)>,
    report: LoadReport,
}

impl CorpusLoader {
    /// Create an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in sample corpus.
    pub fn builtin() -> LoadReport {
        let mut loader = Self::new();
        if let Err(e) = loader.load_str("builtin", BUILTIN_CORPUS) {
            log::error!("built-in corpus unusable: {e}");
        }
        loader.finish()
    }

    /// Every `*.json` file in `dir`, in file-name order.
    pub fn load_dir(&mut self, dir: &Path) -> ScriptureResult<usize> {
        let mut files: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        let mut accepted = 0;
        for file in &files {
            accepted += self.load_file(file)?;
        }
        Ok(accepted)
    }

    /// One JSON file. Fails only when the file is unreadable or not a JSON array.
    pub fn load_file(&mut self, path: &Path) -> ScriptureResult<usize> {
        let content = std::fs::read_to_string(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.load_str(&name, &content)
    }

    /// Records from a JSON array held in memory. Returns the number accepted.
    pub fn load_str(&mut self, source_name: &str, json: &str) -> ScriptureResult<usize> {
        let records: Vec<Value> = serde_json::from_str(json)?;
        self.report.sources += 1;

        let before = self.report.passages.len();
        for (index, value) in records.into_iter().enumerate() {
            match self.accept(value) {
                Ok(passage) => self.report.passages.push(passage),
                Err(reason) => {
                    log::warn!("skipping record {index} in {source_name}: {reason}");
                    self.report.skipped.push(ScriptureError::MalformedCorpusRecord {
                        source_name: source_name.to_string(),
                        index,
                        reason,
                    });
                }
            }
        }
        let accepted = self.report.passages.len() - before;
        log::info!(
            "loaded {accepted} passages from {source_name} ({} skipped so far)",
            self.report.skipped.len()
        );
        Ok(accepted)
    }

    /// Finish loading.
    pub fn finish(self) -> LoadReport {
        self.report
    }

    fn accept(&mut self, value: Value) -> Result<Passage, String> {
        let raw: RawRecord =
            serde_json::from_value(value).map_err(|e| format!("not a record: {e}"))?;

        let work = required(non_empty(raw.work).or(raw.book), "work")?;
        let reference = match non_empty(raw.reference) {
            Some(reference) => reference,
            None => derive_reference(&raw.chapter, &raw.verse)
                .or_else(|| derive_reference(&raw.surah, &raw.ayah))
                .ok_or_else(|| "missing field 'reference'".to_string())?,
        };
        let text = required(raw.text, "text")?;
        let language = required(raw.language, "language")?;

        if text.len() > MAX_PASSAGE_SIZE {
            return Err(format!(
                "text is {} bytes, limit is {MAX_PASSAGE_SIZE}",
                text.len()
            ));
        }

        let key = (work.to_lowercase(), reference.clone(), language.to_lowercase());
        if !self.seen.insert(key) {
            return Err(format!("duplicate passage {work} {reference} ({language})"));
        }

        let mut builder = PassageBuilder::new(work, reference, text).language(language);
        if let Some(translation) = non_empty(raw.translation) {
            builder = builder.translation(translation);
        }
        Ok(builder.build())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, field: &str) -> Result<String, String> {
    non_empty(value).ok_or_else(|| format!("missing field '{field}'"))
}

/// `chapter` + `verse` given as numbers or numeric strings → `"c:v"`.
fn derive_reference(chapter: &Option<Value>, verse: &Option<Value>) -> Option<String> {
    let chapter = number_like(chapter.as_ref()?)?;
    let verse = number_like(verse.as_ref()?)?;
    Some(format!("{chapter}:{verse}"))
}

fn number_like(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => n.as_u64().map(|n| n.to_string()),
        Value::String(s) => non_empty(Some(s.clone())),
        _ => None,
    }
}
