//! JSON-lines history of fact-check results.
//!
//! One result per line, appended. The engine never reads this back; it is
//! storage for callers such as the CLI.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::types::{FactCheckResult, ScriptureResult};

/// Append-only history file.
#[derive(Debug, Clone)]
pub struct JsonlHistory {
    path: PathBuf,
}

impl JsonlHistory {
    /// History stored at `path`. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/scripture-check/history.jsonl`.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scripture-check")
            .join("history.jsonl")
    }

    /// The file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one result.
    pub fn append(&self, result: &FactCheckResult) -> ScriptureResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut line = serde_json::to_string(result)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Up to `limit` results, newest first, skipping the `offset` newest.
    ///
    /// A missing file is an empty history. Lines that do not parse are
    /// skipped with a warning.
    pub fn list(&self, limit: usize, offset: usize) -> ScriptureResult<Vec<FactCheckResult>> {
        let all = self.read_all()?;
        Ok(all.into_iter().rev().skip(offset).take(limit).collect())
    }

    /// Number of stored results.
    pub fn len(&self) -> ScriptureResult<usize> {
        Ok(self.read_all()?.len())
    }

    /// Whether nothing is stored yet.
    pub fn is_empty(&self) -> ScriptureResult<bool> {
        Ok(self.len()? == 0)
    }

    fn read_all(&self) -> ScriptureResult<Vec<FactCheckResult>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(fs::File::open(&self.path)?);
        let mut results = Vec::new();
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(result) => results.push(result),
                Err(e) => log::warn!(
                    "skipping history line {} in {}: {e}",
                    number + 1,
                    self.path.display()
                ),
            }
        }
        Ok(results)
    }
}
