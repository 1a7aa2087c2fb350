//! Reference extractor: finds scripture citations such as "Bhagavad Gita 2:47"
//! or "surah 2 ayah 255" inside free text.

use std::collections::{BTreeMap, HashSet};

use regex::Regex;
use serde::Serialize;

use crate::types::{ScriptureError, ScriptureResult};

use super::tokenizer::normalize;

/// Built-in alias → canonical work table.
const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("bhagavad gita", "Bhagavad Gita"),
    ("bhagavadgita", "Bhagavad Gita"),
    ("bhagavad-gita", "Bhagavad Gita"),
    ("gita", "Bhagavad Gita"),
    ("geeta", "Bhagavad Gita"),
    ("bg", "Bhagavad Gita"),
    ("quran", "Quran"),
    ("qur'an", "Quran"),
    ("koran", "Quran"),
    ("matthew", "Matthew"),
    ("matt", "Matthew"),
    ("mt", "Matthew"),
    ("john", "John"),
    ("jn", "John"),
    ("genesis", "Genesis"),
    ("gen", "Genesis"),
    ("exodus", "Exodus"),
    ("ex", "Exodus"),
    ("psalms", "Psalms"),
    ("psalm", "Psalms"),
    ("ps", "Psalms"),
    ("dhammapada", "Dhammapada"),
    ("dhp", "Dhammapada"),
    ("guru granth sahib", "Guru Granth Sahib"),
    ("granth sahib", "Guru Granth Sahib"),
    ("sggs", "Guru Granth Sahib"),
];

/// An explicit scripture citation found in text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ScriptureReference {
    /// Canonical work name.
    pub work: String,
    /// The alias as it was written in the text.
    pub alias: String,
    pub chapter: u32,
    pub verse_start: u32,
    /// Last verse of a range; `None` for a single verse.
    pub verse_end: Option<u32>,
}

impl ScriptureReference {
    /// `"2:47"` or `"2:47-48"`.
    pub fn verse_label(&self) -> String {
        match self.verse_end {
            Some(end) => format!("{}:{}-{}", self.chapter, self.verse_start, end),
            None => format!("{}:{}", self.chapter, self.verse_start),
        }
    }

    /// Whether this reference names `chapter:verse`.
    pub fn contains(&self, chapter: u32, verse: u32) -> bool {
        let end = self.verse_end.unwrap_or(self.verse_start);
        self.chapter == chapter && (self.verse_start..=end).contains(&verse)
    }

    fn key(&self) -> (String, u32, u32, Option<u32>) {
        (
            self.work.to_lowercase(),
            self.chapter,
            self.verse_start,
            self.verse_end,
        )
    }
}

impl std::fmt::Display for ScriptureReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.work, self.verse_label())
    }
}

/// Maps work aliases to canonical work names. Lookup is case-insensitive
/// and ignores apostrophes and repeated whitespace.
#[derive(Debug, Clone)]
pub struct AliasTable {
    entries: BTreeMap<String, String>,
}

impl AliasTable {
    /// The built-in table.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for (alias, work) in BUILTIN_ALIASES {
            table.insert(alias, work);
        }
        table
    }

    /// A table with no aliases.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Add or replace an alias.
    pub fn insert(&mut self, alias: &str, work: &str) {
        let key = alias_key(alias);
        if !key.is_empty() && !work.trim().is_empty() {
            self.entries.insert(key, work.trim().to_string());
        }
    }

    /// Merge extra entries (alias → work) over this table.
    pub fn extend<'a>(&mut self, extra: impl IntoIterator<Item = (&'a String, &'a String)>) {
        for (alias, work) in extra {
            self.insert(alias, work);
        }
    }

    /// Resolve an alias as written in text.
    pub fn canonical(&self, alias: &str) -> Option<&str> {
        self.entries.get(&alias_key(alias)).map(String::as_str)
    }

    /// `(alias, canonical work)` pairs in alias order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(alias, work)| (alias.as_str(), work.as_str()))
    }

    /// Number of aliases.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every token that appears in some alias or canonical work name.
    pub fn tokens(&self) -> HashSet<String> {
        self.entries
            .iter()
            .flat_map(|(alias, work)| normalize(alias).into_iter().chain(normalize(work)))
            .collect()
    }

    /// Regex alternation over all aliases, longest first.
    fn pattern(&self) -> String {
        let mut aliases: Vec<&String> = self.entries.keys().collect();
        aliases.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        aliases
            .iter()
            .map(|alias| alias_pattern(alias))
            .collect::<Vec<_>>()
            .join("|")
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn alias_key(alias: &str) -> String {
    alias
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .replace(['\'', '\u{2019}'], "")
}

fn alias_pattern(alias: &str) -> String {
    // keys have apostrophes stripped, so "quran" must also match "qur'an"
    let chars: Vec<char> = alias.chars().collect();
    let mut out = String::new();
    for (i, ch) in chars.iter().enumerate() {
        if *ch == ' ' {
            out.push_str(r"\s+");
            continue;
        }
        out.push_str(&regex::escape(&ch.to_string()));
        if i + 1 < chars.len() && chars[i + 1] != ' ' {
            out.push_str("['\u{2019}]?");
        }
    }
    out
}

/// Extracts explicit references using an alias table and numeric patterns.
pub struct ReferenceExtractor {
    aliases: AliasTable,
    /// `<alias> <chapter>:<verse>[-<verse>]`, also with `.` as separator.
    numeric: Option<Regex>,
    /// `<alias> [chapter] <chapter> verse <verse>`.
    spelled: Option<Regex>,
    /// `surah <n> ayah <m>`.
    surah: Option<Regex>,
}

impl ReferenceExtractor {
    /// Build an extractor over the given alias table.
    pub fn new(aliases: AliasTable) -> ScriptureResult<Self> {
        let (numeric, spelled) = if aliases.is_empty() {
            (None, None)
        } else {
            let alt = aliases.pattern();
            let numeric = format!(
                r"(?i)\b({alt})\.?\s*([0-9]{{1,3}})\s*[:.]\s*([0-9]{{1,3}})(?:\s*[-–]\s*([0-9]{{1,3}}))?\b"
            );
            let spelled = format!(
                r"(?i)\b({alt})\s+(?:chapter\s+)?([0-9]{{1,3}})\s*,?\s*(?:verses?|v\.?)\s*([0-9]{{1,3}})(?:\s*(?:-|–|to)\s*([0-9]{{1,3}}))?\b"
            );
            (Some(compile(&numeric)?), Some(compile(&spelled)?))
        };
        let surah = compile(
            r"(?i)\b(?:surah|sura)\s+([0-9]{1,3})\s*,?\s*(?:ayah|ayat|aya|verse)\s+([0-9]{1,3})(?:\s*[-–]\s*([0-9]{1,3}))?\b",
        )?;
        Ok(Self {
            aliases,
            numeric,
            spelled,
            surah: Some(surah),
        })
    }

    /// Extractor over the built-in alias table.
    pub fn builtin() -> Self {
        match Self::new(AliasTable::builtin()) {
            Ok(extractor) => extractor,
            Err(e) => {
                log::error!("built-in reference patterns failed to compile: {e}");
                Self {
                    aliases: AliasTable::empty(),
                    numeric: None,
                    spelled: None,
                    surah: None,
                }
            }
        }
    }

    /// The alias table in use.
    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Extract references in first-seen order, duplicates collapsed.
    /// Numbers without a recognized work alias are ignored.
    pub fn extract(&self, text: &str) -> Vec<ScriptureReference> {
        let mut found: Vec<(usize, ScriptureReference)> = Vec::new();

        for regex in [&self.numeric, &self.spelled].into_iter().flatten() {
            for caps in regex.captures_iter(text) {
                let (Some(whole), Some(alias)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                let Some(work) = self.aliases.canonical(alias.as_str()) else {
                    continue;
                };
                if let Some(reference) = build_reference(
                    work,
                    alias.as_str(),
                    caps.get(2).map(|m| m.as_str()),
                    caps.get(3).map(|m| m.as_str()),
                    caps.get(4).map(|m| m.as_str()),
                ) {
                    found.push((whole.start(), reference));
                }
            }
        }

        let quran = self.aliases.canonical("quran").unwrap_or("Quran");
        for caps in self.surah.iter().flat_map(|re| re.captures_iter(text)) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if let Some(reference) = build_reference(
                quran,
                "surah",
                caps.get(1).map(|m| m.as_str()),
                caps.get(2).map(|m| m.as_str()),
                caps.get(3).map(|m| m.as_str()),
            ) {
                found.push((whole.start(), reference));
            }
        }

        found.sort_by_key(|(start, _)| *start);

        let mut seen = HashSet::new();
        found
            .into_iter()
            .filter(|(_, r)| seen.insert(r.key()))
            .map(|(_, r)| r)
            .collect()
    }
}

fn compile(pattern: &str) -> ScriptureResult<Regex> {
    Regex::new(pattern)
        .map_err(|e| ScriptureError::InvalidConfig(format!("reference pattern: {e}")))
}

fn build_reference(
    work: &str,
    alias: &str,
    chapter: Option<&str>,
    verse: Option<&str>,
    verse_end: Option<&str>,
) -> Option<ScriptureReference> {
    let chapter: u32 = chapter?.parse().ok()?;
    let verse_start: u32 = verse?.parse().ok()?;
    if chapter == 0 || verse_start == 0 {
        return None;
    }
    let verse_end = verse_end
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|&end| end > verse_start);
    Some(ScriptureReference {
        work: work.to_string(),
        alias: alias.split_whitespace().collect::<Vec<_>>().join(" "),
        chapter,
        verse_start,
        verse_end,
    })
}
