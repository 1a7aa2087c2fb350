//! Text processing: tokenization and reference extraction.

pub mod references;
pub mod tokenizer;

pub use references::{AliasTable, ReferenceExtractor, ScriptureReference};
pub use tokenizer::{content_tokens, is_negated_at, is_negation, is_stopword, normalize, stopwords};
