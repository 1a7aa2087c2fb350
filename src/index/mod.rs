//! Retrieval indexes. Both are built once from the corpus and read-only afterwards.

pub mod keyword_index;
pub mod vector_index;

pub use keyword_index::{KeywordIndex, KeywordMatcher};
pub use vector_index::{cosine_similarity, VectorIndex};
