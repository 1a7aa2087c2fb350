//! Tokenizer / normalizer shared by keyword matching, classification and
//! the local embedder.
//!
//! Tokens are maximal runs of non-whitespace, non-punctuation characters,
//! lowercased with full Unicode case mapping. Combining marks (Devanagari
//! vowel signs and virama, Arabic harakat, Hebrew niqqud) are kept inside
//! their token, so non-Latin scripts come through intact.

/// English stop words. Excluded from scoring, never from stored text.
const STOPWORDS_EN: &[&str] = &[
    "a", "about", "all", "also", "am", "an", "and", "any", "are", "arent", "as", "at", "be",
    "because", "been", "but", "by", "can", "cannot", "cant", "could", "did", "didnt", "do",
    "does", "doesnt", "dont", "for", "from", "had", "has", "have", "he", "her", "him", "his",
    "how", "i", "if", "in", "into", "is", "isnt", "it", "its", "just", "me", "my", "neither",
    "never", "no", "none", "nor", "not", "nothing", "of", "on", "or", "our", "over", "shall",
    "she", "so", "than", "that", "the", "their", "them", "then", "there", "these", "they",
    "this", "those", "thou", "thy", "thee", "to", "unto", "upon", "us", "was", "wasnt", "we",
    "were", "werent", "what", "when", "where", "which", "who", "whom", "why", "will", "with",
    "without", "wont", "would", "ye", "you", "your",
];

/// Hindi stop words (postpositions, copulas, pronouns).
const STOPWORDS_HI: &[&str] = &[
    "और", "का", "की", "के", "है", "हैं", "था", "थे", "में", "से", "को", "यह", "वह", "पर", "एक",
    "भी", "तो", "ही", "न", "नहीं", "मत", "कि",
];

/// Tokens that flip the polarity of the terms that follow them.
pub const NEGATION_CUES: &[&str] = &[
    "not", "no", "never", "dont", "doesnt", "didnt", "isnt", "arent", "wasnt", "werent",
    "cannot", "cant", "wont", "shouldnt", "nor", "neither", "none", "nothing", "nobody",
    "without", "नहीं", "न", "मत", "لا", "لم", "לא",
];

/// Split text into lowercase tokens, stripping punctuation and collapsing whitespace.
///
/// Apostrophes are removed rather than treated as separators, so contractions
/// stay one token ("don't" → "dont").
pub fn normalize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if is_apostrophe(ch) {
            continue;
        }
        if ch.is_whitespace() || is_punctuation(ch) {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            current.extend(ch.to_lowercase());
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn is_apostrophe(ch: char) -> bool {
    matches!(ch, '\'' | '\u{2018}' | '\u{2019}' | '\u{02BC}')
}

fn is_punctuation(ch: char) -> bool {
    if ch.is_ascii_punctuation() {
        return true;
    }
    matches!(
        ch as u32,
        0x00A1 | 0x00A7 | 0x00AB | 0x00B6 | 0x00B7 | 0x00BB | 0x00BF
            | 0x2010..=0x2027
            | 0x2030..=0x205E
            | 0x3000..=0x303F
            | 0xFF01..=0xFF0F
            | 0xFF1A..=0xFF20
    ) || matches!(
        ch,
        // danda, double danda
        '\u{0964}' | '\u{0965}'
        // Arabic comma, semicolon, question mark, full stop
        | '\u{060C}' | '\u{061B}' | '\u{061F}' | '\u{06D4}'
        // Hebrew maqaf, paseq, sof pasuq, gershayim
        | '\u{05BE}' | '\u{05C0}' | '\u{05C3}' | '\u{05F4}'
    )
}

/// Stop-word table for a language tag (`"en"`, `"en-US"`, `"hi"`...).
/// Unknown languages have no stop words.
pub fn stopwords(language: &str) -> &'static [&'static str] {
    let primary = language
        .split(['-', '_'])
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    match primary.as_str() {
        "en" | "" => STOPWORDS_EN,
        "hi" => STOPWORDS_HI,
        _ => &[],
    }
}

/// Whether `token` is a stop word in `language`.
pub fn is_stopword(token: &str, language: &str) -> bool {
    stopwords(language).contains(&token)
}

/// Whether `token` negates what follows it.
pub fn is_negation(token: &str) -> bool {
    NEGATION_CUES.contains(&token)
}

/// Tokens that carry content: not stop words, not negation cues.
pub fn content_tokens<'a>(tokens: &'a [String], language: &str) -> Vec<&'a str> {
    tokens
        .iter()
        .map(String::as_str)
        .filter(|t| !is_stopword(t, language) && !is_negation(t))
        .collect()
}

/// Whether the token at `position` falls within `window` tokens after a negation cue.
pub fn is_negated_at(tokens: &[String], position: usize, window: usize) -> bool {
    let end = position.min(tokens.len());
    let start = end.saturating_sub(window);
    tokens[start..end].iter().any(|t| is_negation(t))
}
