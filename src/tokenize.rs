//! Query and text normalization.
//!
//! Text is lower-cased, then split into maximal runs of word characters
//! (Unicode alphanumerics plus `_`). Runs of three or more characters are
//! kept; shorter runs are dropped. The length floor stands in for a
//! stop-word list, so "a", "is" and "of" disappear, and so do
//! meaningful two-letter terms like "ai" or "ui".

use std::collections::HashSet;

/// Tokens shorter than this many characters are discarded.
pub const MIN_TOKEN_CHARS: usize = 3;

/// Extract the set of significant lower-cased tokens from `text`.
///
/// ```rust
/// use clip_scout::tokenize::significant_tokens;
///
/// let tokens = significant_tokens("Top 10 AI Tools (2024)!");
/// assert!(tokens.contains("tools"));
/// assert!(!tokens.contains("ai"));
/// ```
pub fn significant_tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !is_word_char(c))
        .filter(|word| word.chars().count() >= MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}

/// Number of tokens two sets share.
pub fn overlap(a: &HashSet<String>, b: &HashSet<String>) -> usize {
    a.intersection(b).count()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
