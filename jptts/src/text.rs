//! Sentence segmentation for chunked synthesis.

use once_cell::sync::Lazy;
use regex::Regex;

/// Characters that end a sentence.
const TERMINATORS: &[char] = &['。', '.', '！', '？', '!', '?', '\n', '\r'];

/// Terminators dropped from the end of a sentence. Question and exclamation
/// marks are kept since engines use them for intonation.
const PERIODS: &[char] = &['。', '.'];

/// Anything outside letters, numbers, punctuation and separators.
static UNSUPPORTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}\p{P}\p{Z}]").expect("valid unsupported-char pattern"));

/// Splits text into sentence units, one synthesis call each.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextProcessor;

impl TextProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Splits `text` into cleaned sentences in input order.
    pub fn process_text(&self, text: &str) -> Vec<String> {
        process_text(text)
    }
}

/// Splits `text` into cleaned sentences in input order.
///
/// Empty input yields an empty vector.
pub fn process_text(text: &str) -> Vec<String> {
    split_sentences(text)
        .into_iter()
        .filter_map(clean_fragment)
        .map(|s| remove_unsupported_chars(s).trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Removes characters engines cannot read (emoji, control characters, ...).
pub fn remove_unsupported_chars(text: &str) -> String {
    UNSUPPORTED.replace_all(text, "").into_owned()
}

/// Splits after each run of terminators. Fragments keep their terminators.
fn split_sentences(text: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut fragments = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        if !is_sentence_boundary(&chars, i) {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        while j < chars.len() && is_sentence_boundary(&chars, j) {
            j += 1;
        }
        let end = chars.get(j).map_or(text.len(), |&(idx, _)| idx);
        fragments.push(&text[start..end]);
        start = end;
        i = j;
    }

    if start < text.len() {
        fragments.push(&text[start..]);
    }
    fragments
}

fn is_sentence_boundary(chars: &[(usize, char)], idx: usize) -> bool {
    let c = chars[idx].1;
    if c == '.' {
        // 3.14
        let prev = idx.checked_sub(1).map(|i| chars[i].1);
        let next = chars.get(idx + 1).map(|&(_, c)| c);
        let is_digit = |c: Option<char>| c.is_some_and(|c| c.is_ascii_digit());
        return !(is_digit(prev) && is_digit(next));
    }
    TERMINATORS.contains(&c)
}

/// Trims a fragment and drops its trailing periods. Returns None for
/// fragments that are empty or made only of terminators.
fn clean_fragment(fragment: &str) -> Option<&str> {
    let trimmed = fragment.trim();
    if trimmed.chars().all(|c| TERMINATORS.contains(&c)) {
        return None;
    }
    let trimmed = trimmed.trim_end_matches(PERIODS).trim_end();
    (!trimmed.is_empty()).then_some(trimmed)
}
