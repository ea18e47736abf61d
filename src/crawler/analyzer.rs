//! Word frequency analysis for crawled page text
//!
//! Tokenizes cleaned page text, filters stop words and non-alphabetic
//! tokens, and computes frequency statistics used for both per-page
//! reporting and the crawl-wide `word_frequencies` table.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

const MIN_WORD_LENGTH: usize = 2;
const MAX_WORD_LENGTH: usize = 50;
const RARE_WORD_THRESHOLD: u64 = 1;
const TOP_WORDS_LIMIT: usize = 50;
const RARE_WORDS_LIMIT: usize = 100;

/// Common English stop words excluded from analysis by default
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is",
    "it", "its", "of", "on", "that", "the", "to", "was", "will", "with", "this", "but", "they",
    "have", "had", "what", "said", "each", "which", "she", "do", "how", "their", "if", "up",
    "out", "many", "then", "them", "these", "so", "some", "her", "would", "make", "like",
    "into", "him", "time", "two", "more", "go", "no", "way", "could", "my", "than", "first",
    "been", "call", "who", "oil", "sit", "now", "find", "down", "day", "did", "get", "come",
    "made", "may", "part",
];

fn stop_word_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

/// Results of analyzing a page's text
#[derive(Debug, Clone, Default)]
pub struct WordAnalysis {
    pub word_frequencies: HashMap<String, u64>,
    pub total_words: u64,
    pub unique_words: u64,
    pub average_word_length: f64,
    pub top_words: Vec<(String, u64)>,
    pub word_length_distribution: HashMap<usize, u64>,
    pub stopword_count: u64,
    pub rare_words: Vec<String>,
}

/// Tokenizes text into lowercase alphabetic words
///
/// Splits on any non-ASCII-alphabetic boundary, matching the `\b[a-zA-Z]+\b`
/// pattern used upstream, then applies the length bound.
fn tokenize(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        if ch.is_ascii_alphabetic() {
            current.push(ch.to_ascii_lowercase());
        } else if !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .into_iter()
        .filter(|w| w.len() >= MIN_WORD_LENGTH && w.len() <= MAX_WORD_LENGTH)
        .collect()
}

/// Analyzes text and returns word-frequency statistics
///
/// # Arguments
///
/// * `text` - Cleaned page text (see [`crate::crawler::parser`])
/// * `include_stopwords` - Whether stop words count towards the analysis
/// * `max_words` - Hard cap on tokens considered, applied after tokenizing
pub fn analyze_text(text: &str, include_stopwords: bool, max_words: usize) -> WordAnalysis {
    if text.is_empty() {
        return WordAnalysis::default();
    }

    let stop_words = stop_word_set();
    let mut words = tokenize(text);
    if words.len() > max_words {
        words.truncate(max_words);
    }

    if !include_stopwords {
        words.retain(|w| !stop_words.contains(w.as_str()));
    }

    if words.is_empty() {
        return WordAnalysis::default();
    }

    let mut word_frequencies: HashMap<String, u64> = HashMap::new();
    let mut word_length_distribution: HashMap<usize, u64> = HashMap::new();
    let mut stopword_count = 0u64;
    let mut total_length = 0usize;

    for word in &words {
        *word_frequencies.entry(word.clone()).or_insert(0) += 1;
        *word_length_distribution.entry(word.len()).or_insert(0) += 1;
        total_length += word.len();
        if stop_words.contains(word.as_str()) {
            stopword_count += 1;
        }
    }

    let total_words = words.len() as u64;
    let unique_words = word_frequencies.len() as u64;
    let average_word_length = total_length as f64 / total_words as f64;

    let mut top_words: Vec<(String, u64)> = word_frequencies
        .iter()
        .map(|(w, c)| (w.clone(), *c))
        .collect();
    top_words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_words.truncate(TOP_WORDS_LIMIT);

    let mut rare_words: Vec<String> = word_frequencies
        .iter()
        .filter(|(_, &count)| count <= RARE_WORD_THRESHOLD)
        .map(|(w, _)| w.clone())
        .collect();
    rare_words.sort();
    rare_words.truncate(RARE_WORDS_LIMIT);

    WordAnalysis {
        word_frequencies,
        total_words,
        unique_words,
        average_word_length,
        top_words,
        word_length_distribution,
        stopword_count,
        rare_words,
    }
}

/// Merges per-page top words into a running crawl-wide tally
///
/// Returns the top `limit` entries from a frequency map, ties broken alphabetically
pub fn top_n(frequencies: &HashMap<String, u64>, limit: usize) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = frequencies.iter().map(|(w, c)| (w.clone(), *c)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(limit);
    entries
}
