//! Entity and keyword analysis
//!
//! Keyword policy: punctuation stripped, lowercased, stop words removed, and
//! only words longer than 3 characters kept. Keywords keep first-seen order.

use std::collections::{BTreeSet, HashSet};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Minimum keyword length is exclusive: a keyword must be longer than this
pub const MIN_KEYWORD_CHARS: usize = 3;

/// Analysis error types
#[non_exhaustive]
#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalysisError {
    /// The analysis backend is not available
    #[error("Analyzer unavailable: {0}")]
    Unavailable(String),
    /// The backend failed on this input
    #[error("Analysis failed: {0}")]
    Failed(String),
}

/// Entities and keywords extracted from one text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextAnalysis {
    /// Case-normalized named entities
    pub entities: BTreeSet<String>,
    /// Case-normalized keywords in first-seen order, no duplicates
    pub keywords: Vec<String>,
}

/// Entity/keyword extraction capability
pub trait TextAnalyzer: Send + Sync {
    /// Analyze one text
    fn analyze(&self, text: &str) -> Result<TextAnalysis, AnalysisError>;
}

// ============================================================================
// HEURISTIC ANALYZER
// ============================================================================

/// Rule-based analyzer for English journal text
///
/// Entities are capitalized words that do not open a sentence ("Sam" in
/// "Went hiking with Sam"), lowercased. Keywords follow the module policy.
#[derive(Debug, Clone, Default)]
pub struct HeuristicAnalyzer;

impl HeuristicAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl TextAnalyzer for HeuristicAnalyzer {
    fn analyze(&self, text: &str) -> Result<TextAnalysis, AnalysisError> {
        let mut analysis = TextAnalysis::default();
        let mut seen_keywords: HashSet<String> = HashSet::new();
        let mut sentence_start = true;

        for raw in text.split_whitespace() {
            let word = trim_token(raw);
            let ends_sentence = closes_sentence(raw);

            if word.is_empty() {
                sentence_start = sentence_start || ends_sentence;
                continue;
            }

            let lower = word.to_lowercase();
            let stop = is_stop_word(&lower);

            let capitalized = word.chars().next().is_some_and(char::is_uppercase);
            if capitalized && !sentence_start && !stop && lower.chars().count() >= 2 {
                analysis.entities.insert(lower.clone());
            }

            if !stop
                && lower.chars().count() > MIN_KEYWORD_CHARS
                && seen_keywords.insert(lower.clone())
            {
                analysis.keywords.push(lower);
            }

            sentence_start = ends_sentence;
        }

        Ok(analysis)
    }
}

/// Strip leading/trailing punctuation, keeping inner apostrophes and hyphens
fn trim_token(raw: &str) -> &str {
    raw.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Whether a raw token ends a sentence ("joined." / "really?!" / "done.)")
fn closes_sentence(raw: &str) -> bool {
    raw.trim_end_matches(['"', '\'', ')', ']', '”', '’'])
        .ends_with(['.', '!', '?'])
}

/// Lowercased words with surrounding punctuation removed
pub(crate) fn normalized_words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(trim_token)
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

// ============================================================================
// STOP WORDS
// ============================================================================

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "aren't", "as", "at", "be", "because", "been", "before", "being", "below", "between",
    "both", "but", "by", "can", "can't", "could", "couldn't", "did", "didn't", "do", "does",
    "doesn't", "doing", "don't", "down", "during", "each", "even", "ever", "every", "few", "for",
    "from", "further", "get", "got", "had", "hadn't", "has", "hasn't", "have", "haven't",
    "having", "he", "he'd", "he'll", "he's", "her", "here", "here's", "hers", "herself", "him",
    "himself", "his", "how", "how's", "i", "i'd", "i'll", "i'm", "i've", "if", "in", "into",
    "is", "isn't", "it", "it's", "its", "itself", "just", "let's", "like", "me", "more", "most",
    "much", "must", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once", "one",
    "only", "or", "other", "ought", "our", "ours", "ourselves", "out", "over", "own", "really",
    "same", "shan't", "she", "she'd", "she'll", "she's", "should", "shouldn't", "so", "some",
    "still", "such", "than", "that", "that's", "the", "their", "theirs", "them", "themselves",
    "then", "there", "there's", "these", "they", "they'd", "they'll", "they're", "they've",
    "this", "those", "through", "to", "today", "too", "under", "until", "up", "very", "was",
    "wasn't", "we", "we'd", "we'll", "we're", "we've", "were", "weren't", "what", "what's",
    "when", "when's", "where", "where's", "which", "while", "who", "who's", "whom", "why",
    "why's", "will", "with", "won't", "would", "wouldn't", "yesterday", "you", "you'd",
    "you'll", "you're", "you've", "your", "yours", "yourself", "yourselves",
];

fn stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

/// Whether a lowercased word is on the fixed stop-word list
pub fn is_stop_word(word: &str) -> bool {
    stop_words().contains(word)
}

// ============================================================================
// TESTS
// ============================================================================
