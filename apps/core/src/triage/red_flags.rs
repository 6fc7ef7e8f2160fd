//! Red-flag phrase scan over raw user input.
//!
//! Advisory only: hits are surfaced to the user and recorded, but never change
//! the urgency assigned by the classifier or the fallback policy.

use regex::Regex;
use std::sync::LazyLock;

/// Phrases that warrant an emergency-care reminder whatever the match outcome.
///
/// Matched case-insensitively on word boundaries, with an optional plural
/// suffix on the last word ("chest pains"). Longer words that merely start
/// with a phrase ("chest painting") do not match.
pub const RED_FLAG_PHRASES: &[&str] = &[
    "chest pain",
    "shortness of breath",
    "confusion",
    "vision loss",
    "difficulty speaking",
];

// NOTE: expect() is acceptable here, the pattern is built from constant phrases
static RED_FLAG_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    RED_FLAG_PHRASES
        .iter()
        .map(|phrase| {
            let words: Vec<String> = phrase.split_whitespace().map(regex::escape).collect();
            let pattern = format!(r"(?i)\b{}(?:s|es)?\b", words.join(r"\s+"));
            (*phrase, Regex::new(&pattern).expect("Invalid regex: red flag phrase"))
        })
        .collect()
});

/// Scans input for red-flag phrases.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedFlagScanner;

impl RedFlagScanner {
    pub fn new() -> Self {
        Self
    }

    /// Red-flag phrases present in `text`, in `RED_FLAG_PHRASES` order.
    pub fn scan(&self, text: &str) -> Vec<String> {
        RED_FLAG_PATTERNS
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(phrase, _)| phrase.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_phrases_case_insensitively() {
        let scanner = RedFlagScanner::new();
        assert_eq!(scanner.scan("I have CHEST   pain since noon"), vec!["chest pain"]);
        assert_eq!(
            scanner.scan("Sudden confusion and shortness of breath"),
            vec!["shortness of breath", "confusion"]
        );
    }

    #[test]
    fn test_word_boundaries() {
        let scanner = RedFlagScanner::new();
        assert!(scanner.scan("chest painting class").is_empty());
        assert!(scanner.scan("confusional").is_empty());
    }

    #[test]
    fn test_plural_forms_are_flagged() {
        let scanner = RedFlagScanner::new();
        assert_eq!(scanner.scan("sharp chest pains since lunch"), vec!["chest pain"]);
        assert_eq!(scanner.scan("episodes of vision losses"), vec!["vision loss"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(RedFlagScanner::new().scan("").is_empty());
    }
}
