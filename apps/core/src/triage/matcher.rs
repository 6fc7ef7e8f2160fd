//! Alias-aware fuzzy matching of user input against canonical symptom keys.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use super::knowledge_base::KnowledgeBase;
use super::normalize::normalize;
use super::similarity::ratio;

/// Minimum similarity ratio for a match unless the caller says otherwise.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.6;

/// How the winning candidate was registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// The canonical key itself
    Direct,
    /// One of the entry's aliases
    Alias,
}

impl MatchKind {
    pub fn label(&self) -> &'static str {
        match self {
            MatchKind::Direct => "direct",
            MatchKind::Alias => "alias",
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of matching one input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchResult {
    Matched {
        canonical_key: String,
        kind: MatchKind,
        /// Similarity ratio of the winning candidate
        score: f64,
    },
    NoMatch,
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Matched { .. })
    }

    pub fn canonical_key(&self) -> Option<&str> {
        match self {
            MatchResult::Matched { canonical_key, .. } => Some(canonical_key),
            MatchResult::NoMatch => None,
        }
    }

    pub fn kind(&self) -> Option<MatchKind> {
        match self {
            MatchResult::Matched { kind, .. } => Some(*kind),
            MatchResult::NoMatch => None,
        }
    }

    pub fn score(&self) -> Option<f64> {
        match self {
            MatchResult::Matched { score, .. } => Some(*score),
            MatchResult::NoMatch => None,
        }
    }

    /// `direct`, `alias` or `no_match`.
    pub fn kind_label(&self) -> &'static str {
        self.kind().map(|k| k.label()).unwrap_or("no_match")
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    normalized: String,
    canonical_key: String,
    kind: MatchKind,
}

/// Candidate index over a knowledge base.
///
/// Built once per knowledge base. Registration walks the entries in source
/// order, adding the canonical key then its aliases. A phrase registered twice
/// keeps the slot of its first registration but points at the last
/// registrant. Blank phrases are never registered.
#[derive(Debug, Clone, Default)]
pub struct SymptomMatcher {
    candidates: Vec<Candidate>,
    slots: HashMap<String, usize>,
}

impl SymptomMatcher {
    pub fn new(knowledge_base: &KnowledgeBase) -> Self {
        let mut matcher = Self::default();

        for (key, entry) in knowledge_base.iter() {
            matcher.register(key, key, MatchKind::Direct);
            for alias in entry.aliases() {
                matcher.register(alias, key, MatchKind::Alias);
            }
        }

        debug!("Built symptom index with {} candidates", matcher.candidates.len());
        matcher
    }

    fn register(&mut self, phrase: &str, canonical_key: &str, kind: MatchKind) {
        let normalized = normalize(phrase);
        if normalized.is_empty() {
            return;
        }

        let candidate = Candidate {
            normalized: normalized.clone(),
            canonical_key: canonical_key.to_string(),
            kind,
        };

        match self.slots.get(&normalized) {
            Some(&slot) => self.candidates[slot] = candidate,
            None => {
                self.slots.insert(normalized, self.candidates.len());
                self.candidates.push(candidate);
            }
        }
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Normalizes `input` and matches it.
    pub fn match_input(&self, input: &str, threshold: f64) -> MatchResult {
        self.match_normalized(&normalize(input), threshold)
    }

    /// Matches an already-normalized query.
    ///
    /// The best candidate scoring at least `threshold` wins; equal scores go to
    /// the candidate registered first.
    pub fn match_normalized(&self, query: &str, threshold: f64) -> MatchResult {
        // A NaN threshold would admit every fuzzy candidate
        if query.is_empty() || threshold.is_nan() {
            return MatchResult::NoMatch;
        }

        // An exact phrase scores 1.0, which no other (distinct) candidate can reach
        if let Some(&slot) = self.slots.get(query) {
            if 1.0 >= threshold {
                return self.result_for(slot, 1.0);
            }
            return MatchResult::NoMatch;
        }

        let mut best: Option<(usize, f64)> = None;
        for (slot, candidate) in self.candidates.iter().enumerate() {
            let score = ratio(&candidate.normalized, query);
            if score < threshold {
                continue;
            }
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((slot, score));
            }
        }

        match best {
            Some((slot, score)) => {
                debug!(
                    query,
                    candidate = %self.candidates[slot].normalized,
                    score,
                    "Fuzzy match"
                );
                self.result_for(slot, score)
            }
            None => {
                debug!(query, threshold, "No candidate above threshold");
                MatchResult::NoMatch
            }
        }
    }

    fn result_for(&self, slot: usize, score: f64) -> MatchResult {
        let candidate = &self.candidates[slot];
        MatchResult::Matched {
            canonical_key: candidate.canonical_key.clone(),
            kind: candidate.kind,
            score,
        }
    }
}

/// One-shot form: builds the index for `knowledge_base` and matches `user_input`.
pub fn match_symptom(user_input: &str, knowledge_base: &KnowledgeBase, threshold: f64) -> MatchResult {
    SymptomMatcher::new(knowledge_base).match_input(user_input, threshold)
}
