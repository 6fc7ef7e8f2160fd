//! Symptom knowledge base.
//!
//! Loaded once at startup from a JSON object keyed by canonical symptom name:
//!
//! ```json
//! {
//!   "chest pain": {
//!     "response": "Please seek emergency care.",
//!     "urgency": "high",
//!     "aliases": ["chest tightness", "pain in my chest"]
//!   }
//! }
//! ```
//!
//! Document order is preserved because it decides how the matcher breaks
//! ties and resolves alias collisions.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

use super::normalize::normalize;
use crate::error::AppError;

/// Fields of a well-formed entry. Every field is optional in the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SymptomDetails {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub urgency: Option<String>,
    #[serde(default)]
    pub aliases: Option<Vec<String>>,
}

/// One knowledge-base value.
///
/// Anything that is not an object with correctly typed fields is kept as
/// `Malformed` so that its canonical key still matches; it simply has no
/// urgency and no response.
#[derive(Debug, Clone, PartialEq)]
pub enum SymptomEntry {
    Structured(SymptomDetails),
    Malformed(Value),
}

impl SymptomEntry {
    pub fn new(response: Option<&str>, urgency: Option<&str>, aliases: &[&str]) -> Self {
        SymptomEntry::Structured(SymptomDetails {
            response: response.map(str::to_string),
            urgency: urgency.map(str::to_string),
            aliases: Some(aliases.iter().map(|a| a.to_string()).collect()),
        })
    }

    fn from_value(key: &str, value: Value) -> Self {
        if !value.is_object() {
            warn!("Knowledge base entry '{}' is not an object; treating it as malformed", key);
            return SymptomEntry::Malformed(value);
        }

        match serde_json::from_value::<SymptomDetails>(value.clone()) {
            Ok(details) => SymptomEntry::Structured(details),
            Err(e) => {
                warn!("Knowledge base entry '{}' is malformed: {}", key, e);
                SymptomEntry::Malformed(value)
            }
        }
    }

    /// Canned response, if present and not blank.
    pub fn response(&self) -> Option<&str> {
        match self {
            SymptomEntry::Structured(details) => details
                .response
                .as_deref()
                .filter(|r| !r.trim().is_empty()),
            SymptomEntry::Malformed(_) => None,
        }
    }

    /// Raw urgency label as written in the source.
    pub fn urgency(&self) -> Option<&str> {
        match self {
            SymptomEntry::Structured(details) => details.urgency.as_deref(),
            SymptomEntry::Malformed(_) => None,
        }
    }

    pub fn aliases(&self) -> &[String] {
        match self {
            SymptomEntry::Structured(details) => details.aliases.as_deref().unwrap_or(&[]),
            SymptomEntry::Malformed(_) => &[],
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, SymptomEntry::Malformed(_))
    }
}

/// A normalized phrase claimed by more than one canonical key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasCollision {
    pub normalized: String,
    /// Claimants in registration order; the last one wins at match time.
    pub canonical_keys: Vec<String>,
}

/// Immutable, ordered mapping from canonical symptom key to entry.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: Vec<(String, SymptomEntry)>,
    positions: HashMap<String, usize>,
}

impl KnowledgeBase {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a base from `(key, entry)` pairs in order.
    ///
    /// Blank keys are skipped; a repeated key replaces the earlier entry in place.
    pub fn from_entries<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, SymptomEntry)>,
    {
        let mut kb = Self::empty();
        for (key, entry) in entries {
            kb.insert(key.into(), entry);
        }
        kb
    }

    fn insert(&mut self, key: String, entry: SymptomEntry) {
        if key.trim().is_empty() {
            warn!("Skipping knowledge base entry with an empty canonical key");
            return;
        }
        match self.positions.get(&key) {
            Some(&idx) => self.entries[idx].1 = entry,
            None => {
                self.positions.insert(key.clone(), self.entries.len());
                self.entries.push((key, entry));
            }
        }
    }

    /// Parses a knowledge base document.
    pub fn from_json_str(source: &str) -> Result<Self, AppError> {
        let document: Value = serde_json::from_str(source)
            .map_err(|e| AppError::KnowledgeBaseLoad(format!("invalid JSON: {}", e)))?;

        let Value::Object(map) = document else {
            return Err(AppError::KnowledgeBaseLoad(
                "top-level value must be an object keyed by symptom name".to_string(),
            ));
        };

        Ok(Self::from_entries(
            map.into_iter()
                .map(|(key, value)| {
                    let entry = SymptomEntry::from_value(&key, value);
                    (key, entry)
                })
                .collect::<Vec<_>>(),
        ))
    }

    /// Reads and parses the knowledge base at `path`.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let source = fs::read_to_string(path)
            .map_err(|e| AppError::KnowledgeBaseLoad(format!("{}: {}", path.display(), e)))?;
        let kb = Self::from_json_str(&source).map_err(|e| match e {
            AppError::KnowledgeBaseLoad(msg) => AppError::KnowledgeBaseLoad(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;

        info!("Loaded {} symptom entries from {:?}", kb.len(), path);
        for collision in kb.alias_collisions() {
            warn!(
                "Phrase '{}' is claimed by {:?}; '{}' wins",
                collision.normalized,
                collision.canonical_keys,
                collision.canonical_keys.last().map(String::as_str).unwrap_or_default()
            );
        }
        Ok(kb)
    }

    /// Like [`KnowledgeBase::load`], but degrades to an empty base.
    ///
    /// The error is logged and handed back so the caller can surface it; every
    /// lookup against the empty base is a no-match.
    pub fn load_or_empty(path: &Path) -> (Self, Option<AppError>) {
        match Self::load(path) {
            Ok(kb) => (kb, None),
            Err(e) => {
                error!("{}. Continuing with an empty knowledge base", e);
                (Self::empty(), Some(e))
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&SymptomEntry> {
        self.positions.get(key).map(|&idx| &self.entries[idx].1)
    }

    /// Entries in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SymptomEntry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Normalized phrases registered by more than one canonical key.
    pub fn alias_collisions(&self) -> Vec<AliasCollision> {
        let mut claims: Vec<AliasCollision> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (key, entry) in self.iter() {
            let phrases = std::iter::once(key).chain(entry.aliases().iter().map(String::as_str));
            for phrase in phrases {
                let normalized = normalize(phrase);
                if normalized.is_empty() {
                    continue;
                }
                let slot = *index.entry(normalized.clone()).or_insert_with(|| {
                    claims.push(AliasCollision {
                        normalized,
                        canonical_keys: Vec::new(),
                    });
                    claims.len() - 1
                });
                let keys = &mut claims[slot].canonical_keys;
                if !keys.iter().any(|k| k == key) {
                    keys.push(key.to_string());
                }
            }
        }

        claims.retain(|c| c.canonical_keys.len() > 1);
        claims
    }
}
