//! Urgency derivation from a matched knowledge-base entry.

use serde::{Serialize, Serializer};
use std::fmt;

use super::knowledge_base::KnowledgeBase;

pub const UNKNOWN_LABEL: &str = "UNKNOWN";
pub const CONSERVATIVE_LABEL: &str = "LOW/MODERATE";

/// Urgency attached to a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Urgency {
    /// Label taken from the knowledge base, uppercased (`HIGH`, `LOW`, `MODERATE`, ...)
    Labeled(String),
    /// The entry exists but carries no usable label, or the key is unknown
    Unknown,
    /// Fixed label for generated fallback responses
    Conservative,
}

impl Urgency {
    pub fn as_str(&self) -> &str {
        match self {
            Urgency::Labeled(label) => label,
            Urgency::Unknown => UNKNOWN_LABEL,
            Urgency::Conservative => CONSERVATIVE_LABEL,
        }
    }

    pub fn is_high(&self) -> bool {
        matches!(self, Urgency::Labeled(label) if label == "HIGH")
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Urgency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Uppercased urgency of `matched_key`, or `Urgency::Unknown` when the key is
/// absent, the entry is malformed, or the label is missing or blank.
pub fn classify(matched_key: &str, knowledge_base: &KnowledgeBase) -> Urgency {
    knowledge_base
        .get(matched_key)
        .and_then(|entry| entry.urgency())
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(|label| Urgency::Labeled(label.to_uppercase()))
        .unwrap_or(Urgency::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kb() -> KnowledgeBase {
        KnowledgeBase::from_json_str(
            r#"{
                "chest pain": { "urgency": "high" },
                "headache": { "urgency": " Moderate " },
                "cough": { "response": "Drink warm fluids." },
                "rash": [1, 2, 3],
                "itch": { "urgency": "" }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_label_is_uppercased() {
        assert_eq!(classify("chest pain", &kb()), Urgency::Labeled("HIGH".to_string()));
        assert_eq!(classify("headache", &kb()).as_str(), "MODERATE");
        assert!(classify("chest pain", &kb()).is_high());
    }

    #[test]
    fn test_unknown_cases() {
        let kb = kb();
        assert_eq!(classify("cough", &kb), Urgency::Unknown);
        assert_eq!(classify("rash", &kb), Urgency::Unknown);
        assert_eq!(classify("itch", &kb), Urgency::Unknown);
        assert_eq!(classify("not in base", &kb), Urgency::Unknown);
        assert_eq!(classify("", &kb), Urgency::Unknown);
        assert_eq!(classify("anything", &KnowledgeBase::empty()).as_str(), "UNKNOWN");
    }

    #[test]
    fn test_conservative_label() {
        assert_eq!(Urgency::Conservative.to_string(), "LOW/MODERATE");
        assert!(!Urgency::Conservative.is_high());
    }

    #[test]
    fn test_serializes_as_label() {
        assert_eq!(serde_json::to_string(&Urgency::Conservative).unwrap(), "\"LOW/MODERATE\"");
        assert_eq!(serde_json::to_string(&Urgency::Labeled("HIGH".into())).unwrap(), "\"HIGH\"");
    }
}
