//! Triage Tests
//!
//! Matching properties and behaviour over realistic knowledge bases.

use crate::triage::evaluator::evaluate;
use crate::triage::knowledge_base::KnowledgeBase;
use crate::triage::matcher::{match_symptom, MatchKind, MatchResult, DEFAULT_MATCH_THRESHOLD};
use crate::triage::normalize::normalize;
use crate::triage::risk::{classify, Urgency};

// ============================================================================
// Test Fixtures
// ============================================================================

const SAMPLE_KB: &str = r#"{
    "chest pain": {
        "urgency": "high",
        "response": "Please seek emergency care.",
        "aliases": ["tight chest", "chest pressure"]
    },
    "headache": {
        "urgency": "low",
        "response": "I'm sorry you have a headache. Rest and drink water, and see a provider if it persists.",
        "aliases": ["migraine", "head hurts"]
    },
    "shortness of breath": {
        "urgency": "HIGH",
        "response": "Please seek emergency care immediately.",
        "aliases": ["cant breathe"]
    },
    "sore throat": {
        "urgency": "low",
        "response": "Warm fluids can help. Contact a provider if it lasts more than a week."
    },
    "rash": {
        "response": "Keep the area clean."
    }
}"#;

fn sample_kb() -> KnowledgeBase {
    KnowledgeBase::from_json_str(SAMPLE_KB).expect("sample knowledge base parses")
}

fn awkward_inputs() -> Vec<&'static str> {
    vec![
        "",
        "   ",
        "!!!",
        "?.,;:",
        "chest pain",
        "CHEST PAIN!!!",
        "I have chest pain",
        "chestpain",
        "héadache",
        "头痛",
        "zzz unrelated text",
        "\t\n",
        "a",
    ]
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_normalize_is_idempotent() {
    for input in awkward_inputs()
        .into_iter()
        .chain(["  Mixed   CASE\twith\npunctuation!?", "ÉCOLE d'été", "x-ray / CT"])
    {
        let once = normalize(input);
        assert_eq!(normalize(&once), once, "not idempotent for {:?}", input);
    }
}

#[test]
fn test_operations_are_total() {
    let kb = sample_kb();
    let empty = KnowledgeBase::empty();

    for input in awkward_inputs() {
        let _ = match_symptom(input, &kb, DEFAULT_MATCH_THRESHOLD);
        let _ = match_symptom(input, &empty, DEFAULT_MATCH_THRESHOLD);
        let _ = classify(input, &kb);
        let _ = evaluate(input);
    }
}

#[test]
fn test_punctuation_only_input_is_no_match() {
    let kb = sample_kb();
    for input in ["", "   ", "!!!", "?.,;:"] {
        assert_eq!(match_symptom(input, &kb, 0.0), MatchResult::NoMatch, "input {:?}", input);
    }
}

#[test]
fn test_alias_equivalence() {
    let kb = sample_kb();
    for (key, entry) in kb.iter() {
        for alias in entry.aliases() {
            let result = match_symptom(alias, &kb, DEFAULT_MATCH_THRESHOLD);
            assert_eq!(result.canonical_key(), Some(key), "alias {:?}", alias);
            assert_eq!(result.kind(), Some(MatchKind::Alias), "alias {:?}", alias);
        }
    }
}

#[test]
fn test_threshold_monotonicity() {
    let kb = sample_kb();
    let thresholds = [0.0, 0.2, 0.4, 0.6, 0.8, 0.95, 1.0, 1.01];

    for input in awkward_inputs()
        .into_iter()
        .chain(["chest pian", "head hurt", "sore throaat", "rush"])
    {
        let mut seen_no_match = false;
        for threshold in thresholds {
            let matched = match_symptom(input, &kb, threshold).is_match();
            if seen_no_match {
                assert!(!matched, "{:?} matched again at threshold {}", input, threshold);
            }
            seen_no_match |= !matched;
        }
    }
}

#[test]
fn test_matching_is_deterministic() {
    let kb = sample_kb();
    for input in ["chest pian", "migrane", "zzz unrelated text", "sore"] {
        let first = match_symptom(input, &kb, DEFAULT_MATCH_THRESHOLD);
        for _ in 0..10 {
            assert_eq!(match_symptom(input, &kb, DEFAULT_MATCH_THRESHOLD), first);
        }
        // A rebuilt knowledge base gives the same answer
        assert_eq!(match_symptom(input, &sample_kb(), DEFAULT_MATCH_THRESHOLD), first);
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_exact_key_is_direct_match_with_high_urgency() {
    let kb = KnowledgeBase::from_json_str(
        r#"{"chest pain": {"urgency": "high", "response": "Please seek emergency care."}}"#,
    )
    .unwrap();

    let result = match_symptom("chest pain", &kb, DEFAULT_MATCH_THRESHOLD);
    assert_eq!(
        result,
        MatchResult::Matched {
            canonical_key: "chest pain".to_string(),
            kind: MatchKind::Direct,
            score: 1.0,
        }
    );
    assert_eq!(classify("chest pain", &kb).as_str(), "HIGH");
}

#[test]
fn test_missing_space_matches_by_similarity() {
    let kb = KnowledgeBase::from_json_str(
        r#"{"chest pain": {"urgency": "high", "response": "Please seek emergency care."}}"#,
    )
    .unwrap();

    let result = match_symptom("chestpain", &kb, DEFAULT_MATCH_THRESHOLD);
    assert_eq!(result.canonical_key(), Some("chest pain"));
    let score = result.score().unwrap();
    assert!(score < 1.0 && score >= DEFAULT_MATCH_THRESHOLD, "score {}", score);
}

#[test]
fn test_unrelated_text_does_not_match() {
    let kb = sample_kb();
    let result = match_symptom("zzz unrelated text", &kb, DEFAULT_MATCH_THRESHOLD);
    assert_eq!(result, MatchResult::NoMatch);
}

#[test]
fn test_model_response_passes_every_check() {
    let checklist = evaluate("I'm sorry you're dealing with this. Please seek care from a provider.");
    assert!(checklist.safe);
    assert!(checklist.empathetic);
    assert!(checklist.avoided_diagnosis);
    assert!(checklist.escalation_offered);
    assert!(checklist.clarity);
    assert!(checklist.all_passed());
}

#[test]
fn test_empty_knowledge_base_never_matches() {
    let kb = KnowledgeBase::empty();
    for input in awkward_inputs() {
        assert_eq!(match_symptom(input, &kb, 0.0), MatchResult::NoMatch);
    }
}

#[test]
fn test_entry_without_urgency_classifies_unknown() {
    let kb = sample_kb();
    let result = match_symptom("rash", &kb, DEFAULT_MATCH_THRESHOLD);
    assert_eq!(result.canonical_key(), Some("rash"));
    assert_eq!(classify("rash", &kb), Urgency::Unknown);
    assert!(!classify("headache", &kb).is_high());
    assert!(classify("shortness of breath", &kb).is_high());
}

#[test]
fn test_case_and_punctuation_are_ignored() {
    let kb = sample_kb();
    let result = match_symptom("  CHEST, PAIN!!! ", &kb, DEFAULT_MATCH_THRESHOLD);
    assert_eq!(result.canonical_key(), Some("chest pain"));
    assert_eq!(result.score(), Some(1.0));
}
