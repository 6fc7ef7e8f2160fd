//! # Triage Module
//!
//! Symptom triage for SymSafe. Maps free-text symptom descriptions onto a
//! curated knowledge base and falls back to a constrained generator when
//! nothing matches.
//!
//! ## Components
//! - `knowledge_base`: symptom entries loaded from JSON
//! - `normalize`: canonical text form used for matching
//! - `similarity`: Ratcliff/Obershelp similarity ratio
//! - `matcher`: direct, alias and fuzzy matching
//! - `risk`: urgency classification of matched entries
//! - `fallback`: generation policy for unmatched inputs
//! - `evaluator`: lexical safety checklist
//! - `red_flags`: advisory emergency-phrase scan
//! - `review`: optional narrative review by the generator
//! - `outcome`: per-turn output and audit records
//! - `pipeline`: main orchestrator

pub mod evaluator;
pub mod fallback;
pub mod knowledge_base;
pub mod matcher;
pub mod normalize;
pub mod outcome;
pub mod pipeline;
pub mod red_flags;
pub mod review;
pub mod risk;
pub mod similarity;

pub use evaluator::{EvaluationChecklist, ResponseEvaluator};
pub use knowledge_base::{KnowledgeBase, SymptomEntry};
pub use matcher::{match_symptom, MatchKind, MatchResult, SymptomMatcher};
pub use outcome::{Assessment, InteractionRecord, TurnOutcome, TurnResponse};
pub use pipeline::{PipelineOptions, TriagePipeline};
pub use risk::{classify, Urgency};
