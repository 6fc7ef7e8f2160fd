//! Per-turn output structures.

use chrono::{DateTime, Local};
use serde::Serialize;
use uuid::Uuid;

use super::evaluator::EvaluationChecklist;
use super::matcher::{MatchKind, MatchResult};
use super::risk::Urgency;
use crate::error::AppError;

/// Shown in place of a response when a matched entry has none.
pub const NO_CONTENT_SENTINEL: &str = "[no content available for this symptom]";

/// Pure, synchronous part of a turn: everything decided before any response
/// is produced.
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub timestamp: DateTime<Local>,
    pub user_input: String,
    pub normalized_input: String,
    pub match_result: MatchResult,
    pub urgency: Urgency,
    pub red_flags: Vec<String>,
}

/// The response presented for a turn, tagged by where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "text", rename_all = "snake_case")]
pub enum TurnResponse {
    /// Canned response of the matched entry
    KnowledgeBase(String),
    /// The matched entry has no response
    NoContent,
    /// Produced by the fallback generator
    Generated(String),
    /// Generation failed; holds the error message, never a fabricated reply
    Failed(String),
}

impl TurnResponse {
    pub fn source_label(&self) -> &'static str {
        match self {
            TurnResponse::KnowledgeBase(_) => "knowledge_base",
            TurnResponse::NoContent => "no_content",
            TurnResponse::Generated(_) => "generated",
            TurnResponse::Failed(_) => "failed",
        }
    }

    /// Text handed to the evaluator: `None` for failed turns, empty for `NoContent`.
    pub fn evaluable_text(&self) -> Option<&str> {
        match self {
            TurnResponse::KnowledgeBase(text) | TurnResponse::Generated(text) => Some(text),
            TurnResponse::NoContent => Some(""),
            TurnResponse::Failed(_) => None,
        }
    }

    /// Text to show or log.
    pub fn display_text(&self) -> &str {
        match self {
            TurnResponse::KnowledgeBase(text) | TurnResponse::Generated(text) => text,
            TurnResponse::NoContent => NO_CONTENT_SENTINEL,
            TurnResponse::Failed(error) => error,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TurnResponse::Failed(_))
    }
}

/// A completed turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub assessment: Assessment,
    pub response: TurnResponse,
    pub evaluation: Option<EvaluationChecklist>,
    /// Narrative review from the generator, when enabled
    pub review: Option<String>,
    pub processing_time_ms: u64,
}

impl TurnOutcome {
    pub fn urgency(&self) -> &Urgency {
        &self.assessment.urgency
    }

    pub fn match_result(&self) -> &MatchResult {
        &self.assessment.match_result
    }

    /// Get a summary for logging
    pub fn summary(&self) -> String {
        format!(
            "Match: {} ({}), Urgency: {}, Source: {}, Checklist: {}/5, Red flags: {}",
            self.assessment.match_result.canonical_key().unwrap_or("-"),
            self.assessment.match_result.kind_label(),
            self.assessment.urgency,
            self.response.source_label(),
            self.evaluation.map(|c| c.passed_count()).unwrap_or(0),
            self.assessment.red_flags.len(),
        )
    }
}

/// Audit record for one turn. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct InteractionRecord {
    pub session_id: Uuid,
    pub timestamp: DateTime<Local>,
    pub user_input: String,
    /// `None` for no-match turns
    pub match_kind: Option<MatchKind>,
    pub matched_key: Option<String>,
    pub similarity: Option<f64>,
    pub urgency_label: String,
    pub response: TurnResponse,
    pub evaluation: Option<EvaluationChecklist>,
    pub red_flags: Vec<String>,
    pub review: Option<String>,
}

impl InteractionRecord {
    fn from_assessment(session_id: Uuid, assessment: &Assessment, response: TurnResponse) -> Self {
        Self {
            session_id,
            timestamp: assessment.timestamp,
            user_input: assessment.user_input.clone(),
            match_kind: assessment.match_result.kind(),
            matched_key: assessment.match_result.canonical_key().map(str::to_string),
            similarity: assessment.match_result.score(),
            urgency_label: assessment.urgency.as_str().to_string(),
            response,
            evaluation: None,
            red_flags: assessment.red_flags.clone(),
            review: None,
        }
    }

    pub fn from_outcome(session_id: Uuid, outcome: &TurnOutcome) -> Self {
        Self {
            evaluation: outcome.evaluation,
            review: outcome.review.clone(),
            ..Self::from_assessment(session_id, &outcome.assessment, outcome.response.clone())
        }
    }

    /// Record for a turn whose response could not be produced.
    pub fn failed(session_id: Uuid, assessment: &Assessment, error: &AppError) -> Self {
        Self::from_assessment(session_id, assessment, TurnResponse::Failed(error.to_string()))
    }

    pub fn match_kind_label(&self) -> &'static str {
        self.match_kind.map(|k| k.label()).unwrap_or("no_match")
    }
}
