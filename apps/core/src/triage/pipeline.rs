//! Triage Pipeline - orchestrates one turn end to end.
//!
//! ```text
//! input -> normalize -> match -> { classify | fallback generation } -> evaluate
//! ```
//!
//! The work is split in two so callers can record failed turns:
//! 1. `assess`: normalization, matching, urgency and red flags (pure, no I/O)
//! 2. `respond`: picks or generates the response and evaluates it

use chrono::Local;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use super::evaluator::ResponseEvaluator;
use super::fallback::FallbackPolicy;
use super::knowledge_base::KnowledgeBase;
use super::matcher::{MatchResult, SymptomMatcher, DEFAULT_MATCH_THRESHOLD};
use super::normalize::normalize;
use super::outcome::{Assessment, TurnOutcome, TurnResponse};
use super::red_flags::RedFlagScanner;
use super::review::ResponseReviewer;
use super::risk::classify;
use crate::actors::traits::LlmActor;
use crate::config::{TriageConfig, DEFAULT_GENERATION_TIMEOUT_SECS, DEFAULT_SYSTEM_PROMPT, DEFAULT_TEMPERATURE};
use crate::error::AppError;

/// Tunables for a pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub match_threshold: f64,
    pub system_prompt: String,
    pub temperature: f32,
    pub generation_timeout: Duration,
    pub review_enabled: bool,
    pub learning_mode: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            generation_timeout: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
            review_enabled: false,
            learning_mode: false,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &TriageConfig, system_prompt: String) -> Self {
        Self {
            match_threshold: config.match_threshold,
            system_prompt,
            temperature: config.llm.temperature,
            generation_timeout: config.generation_timeout(),
            review_enabled: config.review_enabled,
            learning_mode: config.learning_mode,
        }
    }
}

/// Matching, classification, fallback and evaluation over a fixed knowledge base.
pub struct TriagePipeline<L: LlmActor> {
    knowledge_base: Arc<KnowledgeBase>,
    matcher: SymptomMatcher,
    red_flags: RedFlagScanner,
    evaluator: ResponseEvaluator,
    fallback: FallbackPolicy<L>,
    reviewer: Option<ResponseReviewer<L>>,
    threshold: f64,
}

impl<L: LlmActor> TriagePipeline<L> {
    pub fn new(knowledge_base: Arc<KnowledgeBase>, llm: Arc<L>, options: PipelineOptions) -> Self {
        let matcher = SymptomMatcher::new(&knowledge_base);
        let reviewer = options.review_enabled.then(|| {
            ResponseReviewer::new(llm.clone(), options.learning_mode, options.generation_timeout)
        });
        let fallback = FallbackPolicy::new(
            llm,
            options.system_prompt,
            options.temperature,
            options.generation_timeout,
        );

        Self {
            knowledge_base,
            matcher,
            red_flags: RedFlagScanner::new(),
            evaluator: ResponseEvaluator::new(),
            fallback,
            reviewer,
            threshold: options.match_threshold,
        }
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge_base
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Normalizes, matches, classifies and scans `user_input`.
    #[instrument(skip(self))]
    pub fn assess(&self, user_input: &str) -> Assessment {
        let normalized_input = normalize(user_input);
        let match_result = self.matcher.match_normalized(&normalized_input, self.threshold);

        let urgency = match &match_result {
            MatchResult::Matched { canonical_key, .. } => classify(canonical_key, &self.knowledge_base),
            MatchResult::NoMatch => self.fallback.urgency(),
        };

        Assessment {
            timestamp: Local::now(),
            user_input: user_input.to_string(),
            normalized_input,
            match_result,
            urgency,
            red_flags: self.red_flags.scan(user_input),
        }
    }

    /// Produces and evaluates the response for an assessed turn.
    ///
    /// A generation failure is returned as `AppError::ResponseGeneration` and
    /// is not evaluated; record it with `InteractionRecord::failed`.
    #[instrument(skip(self, assessment, cancel), fields(input = %assessment.user_input))]
    pub async fn respond(&self, assessment: &Assessment, cancel: &CancellationToken) -> Result<TurnOutcome, AppError> {
        let start = Instant::now();

        let response = match assessment.match_result.canonical_key() {
            Some(key) => match self.knowledge_base.get(key).and_then(|entry| entry.response()) {
                Some(text) => TurnResponse::KnowledgeBase(text.to_string()),
                None => TurnResponse::NoContent,
            },
            None => TurnResponse::Generated(self.fallback.respond(&assessment.user_input, cancel).await?),
        };

        let evaluation = response.evaluable_text().map(|text| self.evaluator.evaluate(text));

        let review = match (&self.reviewer, &response) {
            (Some(reviewer), TurnResponse::KnowledgeBase(text) | TurnResponse::Generated(text)) => {
                Some(reviewer.review(&assessment.user_input, text, cancel).await)
            }
            _ => None,
        };

        let outcome = TurnOutcome {
            assessment: assessment.clone(),
            response,
            evaluation,
            review,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        info!("{}", outcome.summary());
        Ok(outcome)
    }

    /// `assess` followed by `respond`.
    pub async fn process_turn(&self, user_input: &str, cancel: &CancellationToken) -> Result<TurnOutcome, AppError> {
        let assessment = self.assess(user_input);
        self.respond(&assessment, cancel).await
    }
}
