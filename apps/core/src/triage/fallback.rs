//! Response policy for inputs that match nothing in the knowledge base.
//!
//! The reply is delegated to the text-generation collaborator under a fixed,
//! constrained prompt. Its urgency is always `LOW/MODERATE`: generated text is
//! never parsed for severity.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use super::evaluator::MAX_CLEAR_WORDS;
use super::risk::Urgency;
use crate::actors::traits::LlmActor;
use crate::error::AppError;

/// Prompt sent to the generator; `{symptom}` is the raw user text.
pub fn build_fallback_prompt(user_input: &str) -> String {
    format!(
        "A person describes the following symptom or concern:\n\
         \"{symptom}\"\n\n\
         Reply as a virtual triage assistant:\n\
         - Do not diagnose and do not name possible conditions.\n\
         - If the symptom could be serious, recommend contacting a healthcare provider or emergency services.\n\
         - Be empathetic and use plain language.\n\
         - Keep the reply under {max_words} words.",
        symptom = user_input.trim(),
        max_words = MAX_CLEAR_WORDS,
    )
}

/// Delegates unmatched inputs to the generator.
pub struct FallbackPolicy<L: LlmActor> {
    llm: Arc<L>,
    system_prompt: String,
    temperature: f32,
    timeout: Duration,
}

impl<L: LlmActor> FallbackPolicy<L> {
    pub fn new(llm: Arc<L>, system_prompt: String, temperature: f32, timeout: Duration) -> Self {
        Self {
            llm,
            system_prompt,
            temperature,
            timeout,
        }
    }

    /// Urgency of every fallback turn.
    pub fn urgency(&self) -> Urgency {
        Urgency::Conservative
    }

    /// Generates a reply for `user_input`.
    ///
    /// Timeout, cancellation, transport errors and blank replies all surface as
    /// `AppError::ResponseGeneration`. No retries.
    #[instrument(skip(self, cancel))]
    pub async fn respond(&self, user_input: &str, cancel: &CancellationToken) -> Result<String, AppError> {
        let prompt = build_fallback_prompt(user_input);
        let call = self
            .llm
            .generate_with_params(prompt, Some(self.system_prompt.clone()), Some(self.temperature));

        let reply = tokio::select! {
            result = timeout(self.timeout, call) => match result {
                Ok(Ok(text)) => text,
                Ok(Err(e)) => {
                    warn!("Fallback generation failed: {}", e);
                    return Err(AppError::ResponseGeneration(e.to_string()));
                }
                Err(_) => {
                    warn!("Fallback generation timed out after {:?}", self.timeout);
                    return Err(AppError::ResponseGeneration(format!(
                        "no reply within {:?}",
                        self.timeout
                    )));
                }
            },
            _ = cancel.cancelled() => {
                info!("Fallback generation cancelled by caller");
                return Err(AppError::ResponseGeneration("cancelled".to_string()));
            }
        };

        let reply = reply.trim();
        if reply.is_empty() {
            return Err(AppError::ResponseGeneration("generator returned an empty reply".to_string()));
        }
        Ok(reply.to_string())
    }
}
