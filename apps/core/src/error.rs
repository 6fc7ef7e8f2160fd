use std::io;
use thiserror::Error;

use crate::actors::messages::ActorError;

/// Application-wide error type, consolidating all possible errors into a single enum.
#[derive(Debug, Error)]
pub enum AppError {
    /// The symptom knowledge base could not be read or parsed.
    ///
    /// Callers of `KnowledgeBase::load_or_empty` recover from this by continuing
    /// with an empty base.
    #[error("Knowledge base load error: {0}")]
    KnowledgeBaseLoad(String),

    /// The external text generator failed, timed out or was cancelled.
    #[error("Response generation error: {0}")]
    ResponseGeneration(String),

    /// Represents errors specific to the actor system, such as communication failures.
    #[error("Actor error: {0}")]
    Actor(#[from] ActorError),

    /// Represents standard input/output errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Represents data validation errors (e.g., invalid input format).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Represents configuration-related errors (e.g., missing environment variables).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Represents errors from operations that did not complete in time.
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl AppError {
    /// True for the per-turn generation failure that callers must record as a failed turn.
    pub fn is_generation_failure(&self) -> bool {
        matches!(self, AppError::ResponseGeneration(_))
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        match self {
            AppError::KnowledgeBaseLoad(s) => AppError::KnowledgeBaseLoad(s.clone()),
            AppError::ResponseGeneration(s) => AppError::ResponseGeneration(s.clone()),
            AppError::Actor(e) => AppError::Actor(e.clone()),
            AppError::Io(e) => AppError::Io(io::Error::new(e.kind(), e.to_string())),
            AppError::Validation(s) => AppError::Validation(s.clone()),
            AppError::Config(s) => AppError::Config(s.clone()),
            AppError::Timeout(s) => AppError::Timeout(s.clone()),
        }
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        AppError::Timeout(format!("Operation timed out: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON error: {}", err))
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Config(format!("URL parse error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Config(format!("Validation errors: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Actor(ActorError::LlmError(format!("HTTP error: {}", err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_failure_is_distinct() {
        let err = AppError::ResponseGeneration("upstream 500".to_string());
        assert!(err.is_generation_failure());
        assert!(err.to_string().contains("upstream 500"));

        let err = AppError::KnowledgeBaseLoad("missing".to_string());
        assert!(!err.is_generation_failure());
    }

    #[test]
    fn test_clone_preserves_io_kind() {
        let err = AppError::Io(io::Error::new(io::ErrorKind::NotFound, "gone"));
        match err.clone() {
            AppError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("Expected Io, got {:?}", other),
        }
    }
}
