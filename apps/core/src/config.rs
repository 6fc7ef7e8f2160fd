//! Runtime configuration.
//!
//! Everything the pipeline needs from the outside world (paths, credentials,
//! thresholds) is collected here once, in `main`, and handed to constructors.
//! Nothing below this module reads the environment.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;
use validator::Validate;

use crate::error::AppError;
use crate::fs_manager::PortablePathManager;
use crate::triage::matcher::DEFAULT_MATCH_THRESHOLD;

pub const DEFAULT_LLM_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Used when `prompts/base_prompt.txt` is missing.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are SymSafe, a virtual triage assistant. \
You are not a doctor and you never diagnose. Respond with empathy, keep answers short and plain, \
and recommend contacting a healthcare provider or emergency services whenever a symptom could be serious.";

/// Settings for the OpenAI-compatible chat-completions backend.
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct LlmSettings {
    /// Base URL, e.g. `https://api.openai.com/v1`. `/chat/completions` is appended.
    #[validate(url)]
    pub endpoint: String,
    #[validate(length(min = 1))]
    pub model: String,
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,
    /// Upper bound on a single HTTP completion request.
    #[serde(default = "default_request_timeout_secs")]
    #[validate(range(min = 1, max = 600))]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl LlmSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_LLM_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            temperature: DEFAULT_TEMPERATURE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Top-level configuration for a triage session.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TriageConfig {
    pub knowledge_base_path: PathBuf,
    pub system_prompt_path: PathBuf,
    pub log_dir: PathBuf,
    /// Minimum similarity ratio for a fuzzy match.
    #[validate(range(min = 0.0, max = 1.0))]
    pub match_threshold: f64,
    #[validate(range(min = 1, max = 600))]
    pub generation_timeout_secs: u64,
    /// Prompt for `(input, correction)` pairs after each turn.
    pub learning_mode: bool,
    /// Ask the generator for a narrative review of every response.
    pub review_enabled: bool,
    #[validate(nested)]
    pub llm: LlmSettings,
}

impl TriageConfig {
    /// Defaults for an installation rooted at `paths`.
    pub fn with_paths(paths: &PortablePathManager) -> Self {
        Self {
            knowledge_base_path: paths.knowledge_base_path(),
            system_prompt_path: paths.system_prompt_path(),
            log_dir: paths.logs_dir(),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            generation_timeout_secs: DEFAULT_GENERATION_TIMEOUT_SECS,
            learning_mode: false,
            review_enabled: false,
            llm: LlmSettings::default(),
        }
    }

    /// Defaults overlaid with `SYMSAFE_*` and `OPENAI_API_KEY` environment variables.
    ///
    /// Call `dotenv::dotenv()` beforehand to pick up a `.env` file.
    pub fn from_env(paths: &PortablePathManager) -> Result<Self, AppError> {
        let mut config = Self::with_paths(paths);

        if let Some(path) = env_var("SYMSAFE_KB_PATH") {
            config.knowledge_base_path = PathBuf::from(path);
        }
        if let Some(path) = env_var("SYMSAFE_PROMPT_PATH") {
            config.system_prompt_path = PathBuf::from(path);
        }
        if let Some(path) = env_var("SYMSAFE_LOG_DIR") {
            config.log_dir = PathBuf::from(path);
        }
        if let Some(threshold) = env_parse::<f64>("SYMSAFE_THRESHOLD")? {
            config.match_threshold = threshold;
        }
        if let Some(secs) = env_parse::<u64>("SYMSAFE_TIMEOUT_SECS")? {
            config.generation_timeout_secs = secs;
        }
        if let Some(secs) = env_parse::<u64>("SYMSAFE_REQUEST_TIMEOUT_SECS")? {
            config.llm.request_timeout_secs = secs;
        }
        if let Some(endpoint) = env_var("SYMSAFE_LLM_ENDPOINT") {
            config.llm.endpoint = endpoint;
        }
        if let Some(model) = env_var("SYMSAFE_MODEL") {
            config.llm.model = model;
        }
        config.llm.api_key = env_var("OPENAI_API_KEY");

        Ok(config)
    }

    /// Runs the declarative checks and converts failures into `AppError::Config`.
    pub fn check(&self) -> Result<(), AppError> {
        // NaN passes range checks
        if !self.match_threshold.is_finite() {
            return Err(AppError::Config(format!(
                "match_threshold must be a finite number, got {}",
                self.match_threshold
            )));
        }
        if !self.llm.temperature.is_finite() {
            return Err(AppError::Config(format!(
                "temperature must be a finite number, got {}",
                self.llm.temperature
            )));
        }
        self.validate()?;
        Ok(())
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Reads the system prompt file, falling back to the built-in prompt.
    pub fn load_system_prompt(&self) -> String {
        match fs::read_to_string(&self.system_prompt_path) {
            Ok(prompt) if !prompt.trim().is_empty() => prompt.trim().to_string(),
            Ok(_) => {
                warn!("System prompt {:?} is empty, using built-in prompt", self.system_prompt_path);
                DEFAULT_SYSTEM_PROMPT.to_string()
            }
            Err(e) => {
                warn!(
                    "Could not read system prompt {:?}: {}. Using built-in prompt",
                    self.system_prompt_path, e
                );
                DEFAULT_SYSTEM_PROMPT.to_string()
            }
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_parse<T>(name: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    env_var(name)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| AppError::Config(format!("{} has invalid value '{}': {}", name, raw, e)))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ALL_VARS: [&str; 9] = [
        "SYMSAFE_KB_PATH",
        "SYMSAFE_PROMPT_PATH",
        "SYMSAFE_LOG_DIR",
        "SYMSAFE_THRESHOLD",
        "SYMSAFE_TIMEOUT_SECS",
        "SYMSAFE_REQUEST_TIMEOUT_SECS",
        "SYMSAFE_LLM_ENDPOINT",
        "SYMSAFE_MODEL",
        "OPENAI_API_KEY",
    ];

    fn cleared<F: FnOnce()>(f: F) {
        let vars: Vec<(&str, Option<&str>)> = ALL_VARS.iter().map(|v| (*v, None)).collect();
        temp_env::with_vars(vars, f);
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = TriageConfig::with_paths(&PortablePathManager::new("/opt/symsafe"));

        assert!(config.check().is_ok());
        assert_eq!(config.match_threshold, 0.6);
        assert_eq!(config.knowledge_base_path, PathBuf::from("/opt/symsafe/data/symptoms.json"));
        assert!(!config.learning_mode);
    }

    #[test]
    fn test_from_env_overrides() {
        cleared(|| {
            temp_env::with_vars(
                [
                    ("SYMSAFE_THRESHOLD", Some("0.75")),
                    ("SYMSAFE_MODEL", Some("gpt-4o-mini")),
                    ("OPENAI_API_KEY", Some("sk-test")),
                    ("SYMSAFE_KB_PATH", Some("/tmp/kb.json")),
                ],
                || {
                    let config = TriageConfig::from_env(&PortablePathManager::new("/opt/symsafe")).unwrap();
                    assert_eq!(config.match_threshold, 0.75);
                    assert_eq!(config.llm.model, "gpt-4o-mini");
                    assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
                    assert_eq!(config.knowledge_base_path, PathBuf::from("/tmp/kb.json"));
                },
            );
        });
    }

    #[test]
    fn test_from_env_rejects_unparsable_threshold() {
        cleared(|| {
            temp_env::with_var("SYMSAFE_THRESHOLD", Some("high"), || {
                let result = TriageConfig::from_env(&PortablePathManager::new("/opt/symsafe"));
                match result {
                    Err(AppError::Config(msg)) => assert!(msg.contains("SYMSAFE_THRESHOLD")),
                    other => panic!("Expected Config error, got {:?}", other),
                }
            });
        });
    }

    #[test]
    fn test_out_of_range_threshold_fails_validation() {
        let mut config = TriageConfig::with_paths(&PortablePathManager::new("/opt/symsafe"));
        config.match_threshold = 1.5;
        assert!(matches!(config.check(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_nan_threshold_is_rejected() {
        let mut config = TriageConfig::with_paths(&PortablePathManager::new("/opt/symsafe"));
        config.match_threshold = f64::NAN;
        match config.check() {
            Err(AppError::Config(msg)) => assert!(msg.contains("match_threshold")),
            other => panic!("Expected Config error, got {:?}", other),
        }

        config.match_threshold = 0.6;
        config.llm.temperature = f32::NAN;
        assert!(matches!(config.check(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_nan_threshold_from_env_is_rejected() {
        cleared(|| {
            temp_env::with_var("SYMSAFE_THRESHOLD", Some("NaN"), || {
                let config = TriageConfig::from_env(&PortablePathManager::new("/opt/symsafe")).unwrap();
                assert!(config.check().is_err());
            });
        });
    }

    #[test]
    fn test_request_timeout_from_env() {
        cleared(|| {
            temp_env::with_var("SYMSAFE_REQUEST_TIMEOUT_SECS", Some("15"), || {
                let config = TriageConfig::from_env(&PortablePathManager::new("/opt/symsafe")).unwrap();
                assert_eq!(config.llm.request_timeout(), Duration::from_secs(15));
                assert!(config.check().is_ok());
            });
        });
    }

    #[test]
    fn test_invalid_endpoint_fails_validation() {
        let mut config = TriageConfig::with_paths(&PortablePathManager::new("/opt/symsafe"));
        config.llm.endpoint = "not a url".to_string();
        assert!(config.check().is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let settings = LlmSettings {
            api_key: Some("sk-secret".to_string()),
            ..LlmSettings::default()
        };
        let printed = format!("{:?}", settings);
        assert!(!printed.contains("sk-secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_system_prompt_falls_back_when_missing() {
        let temp_dir = TempDir::new().unwrap();
        let config = TriageConfig::with_paths(&PortablePathManager::new(temp_dir.path()));
        assert_eq!(config.load_system_prompt(), DEFAULT_SYSTEM_PROMPT);

        std::fs::create_dir_all(temp_dir.path().join("prompts")).unwrap();
        std::fs::write(config.system_prompt_path.clone(), "Be kind.\n").unwrap();
        assert_eq!(config.load_system_prompt(), "Be kind.");
    }
}
