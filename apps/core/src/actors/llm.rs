use crate::actors::messages::{ActorError, AppError, LlmMessage};
use crate::actors::traits::LlmActor;
use crate::config::LlmSettings;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, error, info};
use url::Url;

/// A handle to the `LlmActor`.
///
/// This struct provides a public, cloneable interface for sending messages to the
/// running LLM actor. It abstracts away the `mpsc::Sender`.
#[derive(Clone)]
pub struct LlmActorHandle {
    sender: mpsc::Sender<LlmMessage>,
    reply_timeout: Duration,
}

impl LlmActorHandle {
    /// Creates a new `LlmActor` and returns a handle to it.
    ///
    /// This will spawn the `LlmActorRunner` in a new Tokio task, so it must be
    /// called from within a Tokio runtime.
    pub fn new(settings: LlmSettings) -> Self {
        let (sender, receiver) = mpsc::channel(32);
        let reply_timeout = settings.request_timeout() + HANDLE_GRACE;
        let actor = LlmActorRunner::new(receiver, settings);
        tokio::spawn(async move { actor.run().await });
        Self { sender, reply_timeout }
    }

    /// A convenience method for generating text with default parameters.
    pub async fn generate(&self, prompt: String) -> Result<String, AppError> {
        self.generate_with_params(prompt, None, None).await
    }
}

#[async_trait]
impl LlmActor for LlmActorHandle {
    /// Dropping the returned future abandons the request: the runner notices
    /// the closed reply channel and drops the HTTP call.
    async fn generate_with_params(
        &self,
        prompt: String,
        system_prompt: Option<String>,
        temperature: Option<f32>,
    ) -> Result<String, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = LlmMessage::GenerateWithParams {
            prompt,
            system_prompt,
            temperature,
            responder: send,
        };

        self.sender
            .send(msg)
            .await
            .map_err(|e| ActorError::Internal(e.to_string()))?;
        timeout(self.reply_timeout, recv)
            .await
            .map_err(ActorError::from)?
            .map_err(|e| ActorError::Internal(e.to_string()))?
    }
}

// --- Constants ---
const HANDLE_GRACE: Duration = Duration::from_secs(10);
const MAX_COMPLETION_TOKENS: u32 = 200;
const COMPLETIONS_PATH: &str = "chat/completions";

/// `{endpoint}/chat/completions`, keeping any path prefix such as `/v1`.
pub fn completions_url(endpoint: &str) -> Result<Url, AppError> {
    let base = Url::parse(&format!("{}/", endpoint.trim_end_matches('/')))?;
    Ok(base.join(COMPLETIONS_PATH)?)
}

// --- Wire types (OpenAI-compatible chat completions) ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

// --- Actor Runner (Internal Logic) ---
struct LlmActorRunner {
    receiver: mpsc::Receiver<LlmMessage>,
    backend: Arc<CompletionBackend>,
}

impl LlmActorRunner {
    fn new(receiver: mpsc::Receiver<LlmMessage>, settings: LlmSettings) -> Self {
        Self {
            receiver,
            backend: Arc::new(CompletionBackend::new(settings)),
        }
    }

    async fn run(mut self) {
        info!(model = %self.backend.settings.model, "LlmActor started");

        while let Some(msg) = self.receiver.recv().await {
            self.handle_message(msg);
        }

        info!("LlmActor stopped");
    }

    /// Each request runs in its own task so a slow or abandoned one never
    /// holds up the next message.
    fn handle_message(&self, msg: LlmMessage) {
        match msg {
            LlmMessage::GenerateWithParams {
                prompt,
                system_prompt,
                temperature,
                mut responder,
            } => {
                let backend = self.backend.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        result = backend.generate_completion(prompt, system_prompt, temperature) => {
                            if let Err(e) = &result {
                                error!("Completion failed: {}", e);
                            }
                            let _ = responder.send(result);
                        }
                        _ = responder.closed() => {
                            debug!("Requester gone, dropping completion request");
                        }
                    }
                });
            }
        }
    }
}

struct CompletionBackend {
    settings: LlmSettings,
    client: Client,
}

impl CompletionBackend {
    fn new(settings: LlmSettings) -> Self {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .unwrap_or_else(|e| {
                error!("Failed to build HTTP client with timeout: {}. Using defaults.", e);
                Client::new()
            });
        Self { settings, client }
    }

    fn build_request(&self, payload: &ChatRequest<'_>) -> Result<reqwest::RequestBuilder, AppError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.settings.api_key {
            let auth_value = format!("Bearer {}", key)
                .parse()
                .map_err(|_| AppError::Config("API key contains invalid header characters".to_string()))?;
            headers.insert(AUTHORIZATION, auth_value);
        }

        Ok(self
            .client
            .post(completions_url(&self.settings.endpoint)?)
            .headers(headers)
            .json(payload))
    }

    async fn generate_completion(
        &self,
        prompt: String,
        system_prompt: Option<String>,
        temperature: Option<f32>,
    ) -> Result<String, AppError> {
        debug!("LLM generating for prompt: {}", prompt);

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: prompt,
        });

        let payload = ChatRequest {
            model: &self.settings.model,
            messages,
            temperature: temperature.unwrap_or(self.settings.temperature),
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        let res = self.build_request(&payload)?.send().await?;

        let status = res.status();

        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AppError::Actor(ActorError::LlmError(format!(
                "Completion request failed with status {}: {}",
                status, body
            ))));
        }

        let parsed: ChatResponse = res
            .json()
            .await
            .map_err(|e| ActorError::LlmError(format!("Failed to parse response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| ActorError::LlmError("No choices in completion response".to_string()))?;

        Ok(content)
    }
}
