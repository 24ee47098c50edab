//! LLM client for diagnostic trouble code interpretation.
//!
//! Supports OpenAI-compatible chat completions and the Ollama chat API.

mod config;
mod prompts;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::pipeline::{EventSink, PipelineEvent};

pub use config::{LlmConfig, LlmProvider};

/// Stored in place of an interpretation when the remote call fails.
pub const FALLBACK_INTERPRETATION: &str = "Error interpreting DTC code";

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Failed to connect to LLM service
    #[error("Connection error: {0}")]
    Connection(String),
    /// Request did not finish in time
    #[error("Request timed out: {0}")]
    Timeout(String),
    /// Service refused the request because of quota or rate limits
    #[error("Rate limited: {0}")]
    RateLimited(String),
    /// API returned an error status
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },
    /// Failed to parse response
    #[error("Parse error: {0}")]
    Parse(String),
    /// No API key configured for a provider that needs one
    #[error("No API key configured for {0}")]
    MissingApiKey(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout(e.to_string())
        } else if e.is_decode() {
            LlmError::Parse(e.to_string())
        } else {
            LlmError::Connection(e.to_string())
        }
    }
}

/// One message of a chat prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A remote text-completion service.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send a chat prompt and return the completion text.
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String, LlmError>;
}

/// HTTP client for the configured provider.
pub struct LlmClient {
    config: LlmConfig,
    client: Client,
}

/// OpenAI chat completions request format.
#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

/// OpenAI chat completions response format.
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Ollama chat request format.
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// Ollama chat response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: ChatMessage,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    async fn call_openai(&self, model: &str, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| LlmError::MissingApiKey(self.config.provider.as_str().to_string()))?;

        let url = format!("{}/v1/chat/completions", self.config.endpoint());
        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&OpenAiRequest { model, messages })
            .send()
            .await?;

        let resp = check_status(resp).await?;
        let body: OpenAiResponse = resp.json().await?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LlmError::Parse("Response contained no completion".to_string()))
    }

    async fn call_ollama(&self, model: &str, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let url = format!("{}/api/chat", self.config.endpoint());
        let resp = self
            .client
            .post(&url)
            .json(&OllamaRequest {
                model,
                messages,
                stream: false,
            })
            .send()
            .await?;

        let resp = check_status(resp).await?;
        let body: OllamaResponse = resp.json().await?;

        if body.message.content.trim().is_empty() {
            return Err(LlmError::Parse("Empty completion".to_string()));
        }
        Ok(body.message.content)
    }
}

/// Map non-success statuses to errors.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(LlmError::RateLimited(body));
    }
    Err(LlmError::Api {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl CompletionBackend for LlmClient {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String, LlmError> {
        debug!(
            "Requesting completion from {} ({})",
            self.config.endpoint(),
            model
        );
        match self.config.provider {
            LlmProvider::OpenAI => self.call_openai(model, messages).await,
            LlmProvider::Ollama => self.call_ollama(model, messages).await,
        }
    }
}

/// Turns fault text into a plain-language explanation.
///
/// Never fails: remote errors are reported as events and replaced by
/// [`FALLBACK_INTERPRETATION`].
pub struct DtcInterpreter {
    backend: Box<dyn CompletionBackend>,
    model: String,
    system_prompt: String,
}

impl DtcInterpreter {
    /// Build an interpreter talking to the configured provider.
    pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
        let model = config.model.clone();
        let system_prompt = config.get_system_prompt().to_string();
        let client = LlmClient::new(config)?;
        Ok(Self::new(Box::new(client), model, system_prompt))
    }

    /// Build an interpreter over any completion backend.
    pub fn new(
        backend: Box<dyn CompletionBackend>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            model: model.into(),
            system_prompt: system_prompt.into(),
        }
    }

    /// The two-message prompt sent for a fault text.
    pub fn messages(&self, fault_text: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user(prompts::user_prompt(fault_text)),
        ]
    }

    /// Interpret the fault text, falling back to a fixed marker on any failure.
    pub async fn interpret(&self, vehicle: &str, fault_text: &str, events: &EventSink) -> String {
        events.emit(PipelineEvent::InterpretStarted {
            vehicle: vehicle.to_string(),
        });

        let messages = self.messages(fault_text);
        match self.backend.complete(&self.model, &messages).await {
            Ok(text) => {
                events.emit(PipelineEvent::InterpretCompleted {
                    vehicle: vehicle.to_string(),
                });
                text.trim().to_string()
            }
            Err(e) => {
                events.emit(PipelineEvent::InterpretFailed {
                    vehicle: vehicle.to_string(),
                    error: e.to_string(),
                });
                FALLBACK_INTERPRETATION.to_string()
            }
        }
    }
}
