//! LLM Assistant service.
//!
//! Replies are produced by an OpenAI-compatible `/chat/completions` endpoint
//! (OpenRouter by default). Callers decide what to do with failures; the chat
//! service replaces them with [`FALLBACK_REPLY`].

use crate::config::{AppConfig, CompletionSettings};
use crate::core::chat;
use async_trait::async_trait;
use di::{Ref, inject, injectable};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const SYSTEM_PROMPT: &str = "You are a helpful customer support assistant. Be friendly, professional, and helpful. Keep responses concise but informative.";

/// Reply stored in place of a completion whenever the provider fails.
pub const FALLBACK_REPLY: &str = "I apologize, but I'm having trouble connecting to my AI service right now. Please try again in a moment, or contact our support team directly.";

const CONNECTION_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// A prompt entry: role and content only, timestamps are stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

impl From<&chat::Message> for ChatMessage {
    fn from(m: &chat::Message) -> Self {
        Self {
            content: m.content.clone(),
            role: match m.role {
                chat::Role::User => Role::User,
                chat::Role::Assistant => Role::Assistant,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion API key not configured")]
    MissingApiKey,

    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("completion API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub service: &'static str,
    pub model: String,
    pub error: Option<String>,
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generates the assistant's next reply for an ordered conversation.
    ///
    /// The system instruction is added by the provider.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError>;

    /// Probes the provider, used for startup diagnostics only.
    async fn check_connection(&self) -> ConnectionStatus;
}

pub struct OpenRouterProvider {
    client: reqwest::Client,
    settings: CompletionSettings,
}

#[injectable(CompletionProvider)]
impl OpenRouterProvider {
    #[inject]
    pub fn create(config: Ref<AppConfig>) -> Self {
        Self::new(config.completion.clone())
    }
}

impl OpenRouterProvider {
    pub fn new(settings: CompletionSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }

    fn api_key(&self) -> Result<&str, CompletionError> {
        self.settings
            .api_key
            .as_deref()
            .ok_or(CompletionError::MissingApiKey)
    }

    fn request(&self, method: reqwest::Method, path: &str, api_key: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}/{path}", self.settings.base_url))
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.settings.referer)
            .header("X-Title", &self.settings.app_title)
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

#[async_trait]
impl CompletionProvider for OpenRouterProvider {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError> {
        let api_key = self.api_key()?;

        let wire_messages = std::iter::once(WireMessage {
            role: Role::System.as_str(),
            content: SYSTEM_PROMPT,
        })
        .chain(messages.iter().map(|m| WireMessage {
            role: m.role.as_str(),
            content: &m.content,
        }))
        .collect();

        let body = CompletionRequest {
            model: &self.settings.model,
            messages: wire_messages,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        debug!(
            "requesting completion from {} for {} messages",
            self.settings.model,
            messages.len()
        );

        let response = self
            .request(reqwest::Method::POST, "chat/completions", api_key)
            .timeout(self.settings.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::MalformedResponse("no message content".to_owned()))
    }

    async fn check_connection(&self) -> ConnectionStatus {
        let mut status = ConnectionStatus {
            connected: false,
            service: "OpenRouter AI",
            model: self.settings.model.clone(),
            error: None,
        };

        let api_key = match self.api_key() {
            Ok(key) => key,
            Err(e) => {
                status.error = Some(e.to_string());
                return status;
            }
        };

        let result = self
            .request(reqwest::Method::GET, "models", api_key)
            .timeout(CONNECTION_CHECK_TIMEOUT)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                let models = response
                    .json::<ModelList>()
                    .await
                    .map(|list| list.data.len())
                    .unwrap_or_default();
                info!("completion API reachable, {models} models available");
                status.connected = true;
            }
            Ok(response) => {
                status.error = Some(format!("models endpoint returned {}", response.status()));
            }
            Err(e) => status.error = Some(e.to_string()),
        }

        status
    }
}
